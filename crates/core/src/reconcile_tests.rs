// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::action::{SnippetField, SnippetPatch};
use crate::snippet::{DynamicResource, ResourceKind, TemplateEngine};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use yare::parameterized;

fn snippet(id: &str) -> Snippet {
    Snippet::new(id, format!("https://example.com/{id}"))
}

fn ids(list: &[Snippet]) -> Vec<&str> {
    list.iter().map(|s| s.id.as_str()).collect()
}

fn target_patch(target: &str) -> SnippetPatch {
    SnippetPatch {
        target: Some(target.into()),
        ..Default::default()
    }
}

#[test]
fn created_appends_at_end() {
    let list = vec![snippet("a"), snippet("b")];
    let next = apply(&list, &UpdateAction::created(&snippet("c"))).unwrap();
    assert_eq!(ids(&next), vec!["a", "b", "c"]);
}

#[test]
fn created_for_known_id_updates_in_place() {
    let list = vec![snippet("a"), snippet("b")];
    let mut replacement = snippet("a");
    replacement.target = "https://example.com/a2".into();

    let next = apply(&list, &UpdateAction::created(&replacement)).unwrap();

    assert_eq!(ids(&next), vec!["a", "b"]);
    assert_eq!(next[0].target, "https://example.com/a2");
    assert_eq!(next[0].load_iteration, 1);
}

#[test]
fn created_twice_never_duplicates() {
    let action = UpdateAction::created(&snippet("a"));
    let once = apply(&[], &action).unwrap();
    assert!(apply(&once, &action).is_none());
}

#[test]
fn created_without_target_is_dropped() {
    let action = UpdateAction::new(ActionKind::Created, "a", SnippetPatch::default());
    assert!(apply(&[snippet("b")], &action).is_none());
}

#[test]
fn updated_unknown_id_is_noop() {
    let list = vec![snippet("a")];
    assert!(apply(&list, &UpdateAction::updated("zzz", target_patch("x"))).is_none());
}

#[test]
fn deleted_removes_entry() {
    let list = vec![snippet("a"), snippet("b"), snippet("c")];
    let next = apply(&list, &UpdateAction::deleted("b")).unwrap();
    assert_eq!(ids(&next), vec!["a", "c"]);
}

#[test]
fn deleted_twice_changes_state_once() {
    let list = vec![snippet("a"), snippet("b")];
    let delete = UpdateAction::deleted("a");

    let (next, applied) = apply_all(&list, [&delete, &delete]);

    assert_eq!(applied, 1);
    assert_eq!(ids(&next), vec!["b"]);
}

#[test]
fn update_after_delete_is_dropped() {
    let list = vec![snippet("a")];
    let delete = UpdateAction::deleted("a");
    let update = UpdateAction::updated("a", target_patch("https://example.com/late"));

    let (next, applied) = apply_all(&list, [&delete, &update]);

    assert_eq!(applied, 1);
    assert!(next.is_empty());
}

fn patch_for(field: SnippetField) -> SnippetPatch {
    let mut patch = SnippetPatch::default();
    match field {
        SnippetField::Target => patch.target = Some("https://example.com/other".into()),
        SnippetField::Headers => {
            patch.headers = Some(BTreeMap::from([("x-token".into(), "1".into())]))
        }
        SnippetField::Props => {
            patch.props = Some(Props::from([("color".into(), json!("blue"))]))
        }
        SnippetField::DynamicResources => {
            patch.dynamic_resources = Some(vec![DynamicResource::new(
                "https://example.com/x.css",
                ResourceKind::Stylesheet,
            )])
        }
        SnippetField::Engine => patch.engine = Some(TemplateEngine::Handlebars),
        SnippetField::VisibleFrom => {
            patch.visible_from = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
        }
        SnippetField::VisibleUntil => {
            patch.visible_until = Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap())
        }
    }
    patch
}

#[parameterized(
    target = { SnippetField::Target, 1 },
    headers = { SnippetField::Headers, 1 },
    engine = { SnippetField::Engine, 1 },
    props = { SnippetField::Props, 0 },
    dynamic_resources = { SnippetField::DynamicResources, 0 },
    visible_from = { SnippetField::VisibleFrom, 0 },
    visible_until = { SnippetField::VisibleUntil, 0 },
)]
fn load_iteration_per_field(field: SnippetField, expected: u64) {
    let list = vec![snippet("a")];
    let next = apply(&list, &UpdateAction::updated("a", patch_for(field))).unwrap();
    assert_eq!(next[0].load_iteration, expected);
}

#[test]
fn load_iteration_bumps_once_for_multiple_significant_fields() {
    let list = vec![snippet("a")];
    let patch = SnippetPatch {
        target: Some("https://example.com/new".into()),
        engine: Some(TemplateEngine::Mustache),
        ..Default::default()
    };
    let next = apply(&list, &UpdateAction::updated("a", patch)).unwrap();
    assert_eq!(next[0].load_iteration, 1);
}

#[test]
fn update_to_current_values_is_noop() {
    let list = vec![snippet("a")];
    let action = UpdateAction::updated("a", target_patch("https://example.com/a"));
    assert!(apply(&list, &action).is_none());
}

#[test]
fn overlay_local_wins() {
    let list = vec![snippet("a")
        .with_prop("color", json!("red"))
        .with_prop("size", json!(10))];
    let local = HashMap::from([(
        "a".to_string(),
        Props::from([("color".into(), json!("green"))]),
    )]);

    let merged = overlay(&list, &local);

    assert_eq!(merged[0].props["color"], json!("green"));
    assert_eq!(merged[0].props["size"], json!(10));
    assert_eq!(list[0].props["color"], json!("red"));
}

#[test]
fn overlay_ignores_unknown_ids() {
    let list = vec![snippet("a")];
    let local = HashMap::from([("zzz".to_string(), Props::from([("k".into(), json!(1))]))]);
    assert_eq!(overlay(&list, &local), list);
}

// ── Properties ──────────────────────────────────────────────────

fn arb_list() -> impl Strategy<Value = Vec<Snippet>> {
    prop::collection::btree_set("[a-z]{1,4}", 0..8).prop_map(|ids| {
        ids.into_iter()
            .enumerate()
            .map(|(i, id)| snippet(&id).with_prop("rank", json!(i)))
            .collect()
    })
}

fn arb_action() -> impl Strategy<Value = UpdateAction> {
    let kind = prop_oneof![
        Just(ActionKind::Created),
        Just(ActionKind::Updated),
        Just(ActionKind::Deleted)
    ];
    let field = prop::sample::select(SnippetField::ALL.to_vec());
    (kind, "[a-z]{1,4}", field).prop_map(|(kind, id, field)| {
        let mut patch = patch_for(field);
        if kind == ActionKind::Created {
            patch.target = Some(format!("https://example.com/{id}/new"));
        }
        UpdateAction::new(kind, id, patch)
    })
}

proptest! {
    #[test]
    fn update_changes_only_the_patched_field(
        list in arb_list(),
        pick in any::<prop::sample::Index>(),
        field in prop::sample::select(SnippetField::ALL.to_vec()),
    ) {
        prop_assume!(!list.is_empty());
        let index = pick.index(list.len());
        let id = list[index].id.clone();

        let next = apply(&list, &UpdateAction::updated(id, patch_for(field)))
            .unwrap_or_else(|| list.clone());

        prop_assert_eq!(next.len(), list.len());
        for (i, (before, after)) in list.iter().zip(&next).enumerate() {
            if i != index {
                prop_assert_eq!(before, after);
                continue;
            }
            let mut expected = before.clone();
            let (patched, _) = patch_for(field).apply_to(before);
            expected.target = patched.target;
            expected.headers = patched.headers;
            expected.props = patched.props;
            expected.dynamic_resources = patched.dynamic_resources;
            expected.engine = patched.engine;
            expected.visible_from = patched.visible_from;
            expected.visible_until = patched.visible_until;
            expected.load_iteration = after.load_iteration;
            prop_assert_eq!(&expected, after);
        }
    }

    #[test]
    fn untouched_entries_keep_relative_order(
        list in arb_list(),
        actions in prop::collection::vec(arb_action(), 0..16),
    ) {
        let (next, _) = apply_all(&list, &actions);
        let touched: std::collections::HashSet<&str> =
            actions.iter().map(|a| a.id.as_str()).collect();

        let before: Vec<&str> = ids(&list).into_iter().filter(|id| !touched.contains(id)).collect();
        let after: Vec<&str> = ids(&next).into_iter().filter(|id| !touched.contains(id)).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn ids_stay_unique(
        list in arb_list(),
        actions in prop::collection::vec(arb_action(), 0..16),
    ) {
        let (next, _) = apply_all(&list, &actions);
        let unique: std::collections::HashSet<&str> = ids(&next).into_iter().collect();
        prop_assert_eq!(unique.len(), next.len());
    }

    #[test]
    fn repeated_delete_is_idempotent(list in arb_list(), id in "[a-z]{1,4}") {
        let delete = UpdateAction::deleted(id);
        let once = apply(&list, &delete).unwrap_or_else(|| list.clone());
        prop_assert!(apply(&once, &delete).is_none());
    }

    #[test]
    fn overlay_precedence(
        remote in prop::collection::btree_map("[a-c]", any::<i32>(), 0..3),
        local in prop::collection::btree_map("[a-c]", any::<i32>(), 0..3),
    ) {
        let mut base = snippet("s");
        base.props = remote.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let overrides: Props = local.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let merged = overlay(&[base], &HashMap::from([("s".to_string(), overrides)]));

        for (k, v) in &local {
            prop_assert_eq!(&merged[0].props[k], &json!(v));
        }
        for (k, v) in remote.iter().filter(|(k, _)| !local.contains_key(*k)) {
            prop_assert_eq!(&merged[0].props[k], &json!(v));
        }
    }
}
