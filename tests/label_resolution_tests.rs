//! Integration tests for layout normalization, label resolution and
//! auto-placement.

mod fixtures;
use fixtures::*;

use okeyboard::error::kind_of;
use okeyboard::models::{Layout, RawLayout, RawTable, TableStore};
use okeyboard::services::resolve_layout;

fn labels_of(layout: &str) -> Vec<(String, Vec<Vec<String>>)> {
    let layout = Layout::from_json(layout).unwrap();
    resolve_layout(&layout)
        .unwrap()
        .keys
        .into_iter()
        .map(|k| (k.id(), k.labels))
        .collect()
}

#[test]
fn test_letter_layout_end_to_end() {
    let labels = labels_of(LETTER_LAYOUT);
    assert_eq!(
        labels,
        vec![
            ("a".to_string(), vec![vec!["A".to_string()]]),
            ("b".to_string(), vec![Vec::<String>::new()]),
        ]
    );
}

#[test]
fn test_morse_cross_reference() {
    let layout = Layout::from_json(MORSE_LAYOUT).unwrap();
    let resolved = resolve_layout(&layout).unwrap();

    let a = resolved.key("a").unwrap();
    assert_eq!(a.code.as_deref(), Some(".-"));
    assert_eq!(a.labels[0], vec![".-"]);
    assert_eq!(a.labels[1], vec![".-.."]);
    assert_eq!(a.labels[2], vec!["A"]);

    // Same value as the code table: suppressed.
    let e = resolved.key("e").unwrap();
    assert_eq!(e.labels[0], vec!["."]);
    assert!(e.labels[1].is_empty());

    // No row in the variant table.
    let t = resolved.key("t").unwrap();
    assert!(t.labels[1].is_empty());
    assert_eq!(t.labels[2], vec!["T"]);
}

#[test]
fn test_resolution_is_idempotent() {
    let layout = Layout::from_json(MORSE_LAYOUT).unwrap();
    let first = resolve_layout(&layout).unwrap();
    let second = resolve_layout(&layout).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_shared_tables_fill_in_missing_references() {
    let mut layout = Layout::from_json(
        r#"{"name":"shared","labels":[{"labelTable":"letter/en","case":"upper"}],"keys":["a"]}"#,
    )
    .unwrap();
    assert!(resolve_layout(&layout).is_err());

    let shared = TableStore::from_raw(vec![RawTable::new("letter", "en", ["a"])]).unwrap();
    assert_eq!(layout.add_shared_tables(shared.iter()), 1);
    let resolved = resolve_layout(&layout).unwrap();
    assert_eq!(resolved.keys[0].labels, vec![vec!["A".to_string()]]);
}

#[test]
fn test_unknown_table_is_configuration_error() {
    let layout = Layout::from_json(
        r#"{"name":"broken","labels":[{"valueTable":"morse/itu"},{"labelTable":["letter/en","letter/fr"]}],
            "keys":["a"],"tables":[{"type":"morse","name":"itu","rows":["a"]},
                                   {"type":"letter","name":"en","rows":["a"]}]}"#,
    )
    .unwrap();
    let err = resolve_layout(&layout).unwrap_err();
    let kind = kind_of(&err).unwrap();
    assert!(kind.is_configuration());
    assert_eq!(
        kind.to_string(),
        "[Label 1] Configuration Error: labelTable[1] 'letter/fr' not found"
    );
}

#[test]
fn test_explicit_labels_are_untouched() {
    let labels = labels_of(
        r#"{"name":"x","labels":[{"labelTable":"letter/en","case":"upper"},{"labelTable":"letter/en"}],
            "keys":[{"key":"a","labels":["shift", ""]}],
            "tables":[{"type":"letter","name":"en","rows":["a"]}]}"#,
    );
    assert_eq!(labels[0].1, vec![vec!["shift".to_string()], vec![String::new()]]);
}

#[test]
fn test_label_positions_fill_lowest_free_index() {
    let layout = Layout::from_json(
        r#"{"name":"slots","labels":[{"position":2},{"position":0},{}]}"#,
    )
    .unwrap();
    let positions: Vec<usize> = layout.labels.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![2, 0, 1]);
}

#[test]
fn test_max_row_keys_wraps_rows() {
    let layout = Layout::from_json(
        r#"{"name":"wrap","maxRowKeys":2,"keys":["a","b","c","d","e"]}"#,
    )
    .unwrap();
    let resolved = resolve_layout(&layout).unwrap();
    assert_eq!(resolved.grid.row_sizes(), vec![2, 2, 1]);
    let rows: Vec<usize> = resolved.keys.iter().map(|k| k.row).collect();
    assert_eq!(rows, vec![0, 0, 1, 1, 2]);
    assert!((resolved.key_width() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_row_arrays_tag_rows() {
    let layout = Layout::from_json(r#"{"name":"rows","keys":[["q","w"],["a"],"z"]}"#).unwrap();
    let rows: Vec<Option<usize>> = layout.keys.iter().map(|k| k.row).collect();
    assert_eq!(rows, vec![Some(0), Some(0), Some(1), Some(2)]);
}

#[test]
fn test_layout_update_merges_fields() {
    let mut layout = Layout::from_json(MORSE_LAYOUT).unwrap();
    let mut update = RawLayout::named("morse");
    update.title = Some("Morse (ITU)".to_string());
    update.max_row_keys = Some(1);
    layout.apply(update).unwrap();

    assert_eq!(layout.title.as_deref(), Some("Morse (ITU)"));
    assert_eq!(layout.keys.len(), 3);
    assert_eq!(layout.labels.len(), 3);
    assert_eq!(layout.tables.len(), 3);
}

#[test]
fn test_missing_layout_name_is_validation_error() {
    let err = Layout::from_json(r#"{"keys":["a"]}"#).unwrap_err();
    assert!(kind_of(&err).is_some_and(|k| k.is_validation()));
}
