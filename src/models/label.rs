//! Label slot definitions.
//!
//! Every key shows one label list per slot. A slot describes where its label
//! sits on the key face (`position`) and which tables feed it.

use crate::models::table::TableRef;
use serde::{Deserialize, Serialize};

/// Case transform applied to derived labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelCase {
    /// Unicode upper case
    Upper,
    /// Unicode lower case
    Lower,
}

impl LabelCase {
    /// Applies the transform.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Upper => text.to_uppercase(),
            Self::Lower => text.to_lowercase(),
        }
    }
}

/// Flow direction of a multi-value label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelDirection {
    /// Values side by side
    #[default]
    Row,
    /// Values stacked
    Column,
}

/// A `labelTable` binding: one reference or several merged in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelTableRef {
    /// Single table
    One(TableRef),
    /// Tables merged with earlier ones masking later ones
    Many(Vec<TableRef>),
}

impl LabelTableRef {
    /// The references in declaration order.
    #[must_use]
    pub fn refs(&self) -> &[TableRef] {
        match self {
            Self::One(r) => std::slice::from_ref(r),
            Self::Many(refs) => refs,
        }
    }
}

/// Declarative label slot as found in layout data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLabelSlot {
    /// Explicit position on the key face
    #[serde(default)]
    pub position: Option<usize>,
    /// Free-form slot type ("letter", "phonetic-alphabet", ...)
    #[serde(default, rename = "type")]
    pub slot_type: Option<String>,
    /// Table providing this slot's values/codes
    #[serde(default)]
    pub value_table: Option<TableRef>,
    /// Table(s) providing display labels
    #[serde(default)]
    pub label_table: Option<LabelTableRef>,
    /// Table used to resolve a key's code for this slot
    #[serde(default)]
    pub code_table: Option<TableRef>,
    /// Case transform
    #[serde(default)]
    pub case: Option<LabelCase>,
    /// Relative font size
    #[serde(default)]
    pub size: Option<f32>,
    /// Flow direction
    #[serde(default)]
    pub direction: Option<LabelDirection>,
    /// Marks the main slot
    #[serde(default)]
    pub is_main: Option<bool>,
}

/// A normalized label slot with its position assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSlot {
    /// Position on the key face
    pub position: usize,
    /// Free-form slot type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub slot_type: Option<String>,
    /// `valueTable` reference
    pub value_table: Option<TableRef>,
    /// `labelTable` reference(s)
    pub label_table: Option<LabelTableRef>,
    /// `codeTable` reference
    pub code_table: Option<TableRef>,
    /// Case transform
    pub case: Option<LabelCase>,
    /// Relative font size
    pub size: Option<f32>,
    /// Flow direction
    pub direction: LabelDirection,
    /// True for exactly one slot per layout
    pub is_main: bool,
    /// True if `isMain` was set in the source data
    #[serde(skip)]
    explicit_main: bool,
}

impl LabelSlot {
    /// Builds a slot from raw data at an already assigned position.
    fn from_raw(raw: RawLabelSlot, position: usize) -> Self {
        Self {
            position,
            slot_type: raw.slot_type,
            value_table: raw.value_table,
            label_table: raw.label_table,
            code_table: raw.code_table,
            case: raw.case,
            size: raw.size,
            direction: raw.direction.unwrap_or_default(),
            is_main: false,
            explicit_main: raw.is_main.unwrap_or(false),
        }
    }

    /// Converts back to declarative form, keeping the assigned position.
    #[must_use]
    pub fn to_raw(&self) -> RawLabelSlot {
        RawLabelSlot {
            position: Some(self.position),
            slot_type: self.slot_type.clone(),
            value_table: self.value_table.clone(),
            label_table: self.label_table.clone(),
            code_table: self.code_table.clone(),
            case: self.case,
            size: self.size,
            direction: Some(self.direction),
            is_main: self.explicit_main.then_some(true),
        }
    }

    /// Applies the slot's case transform, if any.
    #[must_use]
    pub fn transform(&self, text: &str) -> String {
        self.case.map_or_else(|| text.to_string(), |case| case.apply(text))
    }
}

/// Normalizes raw slots: assigns positions and elects the main slot.
///
/// Slots keep explicit positions. The others take, in declaration order, the
/// lowest index not claimed explicitly by any slot nor already handed out.
/// The main slot is the first marked `isMain`, else the first with a
/// `valueTable`, else the first slot.
#[must_use]
pub fn assign_positions(raw: Vec<RawLabelSlot>) -> Vec<LabelSlot> {
    let mut taken: Vec<usize> = raw.iter().filter_map(|s| s.position).collect();
    let mut next = 0;

    let mut slots: Vec<LabelSlot> = raw
        .into_iter()
        .map(|slot| {
            let position = if let Some(p) = slot.position {
                p
            } else {
                while taken.contains(&next) {
                    next += 1;
                }
                taken.push(next);
                next
            };
            LabelSlot::from_raw(slot, position)
        })
        .collect();

    let main = slots
        .iter()
        .position(|s| s.explicit_main)
        .or_else(|| slots.iter().position(|s| s.value_table.is_some()))
        .or((!slots.is_empty()).then_some(0));

    if let Some(main) = main {
        slots[main].is_main = true;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(position: Option<usize>) -> RawLabelSlot {
        RawLabelSlot {
            position,
            ..RawLabelSlot::default()
        }
    }

    #[test]
    fn test_lowest_free_position() {
        let slots = assign_positions(vec![slot(Some(2)), slot(Some(0)), slot(None)]);
        let positions: Vec<usize> = slots.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![2, 0, 1]);
    }

    #[test]
    fn test_positions_skip_later_explicit() {
        let slots = assign_positions(vec![slot(None), slot(None), slot(Some(1)), slot(None)]);
        let positions: Vec<usize> = slots.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_main_defaults_to_first_slot() {
        let slots = assign_positions(vec![slot(None), slot(None)]);
        assert!(slots[0].is_main);
        assert!(!slots[1].is_main);
    }

    #[test]
    fn test_main_prefers_value_table() {
        let with_table = RawLabelSlot {
            value_table: Some(TableRef::from("morse-code/itu")),
            ..RawLabelSlot::default()
        };
        let slots = assign_positions(vec![slot(None), with_table]);
        assert!(!slots[0].is_main);
        assert!(slots[1].is_main);
    }

    #[test]
    fn test_main_explicit_first_wins() {
        let marked = RawLabelSlot {
            is_main: Some(true),
            ..RawLabelSlot::default()
        };
        let with_table = RawLabelSlot {
            value_table: Some(TableRef::from("morse-code/itu")),
            ..RawLabelSlot::default()
        };
        let slots = assign_positions(vec![with_table, marked.clone(), marked]);
        let mains: Vec<bool> = slots.iter().map(|s| s.is_main).collect();
        assert_eq!(mains, vec![false, true, false]);
    }

    #[test]
    fn test_no_slots() {
        assert!(assign_positions(Vec::new()).is_empty());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let raw: RawLabelSlot = serde_json::from_str(
            r#"{"labelTable":["characters/uk","characters/numbers"],"position":2,
                "size":0.8,"case":"upper","valueTable":"morse-code/uk-legal","direction":"column"}"#,
        )
        .unwrap();
        assert_eq!(raw.position, Some(2));
        assert_eq!(raw.case, Some(LabelCase::Upper));
        assert_eq!(raw.direction, Some(LabelDirection::Column));
        assert_eq!(raw.label_table.unwrap().refs().len(), 2);
    }

    #[test]
    fn test_case_transform_unicode() {
        assert_eq!(LabelCase::Upper.apply("ґ"), "Ґ");
        assert_eq!(LabelCase::Lower.apply("ALPHA"), "alpha");
    }
}
