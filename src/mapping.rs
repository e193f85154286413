// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field mapping from local rows to remote property sets.
//!
//! Mapping is pure: the only context is the [`CrossReferenceIndex`] for the
//! kinds a row links to. A reference that cannot be resolved is an error, never
//! a relation silently left out.

use thiserror::Error;

use crate::entity::EntityKind;
use crate::index::CrossReferenceIndex;
use crate::record::{LocalRow, PropertySet, PropertyValue, DEDUP_PROPERTY};

/// Fixed kilogram to pound factor applied to every workout weight.
pub const KG_TO_LBS: f64 = 2.2046226218;

pub const DATE_PROPERTY: &str = "Date";
pub const VALUE_PROPERTY: &str = "Value";
pub const NAME_PROPERTY: &str = "Name";
pub const EXERCISE_PROPERTY: &str = "Exercise";
pub const WEIGHT_PROPERTY: &str = "Weight";
pub const REPS_PROPERTY: &str = "Reps";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("{kind} row {origin_id} references {reference_kind} {reference_id}, which has no remote record")]
    UnresolvedReference {
        kind: EntityKind,
        origin_id: i64,
        reference_kind: EntityKind,
        reference_id: i64,
    },
    #[error("{kind} row {origin_id} has a non-finite value for '{property}'")]
    NonFinite {
        kind: EntityKind,
        origin_id: i64,
        property: &'static str,
    },
}

/// Round to one decimal place.
///
/// Rounds the exact binary value, so ties only occur for values that are
/// exactly representable (`0.25`, `0.75`) and those go to even. `0.35` is
/// stored just below the midpoint and rounds down.
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Convert a kilogram weight to pounds, rounded for display.
#[must_use]
pub fn kg_to_lbs(weight_kg: f64) -> f64 {
    round_one_decimal(weight_kg * KG_TO_LBS)
}

/// Build the remote property set for one local row.
///
/// `xref` must hold every reference id the row may point at; for kinds without
/// references it is ignored.
pub fn map_row(row: &LocalRow, xref: &CrossReferenceIndex) -> Result<PropertySet, MappingError> {
    let kind = row.kind();
    let origin_id = row.origin_id();
    let decimal = |property: &'static str, value: f64| {
        PropertyValue::decimal(value).ok_or(MappingError::NonFinite {
            kind,
            origin_id,
            property,
        })
    };

    let props = PropertySet::new().with(DEDUP_PROPERTY, PropertyValue::integer(origin_id));

    let props = match row {
        LocalRow::Bodyweight { date, value, .. } => props
            .with(DATE_PROPERTY, PropertyValue::Date(date.clone()))
            .with(VALUE_PROPERTY, decimal(VALUE_PROPERTY, *value)?),

        LocalRow::Exercise { name, .. } => props.with(NAME_PROPERTY, PropertyValue::Title(name.clone())),

        LocalRow::Workout {
            date,
            exercise_id,
            weight_kg,
            reps,
            ..
        } => {
            let exercise = xref
                .resolve(*exercise_id)
                .ok_or(MappingError::UnresolvedReference {
                    kind,
                    origin_id,
                    reference_kind: EntityKind::Exercise,
                    reference_id: *exercise_id,
                })?;

            props
                .with(DATE_PROPERTY, PropertyValue::Date(date.clone()))
                .with(EXERCISE_PROPERTY, PropertyValue::Relation(vec![exercise.to_string()]))
                .with(WEIGHT_PROPERTY, decimal(WEIGHT_PROPERTY, kg_to_lbs(*weight_kg))?)
                .with(REPS_PROPERTY, PropertyValue::integer(*reps))
        }
    };

    Ok(props)
}
