// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Entity kinds synchronized from the FitNotes snapshot.
//!
//! Every kind is a closed enum variant carrying its static local query and the
//! kinds it references. Adding a kind means adding a variant here, a row shape
//! in [`crate::record::LocalRow`] and a mapping arm in [`crate::mapping`]; the
//! compiler points at every match that needs updating.

use serde::{Deserialize, Serialize};

/// One synchronized category of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Body weight measurements (scalar time series)
    Bodyweight,
    /// Exercise catalogue (reference kind)
    Exercise,
    /// Training log entries, each pointing at an exercise
    Workout,
}

impl EntityKind {
    /// All kinds in dependency order: referenced kinds come first.
    pub const ALL: [EntityKind; 3] = [Self::Bodyweight, Self::Exercise, Self::Workout];

    /// Stable lowercase name used in logs, metrics and configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bodyweight => "bodyweight",
            Self::Exercise => "exercise",
            Self::Workout => "workout",
        }
    }

    /// Static read query against the snapshot.
    ///
    /// The origin identifier is always the first column. Numeric columns are
    /// cast so SQLite hands back a single storage class per column.
    #[must_use]
    pub fn query(self) -> &'static str {
        match self {
            Self::Bodyweight => {
                "SELECT _id, date, CAST(value AS REAL) AS value \
                 FROM MeasurementRecord WHERE measurement_id = 1 ORDER BY date DESC"
            }
            Self::Exercise => "SELECT _id, name FROM exercise ORDER BY name ASC",
            Self::Workout => {
                "SELECT _id, date, exercise_id, CAST(metric_weight AS REAL) AS metric_weight, \
                 CAST(reps AS INTEGER) AS reps FROM training_log ORDER BY date DESC"
            }
        }
    }

    /// Kinds whose remote records this kind links to.
    #[must_use]
    pub fn references(self) -> &'static [EntityKind] {
        match self {
            Self::Bodyweight | Self::Exercise => &[],
            Self::Workout => &[Self::Exercise],
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown entity kind '{}'", s))
    }
}

/// Sort a requested set of kinds so every kind follows the kinds it references.
///
/// Duplicates are dropped. Referenced kinds that were not requested are not
/// added: their remote records are still read for cross-referencing, they just
/// don't get synced in this run.
#[must_use]
pub fn dependency_order(kinds: &[EntityKind]) -> Vec<EntityKind> {
    EntityKind::ALL
        .into_iter()
        .filter(|kind| kinds.contains(kind))
        .collect()
}
