// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record types flowing through the sync engine.
//!
//! - [`LocalRow`]: one decoded row of the FitNotes snapshot
//! - [`RemoteRecord`]: one document as returned by the remote store
//! - [`PropertySet`]: what the mapper produces and the remote store creates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::entity::EntityKind;

/// Name of the numeric property holding the origin identifier.
pub const DEDUP_PROPERTY: &str = "sql_id";

/// One row read from the local snapshot, shaped by its entity kind.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalRow {
    Bodyweight {
        id: i64,
        date: String,
        value: f64,
    },
    Exercise {
        id: i64,
        name: String,
    },
    Workout {
        id: i64,
        date: String,
        exercise_id: i64,
        /// Logged weight in kilograms
        weight_kg: f64,
        reps: i64,
    },
}

impl LocalRow {
    /// Local primary key, used verbatim as the dedup key.
    #[must_use]
    pub fn origin_id(&self) -> i64 {
        match self {
            Self::Bodyweight { id, .. } | Self::Exercise { id, .. } | Self::Workout { id, .. } => *id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Bodyweight { .. } => EntityKind::Bodyweight,
            Self::Exercise { .. } => EntityKind::Exercise,
            Self::Workout { .. } => EntityKind::Workout,
        }
    }
}

/// A document in the remote store.
///
/// Properties are kept raw: the remote store returns property shapes this
/// crate never writes, and only the dedup property is ever read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// System-assigned remote identifier
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl RemoteRecord {
    pub fn new(id: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            properties,
        }
    }

    /// Origin identifier stored in the dedup property.
    ///
    /// Exact-type equality: only a JSON integer counts. A string `"3"` or a
    /// float `3.5` yields `None` and the record is treated as untracked.
    #[must_use]
    pub fn origin_id(&self) -> Option<i64> {
        self.properties
            .get(DEDUP_PROPERTY)?
            .get("number")?
            .as_i64()
    }
}

/// The four property shapes the mapper emits.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(serde_json::Number),
    /// ISO-8601 start date
    Date(String),
    /// Plain-text title
    Title(String),
    /// Remote ids of linked records
    Relation(Vec<String>),
}

impl PropertyValue {
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::Number(value.into())
    }

    /// `None` for NaN and infinities, which have no JSON representation.
    #[must_use]
    pub fn decimal(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self::Number)
    }

    /// Wire shape understood by the remote store.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(n) => json!({ "number": n }),
            Self::Date(start) => json!({ "date": { "start": start } }),
            Self::Title(content) => json!({ "title": [{ "text": { "content": content } }] }),
            Self::Relation(ids) => json!({
                "type": "relation",
                "relation": ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>(),
            }),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Property name to value, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertySet(BTreeMap<String, PropertyValue>);

impl PropertySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: &str, value: PropertyValue) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    /// Raw property map, as a remote record would carry it.
    #[must_use]
    pub fn to_properties(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), value.to_value()))
            .collect()
    }
}
