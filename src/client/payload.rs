//! Wire payload for `POST /import`.
//!
//! The body is a JSON array of objects, ideally `{"personId": <integer>}`.
//! Malformed shapes (`[]`, `[{}]`, `[{"personId": "x"}]`) are representable
//! on purpose so the service's rejection of them can be exercised.

use serde::Serialize;
use serde_json::Value;

/// Identifier carried by one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PersonIdValue {
    Int(i64),
    /// Anything that is not an integer, sent verbatim
    Malformed(Value),
}

/// One entity in the import payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescriptor {
    #[serde(rename = "personId", skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonIdValue>,
}

impl EntityDescriptor {
    pub fn id(person_id: i64) -> Self {
        Self { person_id: Some(PersonIdValue::Int(person_id)) }
    }

    pub fn missing() -> Self {
        Self { person_id: None }
    }

    pub fn malformed(value: impl Into<Value>) -> Self {
        Self { person_id: Some(PersonIdValue::Malformed(value.into())) }
    }
}

/// Ordered sequence of entities, serialized as a JSON array
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ImportRequest {
    entities: Vec<EntityDescriptor>,
}

impl ImportRequest {
    /// `[]`
    pub fn empty() -> Self {
        Self::default()
    }

    /// `[{"personId": id}]`
    pub fn single(person_id: i64) -> Self {
        Self { entities: vec![EntityDescriptor::id(person_id)] }
    }

    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Self { entities: ids.into_iter().map(EntityDescriptor::id).collect() }
    }

    pub fn push(mut self, person_id: i64) -> Self {
        self.entities.push(EntityDescriptor::id(person_id));
        self
    }

    /// Append `{}`
    pub fn push_missing(mut self) -> Self {
        self.entities.push(EntityDescriptor::missing());
        self
    }

    /// Append `{"personId": value}` with a non-integer value
    pub fn push_malformed(mut self, value: impl Into<Value>) -> Self {
        self.entities.push(EntityDescriptor::malformed(value));
        self
    }

    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    /// Integer identifiers in payload order; malformed and missing are skipped
    pub fn ids(&self) -> Vec<i64> {
        self.entities
            .iter()
            .filter_map(|e| match e.person_id {
                Some(PersonIdValue::Int(id)) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
