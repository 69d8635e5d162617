/// Field definitions and ordered layer schema
///
/// A schema maps field names to definitions in column order. Indices are
/// assigned on insertion so they always form the dense range `0..len`.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{JoinError, JoinResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    IntegerList,
    Real,
    RealList,
    String,
    StringList,
    Date,
    Time,
    DateTime,
    Boolean,
    Binary,
}

/// Definition of one field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Display width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Decimal precision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    /// Position in the schema (0-based)
    #[serde(default)]
    pub index: usize,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            width: None,
            precision: None,
            index: 0,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }
}

/// Ordered field definitions of a layer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, FieldDefinition>", into = "IndexMap<String, FieldDefinition>")]
pub struct Schema {
    fields: IndexMap<String, FieldDefinition>,
}

// Mapping order is column order; stored indices are reassigned from it.
impl From<IndexMap<String, FieldDefinition>> for Schema {
    fn from(mut fields: IndexMap<String, FieldDefinition>) -> Self {
        for (position, definition) in fields.values_mut().enumerate() {
            definition.index = position;
        }
        Self { fields }
    }
}

impl From<Schema> for IndexMap<String, FieldDefinition> {
    fn from(schema: Schema) -> Self {
        schema.fields
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field at the next index
    ///
    /// The definition's `index` is overwritten. Fails with `FieldExists` if
    /// the name is taken.
    pub fn push(&mut self, name: impl Into<String>, mut definition: FieldDefinition) -> JoinResult<()> {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return Err(JoinError::field_exists(name));
        }
        definition.index = self.fields.len();
        self.fields.insert(name, definition);
        Ok(())
    }

    /// Builder form of [`Schema::push`]
    pub fn with_field(mut self, name: impl Into<String>, definition: FieldDefinition) -> JoinResult<Self> {
        self.push(name, definition)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fail with `FieldMissing` unless `name` is defined
    pub fn require(&self, name: &str) -> JoinResult<&FieldDefinition> {
        self.fields
            .get(name)
            .ok_or_else(|| JoinError::field_missing(name))
    }

    /// Field names in column order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
