/// In-memory geo layer model
///
/// A layer is a named schema plus an ordered collection of features. Each
/// feature has a sparse attribute map and an optional geometry.
pub mod geometry;
pub mod schema;
pub mod value;

pub use geometry::{Extent, Geometry, GeometryDescriptor};
pub use schema::{FieldDefinition, FieldType, Schema};
pub use value::Value;

use indexmap::IndexMap;

/// Identifier of a feature within its layer
pub type FeatureId = u64;

/// Sparse attribute map, in insertion order
pub type Attributes = IndexMap<String, Value>;

/// One record of a layer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    pub attributes: Attributes,
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute. `Value::Null` is stored as given.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Non-null value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).and_then(Value::non_null)
    }
}

/// Read access to a layer, as consumed by the join engine
pub trait LayerSource {
    fn name(&self) -> &str;

    fn schema(&self) -> &Schema;

    fn geometry_descriptor(&self) -> Option<&GeometryDescriptor>;

    /// Features in native order
    fn features(&self) -> Box<dyn Iterator<Item = (FeatureId, &Feature)> + '_>;

    fn feature(&self, id: FeatureId) -> Option<&Feature>;
}

/// Materialized layer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layer {
    pub name: String,
    pub schema: Schema,
    pub geometry: Option<GeometryDescriptor>,
    pub features: IndexMap<FeatureId, Feature>,
}

impl Layer {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            geometry: None,
            features: IndexMap::new(),
        }
    }

    pub fn with_geometry_descriptor(mut self, descriptor: GeometryDescriptor) -> Self {
        self.geometry = Some(descriptor);
        self
    }

    /// Append a feature under the next free id
    ///
    /// The id follows the last inserted one, else the largest one. Once
    /// `FeatureId::MAX` is taken, the smallest unused id is chosen.
    pub fn push(&mut self, feature: Feature) -> FeatureId {
        let id = self.next_free_id();
        self.insert(id, feature);
        id
    }

    fn next_free_id(&self) -> FeatureId {
        let Some(&last) = self.features.keys().next_back() else {
            return 0;
        };
        if let Some(id) = last.checked_add(1).filter(|id| !self.features.contains_key(id)) {
            return id;
        }
        if let Some(id) = self.features.keys().max().and_then(|max| max.checked_add(1)) {
            return id;
        }
        (0..=FeatureId::MAX)
            .find(|id| !self.features.contains_key(id))
            .unwrap_or(FeatureId::MAX)
    }

    /// Insert a feature under an explicit id, replacing any previous one
    pub fn insert(&mut self, id: FeatureId, feature: Feature) {
        self.features.insert(id, feature);
    }

    pub fn with_features<I>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = Feature>,
    {
        for feature in features {
            self.push(feature);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl LayerSource for Layer {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn geometry_descriptor(&self) -> Option<&GeometryDescriptor> {
        self.geometry.as_ref()
    }

    fn features(&self) -> Box<dyn Iterator<Item = (FeatureId, &Feature)> + '_> {
        Box::new(self.features.iter().map(|(id, feature)| (*id, feature)))
    }

    fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_native_order() {
        let mut layer = Layer::new("dept", Schema::new());
        layer.insert(7, Feature::new().with_attribute("CODE_DEPT", "32"));
        let next = layer.push(Feature::new().with_attribute("CODE_DEPT", "02"));
        assert_eq!(next, 8);

        let ids: Vec<FeatureId> = layer.features().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![7, 8]);
        assert_eq!(layer.feature(8).unwrap().attribute("CODE_DEPT"), Some(&Value::from("02")));
    }

    #[test]
    fn test_push_after_max_id() {
        let mut layer = Layer::new("dept", Schema::new());
        layer.insert(0, Feature::new().with_attribute("CODE_DEPT", "53"));
        layer.insert(FeatureId::MAX, Feature::new().with_attribute("CODE_DEPT", "32"));

        let next = layer.push(Feature::new().with_attribute("CODE_DEPT", "95"));
        assert_eq!(next, 1);
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.feature(FeatureId::MAX).unwrap().attribute("CODE_DEPT"), Some(&Value::from("32")));
    }

    #[test]
    fn test_push_skips_taken_ids() {
        let mut layer = Layer::new("dept", Schema::new());
        layer.insert(3, Feature::new());
        layer.insert(2, Feature::new());
        assert_eq!(layer.push(Feature::new()), 4);
    }

    #[test]
    fn test_null_attribute_reads_as_absent() {
        let feature = Feature::new().with_attribute("key_id", Value::Null);
        assert_eq!(feature.attribute("key_id"), None);
        assert_eq!(feature.attribute("missing"), None);
        assert!(feature.attributes.contains_key("key_id"));
    }
}
