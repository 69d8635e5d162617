/// Join key index for the build side of a layer join
///
/// Maps each non-null key value to the ids of the features carrying it.
/// Both the key order (first appearance) and the id order inside a bucket
/// (native feature order) are preserved, which fixes the output order of
/// fan-out matches.
use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{JoinError, JoinResult};
use crate::layer::{FeatureId, LayerSource, Value};

/// Feature ids sharing one key value
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    pub feature_ids: Vec<FeatureId>,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, feature_id: FeatureId) {
        self.feature_ids.push(feature_id);
    }
}

/// Key index over one layer
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    /// key -> bucket, in order of first appearance
    buckets: IndexMap<Value, Bucket, FxBuildHasher>,

    /// Every indexed feature id, in native order
    record_ids: Vec<FeatureId>,

    /// Features whose key is null or absent
    null_key_ids: Vec<FeatureId>,

    /// Number of ids stored in buckets
    total_rows: usize,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `layer` on `key_field`
    ///
    /// Fails with `FieldMissing` when the field is not in the layer schema.
    pub fn build<L>(layer: &L, key_field: &str) -> JoinResult<Self>
    where
        L: LayerSource + ?Sized,
    {
        if !layer.schema().contains(key_field) {
            return Err(JoinError::field_missing_in(key_field, layer.name()));
        }

        let mut index = KeyIndex::new();
        for (feature_id, feature) in layer.features() {
            match feature.attribute(key_field) {
                Some(key) => index.insert(key.clone(), feature_id),
                None => index.insert_null(feature_id),
            }
        }

        debug!(
            "Indexed layer {} on {}: {} keys, {} rows, {} null keys",
            layer.name(),
            key_field,
            index.num_keys(),
            index.total_rows(),
            index.null_key_ids.len()
        );

        Ok(index)
    }

    /// Add a feature under a key; null keys are routed to the null list
    pub fn insert(&mut self, key: Value, feature_id: FeatureId) {
        if key.is_null() {
            self.insert_null(feature_id);
            return;
        }
        self.buckets
            .entry(key)
            .or_insert_with(Bucket::new)
            .add(feature_id);
        self.record_ids.push(feature_id);
        self.total_rows += 1;
    }

    fn insert_null(&mut self, feature_id: FeatureId) {
        self.null_key_ids.push(feature_id);
        self.record_ids.push(feature_id);
    }

    /// Feature ids matching `key`; empty for misses and null keys
    pub fn probe(&self, key: &Value) -> &[FeatureId] {
        if key.is_null() {
            return &[];
        }
        self.buckets
            .get(key)
            .map(|bucket| bucket.feature_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Distinct keys in order of first appearance
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.buckets.keys()
    }

    pub fn num_keys(&self) -> usize {
        self.buckets.len()
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn null_key_ids(&self) -> &[FeatureId] {
        &self.null_key_ids
    }

    /// All feature ids seen while building, in native order
    pub fn record_ids(&self) -> &[FeatureId] {
        &self.record_ids
    }

    pub fn is_empty(&self) -> bool {
        self.record_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Feature, FieldDefinition, FieldType, Layer, Schema};

    fn keyed_layer(keys: &[Value]) -> Layer {
        let schema = Schema::new()
            .with_field("key_id", FieldDefinition::new(FieldType::Integer))
            .unwrap();
        Layer::new("keys", schema).with_features(
            keys.iter()
                .map(|key| Feature::new().with_attribute("key_id", key.clone())),
        )
    }

    #[test]
    fn test_index_insert_probe() {
        let mut index = KeyIndex::new();

        index.insert(Value::Integer(1), 100);
        index.insert(Value::Integer(1), 200);
        index.insert(Value::Integer(2), 300);

        assert_eq!(index.probe(&Value::Integer(1)), &[100, 200]);
        assert_eq!(index.probe(&Value::Integer(2)), &[300]);
        assert!(index.probe(&Value::Integer(3)).is_empty());
        assert_eq!(index.total_rows(), 3);
        assert_eq!(index.num_keys(), 2);
    }

    #[test]
    fn test_build_preserves_orders() {
        let layer = keyed_layer(&[
            Value::Integer(5),
            Value::Integer(3),
            Value::Integer(5),
            Value::Null,
            Value::Integer(3),
        ]);
        let index = KeyIndex::build(&layer, "key_id").unwrap();

        assert_eq!(index.keys().cloned().collect::<Vec<_>>(), vec![Value::Integer(5), Value::Integer(3)]);
        assert_eq!(index.probe(&Value::Integer(5)), &[0, 2]);
        assert_eq!(index.probe(&Value::Integer(3)), &[1, 4]);
        assert_eq!(index.null_key_ids(), &[3]);
        assert_eq!(index.record_ids(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_null_keys_never_match() {
        let layer = keyed_layer(&[Value::Null, Value::Null]);
        let index = KeyIndex::build(&layer, "key_id").unwrap();

        assert!(index.probe(&Value::Null).is_empty());
        assert_eq!(index.num_keys(), 0);
        assert_eq!(index.null_key_ids().len(), 2);
    }

    #[test]
    fn test_absent_key_attribute_is_null() {
        let mut layer = keyed_layer(&[Value::Integer(1)]);
        layer.push(Feature::new());

        let index = KeyIndex::build(&layer, "key_id").unwrap();
        assert_eq!(index.null_key_ids(), &[1]);
    }

    #[test]
    fn test_missing_key_field() {
        let layer = keyed_layer(&[Value::Integer(1)]);
        let err = KeyIndex::build(&layer, "CODE_DEPT").unwrap_err();
        assert_eq!(err, JoinError::field_missing_in("CODE_DEPT", "keys"));
    }
}
