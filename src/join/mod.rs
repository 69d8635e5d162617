//! Two-layer joins
//!
//! [`join`], [`join_left`], [`join_right`] and [`join_full`] share one
//! pipeline:
//!
//! 1. check that both join-key fields exist
//! 2. merge the schemas ([`schema_merge`])
//! 3. index the build side on its key ([`key_index`])
//! 4. stream the probe side against the index ([`planner`])
//! 5. compose one output feature per pair ([`compose`])
//!
//! Output features are numbered densely from 0 in emission order.

pub mod compose;
pub mod key_index;
pub mod planner;
pub mod schema_merge;

pub use compose::{compose_record, merge_feature, FeatureSide, MergeTarget};
pub use key_index::KeyIndex;
pub use planner::{plan_matches, JoinMode, MatchPair, MatchPlan, Side};
pub use schema_merge::{merge_schemas, FieldMapping, MergedSchema};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::{GeometryRef, JoinOptions};
use crate::error::{JoinError, JoinResult};
use crate::layer::{FeatureId, GeometryDescriptor, Layer, LayerSource};

/// Inner join: one row per pair of features with equal, non-null keys
pub fn join<A, B>(
    layer_a: &A,
    layer_b: &B,
    on_field_a: &str,
    on_field_b: &str,
    options: &JoinOptions,
) -> JoinResult<Layer>
where
    A: LayerSource + ?Sized,
    B: LayerSource + ?Sized,
{
    execute_join(JoinMode::Inner, layer_a, layer_b, on_field_a, on_field_b, options)
}

/// Left join: every feature of A appears at least once
pub fn join_left<A, B>(
    layer_a: &A,
    layer_b: &B,
    on_field_a: &str,
    on_field_b: &str,
    options: &JoinOptions,
) -> JoinResult<Layer>
where
    A: LayerSource + ?Sized,
    B: LayerSource + ?Sized,
{
    execute_join(JoinMode::Left, layer_a, layer_b, on_field_a, on_field_b, options)
}

/// Right join: every feature of B appears at least once
pub fn join_right<A, B>(
    layer_a: &A,
    layer_b: &B,
    on_field_a: &str,
    on_field_b: &str,
    options: &JoinOptions,
) -> JoinResult<Layer>
where
    A: LayerSource + ?Sized,
    B: LayerSource + ?Sized,
{
    execute_join(JoinMode::Right, layer_a, layer_b, on_field_a, on_field_b, options)
}

/// Full join: left join followed by the unmatched features of B
pub fn join_full<A, B>(
    layer_a: &A,
    layer_b: &B,
    on_field_a: &str,
    on_field_b: &str,
    options: &JoinOptions,
) -> JoinResult<Layer>
where
    A: LayerSource + ?Sized,
    B: LayerSource + ?Sized,
{
    execute_join(JoinMode::Full, layer_a, layer_b, on_field_a, on_field_b, options)
}

/// Run a join of the given mode
pub fn execute_join<A, B>(
    mode: JoinMode,
    layer_a: &A,
    layer_b: &B,
    on_field_a: &str,
    on_field_b: &str,
    options: &JoinOptions,
) -> JoinResult<Layer>
where
    A: LayerSource + ?Sized,
    B: LayerSource + ?Sized,
{
    if !layer_a.schema().contains(on_field_a) {
        return Err(JoinError::field_missing_in(on_field_a, layer_a.name()));
    }
    if !layer_b.schema().contains(on_field_b) {
        return Err(JoinError::field_missing_in(on_field_b, layer_b.name()));
    }

    let merged = merge_schemas(
        layer_a.schema(),
        layer_b.schema(),
        options.field_name_filter_a.as_deref(),
        options.field_name_filter_b.as_deref(),
        &options.rename_output_field_from_geolayer_a,
        &options.rename_output_field_from_geolayer_b,
    )?;

    let index = match mode.build_side() {
        Side::A => KeyIndex::build(layer_a, on_field_a)?,
        Side::B => KeyIndex::build(layer_b, on_field_b)?,
    };
    let pairs = match mode.probe_side() {
        Side::A => plan_matches(mode, &index, layer_a, on_field_a)?,
        Side::B => plan_matches(mode, &index, layer_b, on_field_b)?,
    };

    let mut features = IndexMap::new();
    for (position, pair) in pairs.enumerate() {
        let feature = compose_record(
            pair,
            layer_a,
            layer_b,
            &merged.mapping_a,
            &merged.mapping_b,
            options.geometry_ref,
        );
        features.insert(position as FeatureId, feature);
    }

    let crs = options
        .geometry_ref
        .and_then(|side| match side {
            GeometryRef::GeolayerA => layer_a.geometry_descriptor(),
            GeometryRef::GeolayerB => layer_b.geometry_descriptor(),
        })
        .and_then(|descriptor| descriptor.crs);
    let geometry = GeometryDescriptor::from_geometries(
        features.values().filter_map(|feature| feature.geometry.as_ref()),
        crs,
    );

    let name = options.output_name(layer_a.name(), layer_b.name());
    debug!(
        "Join {} produced {} fields, geometry types: {:?}",
        name,
        merged.schema.len(),
        geometry.as_ref().map(|g| &g.geometry_types)
    );
    info!("Completed {} join {}: {} features", mode, name, features.len());

    Ok(Layer {
        name,
        schema: merged.schema,
        geometry,
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenameRule;
    use crate::layer::{Feature, FieldDefinition, FieldType, Geometry, Schema, Value};

    fn layer(name: &str, fields: &[(&str, FieldType)], rows: Vec<Vec<(&str, Value)>>) -> Layer {
        let mut schema = Schema::new();
        for (field, field_type) in fields {
            schema.push(*field, FieldDefinition::new(*field_type)).unwrap();
        }
        Layer::new(name, schema).with_features(rows.into_iter().map(|row| {
            row.into_iter()
                .fold(Feature::new(), |feature, (field, value)| feature.with_attribute(field, value))
        }))
    }

    #[test]
    fn test_join_on_missing_fields() {
        let a = layer("a", &[("id", FieldType::Integer)], vec![]);
        let b = layer("b", &[("key", FieldType::Integer)], vec![]);

        let err = join(&a, &b, "key", "key", &JoinOptions::default()).unwrap_err();
        assert_eq!(err, JoinError::field_missing_in("key", "a"));

        let err = join_full(&a, &b, "id", "id", &JoinOptions::default()).unwrap_err();
        assert_eq!(err, JoinError::field_missing_in("id", "b"));
    }

    #[test]
    fn test_key_fields_need_not_survive_filters() {
        let a = layer(
            "a",
            &[("id", FieldType::Integer), ("label", FieldType::String)],
            vec![vec![("id", Value::Integer(1)), ("label", Value::from("one"))]],
        );
        let b = layer(
            "b",
            &[("id", FieldType::Integer), ("weight", FieldType::Real)],
            vec![vec![("id", Value::Integer(1)), ("weight", Value::Real(0.5))]],
        );
        let options = JoinOptions::new()
            .with_field_filter_a(["label"])
            .with_field_filter_b(["weight"]);

        let out = join(&a, &b, "id", "id", &options).unwrap();
        assert_eq!(out.schema.names().collect::<Vec<_>>(), vec!["label", "weight"]);
        assert_eq!(out.features[0].attributes.len(), 2);
    }

    #[test]
    fn test_empty_result_keeps_schema() {
        let a = layer("a", &[("id", FieldType::Integer)], vec![vec![("id", Value::Integer(1))]]);
        let b = layer("b", &[("id", FieldType::Integer)], vec![vec![("id", Value::Integer(2))]]);

        let out = join(&a, &b, "id", "id", &JoinOptions::default()).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.schema.names().collect::<Vec<_>>(), vec!["id", "id1"]);
        assert_eq!(out.name, "a_join_b");
        assert!(out.geometry.is_none());
    }

    #[test]
    fn test_dense_output_ids() {
        let mut a = layer("a", &[("id", FieldType::Integer)], vec![]);
        a.insert(40, Feature::new().with_attribute("id", 1i64));
        a.insert(10, Feature::new().with_attribute("id", 2i64));
        let b = layer(
            "b",
            &[("id", FieldType::Integer)],
            vec![vec![("id", Value::Integer(2))], vec![("id", Value::Integer(1))]],
        );

        let out = join_left(&a, &b, "id", "id", &JoinOptions::default()).unwrap();
        assert_eq!(out.features.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(out.features[0].attribute("id"), Some(&Value::Integer(1)));
        assert_eq!(out.features[1].attribute("id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_geometry_descriptor_recomputed() {
        let schema = Schema::new()
            .with_field("id", FieldDefinition::new(FieldType::Integer))
            .unwrap();
        let a = Layer::new("a", schema.clone())
            .with_geometry_descriptor(GeometryDescriptor::new(["Polygon", "Point"]).with_crs(2154))
            .with_features([
                Feature::new().with_attribute("id", 1i64).with_geometry(Geometry::new("Polygon", vec![1u8])),
                Feature::new().with_attribute("id", 2i64).with_geometry(Geometry::new("Point", vec![2u8])),
            ]);
        let b = Layer::new("b", schema).with_features([Feature::new().with_attribute("id", 1i64)]);

        let options = JoinOptions::new().with_geometry_ref(GeometryRef::GeolayerA);
        let out = join(&a, &b, "id", "id", &options).unwrap();
        let descriptor = out.geometry.unwrap();
        assert_eq!(descriptor.geometry_types.iter().collect::<Vec<_>>(), vec!["Polygon"]);
        assert_eq!(descriptor.crs, Some(2154));

        let options = JoinOptions::new()
            .with_geometry_ref(GeometryRef::GeolayerB)
            .with_rename_b(RenameRule::explicit([("id", "b_id")]));
        let out = join(&a, &b, "id", "id", &options).unwrap();
        assert!(out.geometry.is_none());
        assert!(out.features[0].geometry.is_none());
    }
}
