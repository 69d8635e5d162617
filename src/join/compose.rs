/// Output record composition
///
/// Turns a [`MatchPair`] into one output feature. Attributes are copied under
/// their resolved names, nulls are omitted, and the geometry comes only from
/// the side named by the geometry reference.
use indexmap::IndexMap;

use super::planner::MatchPair;
use super::schema_merge::FieldMapping;
use crate::config::GeometryRef;
use crate::error::{JoinError, JoinResult};
use crate::layer::{Attributes, Feature, GeometryDescriptor, LayerSource, Schema};

fn copy_attributes(target: &mut Attributes, source: &Feature, mapping: &FieldMapping) {
    for (source_name, output_name) in mapping.iter() {
        if let Some(value) = source.attribute(source_name) {
            target.insert(output_name.to_string(), value.clone());
        }
    }
}

/// Build the output feature of one matched pair
pub fn compose_record<A, B>(
    pair: MatchPair,
    layer_a: &A,
    layer_b: &B,
    mapping_a: &FieldMapping,
    mapping_b: &FieldMapping,
    geometry_ref: Option<GeometryRef>,
) -> Feature
where
    A: LayerSource + ?Sized,
    B: LayerSource + ?Sized,
{
    let feature_a = pair.a.and_then(|id| layer_a.feature(id));
    let feature_b = pair.b.and_then(|id| layer_b.feature(id));

    let mut attributes = Attributes::with_capacity(mapping_a.len() + mapping_b.len());
    if let Some(feature) = feature_a {
        copy_attributes(&mut attributes, feature, mapping_a);
    }
    if let Some(feature) = feature_b {
        copy_attributes(&mut attributes, feature, mapping_b);
    }

    let geometry = match geometry_ref {
        Some(GeometryRef::GeolayerA) => feature_a.and_then(|f| f.geometry.clone()),
        Some(GeometryRef::GeolayerB) => feature_b.and_then(|f| f.geometry.clone()),
        None => None,
    };

    Feature { attributes, geometry }
}

/// Filter and rename settings for one feature in [`merge_feature`]
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureSide<'a> {
    /// Attributes to keep, in output order; all attributes when unset
    pub filter: Option<&'a [String]>,
    /// Old name to new name
    pub rename: Option<&'a IndexMap<String, String>>,
}

/// Schema (and geometry description) a merged feature must conform to
#[derive(Clone, Copy, Debug)]
pub struct MergeTarget<'a> {
    pub schema: &'a Schema,
    pub geometry: Option<&'a GeometryDescriptor>,
}

fn write_side(
    target: &mut Attributes,
    feature: &Feature,
    side: &FeatureSide<'_>,
    schema: Option<&Schema>,
) -> JoinResult<()> {
    let names: Vec<&str> = match side.filter {
        Some(filter) => filter.iter().map(String::as_str).collect(),
        None => feature.attributes.keys().map(String::as_str).collect(),
    };

    for name in names {
        let Some(value) = feature.attribute(name) else {
            continue;
        };
        let output = side
            .rename
            .and_then(|rename| rename.get(name))
            .map(String::as_str)
            .unwrap_or(name);
        if schema.is_some_and(|schema| !schema.contains(output)) {
            continue;
        }
        if target.contains_key(output) {
            return Err(JoinError::field_exists(output));
        }
        target.insert(output.to_string(), value.clone());
    }
    Ok(())
}

/// Merge two individual features into one
///
/// A's attributes are written first, then B's. An output name written twice
/// fails with `FieldExists`. With a target, attributes outside its schema are
/// dropped and the copied geometry must be one of its declared types.
pub fn merge_feature(
    feature_a: &Feature,
    side_a: FeatureSide<'_>,
    feature_b: &Feature,
    side_b: FeatureSide<'_>,
    target: Option<MergeTarget<'_>>,
    geometry_ref: Option<GeometryRef>,
) -> JoinResult<Feature> {
    let schema = target.map(|target| target.schema);
    let mut attributes = Attributes::new();
    write_side(&mut attributes, feature_a, &side_a, schema)?;
    write_side(&mut attributes, feature_b, &side_b, schema)?;

    let geometry = match geometry_ref {
        Some(GeometryRef::GeolayerA) => feature_a.geometry.clone(),
        Some(GeometryRef::GeolayerB) => feature_b.geometry.clone(),
        None => None,
    };

    if let (Some(geometry), Some(target)) = (&geometry, target) {
        match target.geometry {
            None => return Err(JoinError::GeometryRefNotFound),
            Some(descriptor) if !descriptor.accepts(geometry.geometry_type()) => {
                return Err(JoinError::geometry_type_mismatch(geometry.geometry_type()));
            }
            Some(_) => {}
        }
    }

    Ok(Feature { attributes, geometry })
}
