/// Schema merging for two-layer joins
///
/// Combines the kept fields of both layers into one output schema. Side A is
/// reserved first and keeps its candidate names. Side B follows and, under
/// `RenameRule::Auto`, resolves collisions with an integer suffix.
use fxhash::FxHashSet;
use tracing::debug;

use crate::config::RenameRule;
use crate::error::{JoinError, JoinResult};
use crate::layer::Schema;

/// Source field to output field correspondence for one side
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
}

impl FieldMapping {
    /// (source, output) pairs in output order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(source, output)| (source.as_str(), output.as_str()))
    }

    /// Only the pairs whose output name differs from the source name
    pub fn renamed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(source, output)| source != output)
    }

    pub fn output_name(&self, source: &str) -> Option<&str> {
        self.iter()
            .find(|(candidate, _)| *candidate == source)
            .map(|(_, output)| output)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of [`merge_schemas`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedSchema {
    pub schema: Schema,
    pub mapping_a: FieldMapping,
    pub mapping_b: FieldMapping,
}

/// Kept field names of a schema, in filter order when a filter is given
///
/// Fails with `FieldMissing` on the first filter entry absent from the schema.
pub fn kept_fields<'a>(schema: &'a Schema, filter: Option<&'a [String]>) -> JoinResult<Vec<&'a str>> {
    match filter {
        None => Ok(schema.names().collect()),
        Some(filter) => {
            let mut seen = FxHashSet::default();
            let mut kept = Vec::with_capacity(filter.len());
            for name in filter {
                schema.require(name)?;
                if seen.insert(name.as_str()) {
                    kept.push(name.as_str());
                }
            }
            Ok(kept)
        }
    }
}

/// Smallest `name{n}` (n >= 1) not in `reserved`
fn next_free_name(name: &str, reserved: &FxHashSet<String>) -> String {
    let mut suffix = 1usize;
    loop {
        let candidate = format!("{}{}", name, suffix);
        if !reserved.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Merge the schemas of layer A and layer B
pub fn merge_schemas(
    schema_a: &Schema,
    schema_b: &Schema,
    filter_a: Option<&[String]>,
    filter_b: Option<&[String]>,
    rename_a: &RenameRule,
    rename_b: &RenameRule,
) -> JoinResult<MergedSchema> {
    let kept_a = kept_fields(schema_a, filter_a)?;
    let kept_b = kept_fields(schema_b, filter_b)?;

    let mut reserved: FxHashSet<String> = FxHashSet::default();
    let mut schema = Schema::new();
    let mut mapping_a = FieldMapping::default();
    let mut mapping_b = FieldMapping::default();

    for source in kept_a {
        let output = rename_a.apply(source).to_string();
        if !reserved.insert(output.clone()) {
            return Err(JoinError::field_exists(output));
        }
        schema.push(output.clone(), schema_a.require(source)?.clone())?;
        mapping_a.entries.push((source.to_string(), output));
    }

    for source in kept_b {
        let mut output = rename_b.apply(source).to_string();
        if reserved.contains(&output) {
            if !rename_b.is_auto() {
                return Err(JoinError::field_exists(output));
            }
            output = next_free_name(&output, &reserved);
        }
        reserved.insert(output.clone());
        schema.push(output.clone(), schema_b.require(source)?.clone())?;
        mapping_b.entries.push((source.to_string(), output));
    }

    debug!(
        "Merged schema: {} fields from a, {} fields from b, {} renamed",
        mapping_a.len(),
        mapping_b.len(),
        mapping_a.renamed().count() + mapping_b.renamed().count()
    );

    Ok(MergedSchema {
        schema,
        mapping_a,
        mapping_b,
    })
}
