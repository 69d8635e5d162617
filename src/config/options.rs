//! Join options
//!
//! Options are plain serde structs with defaults, so a caller can build them
//! in code or load them from JSON:
//!
//! ```rust
//! use geolayer_join::config::{GeometryRef, JoinOptions, RenameRule};
//!
//! let options: JoinOptions = serde_json::from_str(r#"{
//!     "output_geolayer_name": "FRANCE_DPT_WITH_POPULATION",
//!     "field_name_filter_b": ["POPULATION", "DENSITY"],
//!     "rename_output_field_from_geolayer_b": "auto",
//!     "geometry_ref": "geolayer_a"
//! }"#).unwrap();
//!
//! assert_eq!(options.geometry_ref, Some(GeometryRef::GeolayerA));
//! assert_eq!(options.rename_output_field_from_geolayer_b, RenameRule::Auto);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::JoinError;

const AUTO_TOKEN: &str = "auto";

/// How output field names are chosen for one side
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RenameRuleRepr", into = "RenameRuleRepr")]
pub enum RenameRule {
    /// Collisions on side B get the smallest free integer suffix
    #[default]
    Auto,
    /// Old name to new name; remaining collisions are an error
    Explicit(IndexMap<String, String>),
}

impl RenameRule {
    pub fn explicit<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RenameRule::Explicit(
            pairs
                .into_iter()
                .map(|(old, new)| (old.into(), new.into()))
                .collect(),
        )
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, RenameRule::Auto)
    }

    /// Candidate output name for a field
    pub fn apply<'a>(&'a self, field: &'a str) -> &'a str {
        match self {
            RenameRule::Auto => field,
            RenameRule::Explicit(mapping) => mapping.get(field).map(String::as_str).unwrap_or(field),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RenameRuleRepr {
    Token(String),
    Mapping(IndexMap<String, String>),
}

impl TryFrom<RenameRuleRepr> for RenameRule {
    type Error = JoinError;

    fn try_from(repr: RenameRuleRepr) -> Result<Self, Self::Error> {
        match repr {
            RenameRuleRepr::Token(token) if token == AUTO_TOKEN => Ok(RenameRule::Auto),
            RenameRuleRepr::Token(token) => Err(JoinError::invalid_option(format!(
                "rename rule must be \"{}\" or a field mapping, got \"{}\"",
                AUTO_TOKEN, token
            ))),
            RenameRuleRepr::Mapping(mapping) => Ok(RenameRule::Explicit(mapping)),
        }
    }
}

impl From<RenameRule> for RenameRuleRepr {
    fn from(rule: RenameRule) -> Self {
        match rule {
            RenameRule::Auto => RenameRuleRepr::Token(AUTO_TOKEN.to_string()),
            RenameRule::Explicit(mapping) => RenameRuleRepr::Mapping(mapping),
        }
    }
}

/// Which input layer supplies output geometries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum GeometryRef {
    GeolayerA,
    GeolayerB,
}

impl GeometryRef {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryRef::GeolayerA => "geolayer_a",
            GeometryRef::GeolayerB => "geolayer_b",
        }
    }
}

impl TryFrom<String> for GeometryRef {
    type Error = JoinError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "geolayer_a" => Ok(GeometryRef::GeolayerA),
            "geolayer_b" => Ok(GeometryRef::GeolayerB),
            other => Err(JoinError::invalid_option(format!(
                "geometry_ref must be \"geolayer_a\" or \"geolayer_b\", got \"{}\"",
                other
            ))),
        }
    }
}

impl From<GeometryRef> for &'static str {
    fn from(geometry_ref: GeometryRef) -> Self {
        geometry_ref.as_str()
    }
}

/// Options shared by every join entry point
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JoinOptions {
    /// Output layer name; defaults to `{a}_join_{b}`
    pub output_geolayer_name: Option<String>,

    /// Allow-list of layer A fields, in output order
    pub field_name_filter_a: Option<Vec<String>>,

    /// Allow-list of layer B fields, in output order
    pub field_name_filter_b: Option<Vec<String>>,

    pub rename_output_field_from_geolayer_a: RenameRule,

    pub rename_output_field_from_geolayer_b: RenameRule,

    /// Side whose geometry is copied; no geometry when unset
    pub geometry_ref: Option<GeometryRef>,
}

impl JoinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_geolayer_name = Some(name.into());
        self
    }

    pub fn with_field_filter_a<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_name_filter_a = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_field_filter_b<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_name_filter_b = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rename_a(mut self, rule: RenameRule) -> Self {
        self.rename_output_field_from_geolayer_a = rule;
        self
    }

    pub fn with_rename_b(mut self, rule: RenameRule) -> Self {
        self.rename_output_field_from_geolayer_b = rule;
        self
    }

    pub fn with_geometry_ref(mut self, geometry_ref: GeometryRef) -> Self {
        self.geometry_ref = Some(geometry_ref);
        self
    }

    /// Output layer name for the given input names
    pub fn output_name(&self, name_a: &str, name_b: &str) -> String {
        match &self.output_geolayer_name {
            Some(name) => name.clone(),
            None => format!("{}_join_{}", name_a, name_b),
        }
    }
}
