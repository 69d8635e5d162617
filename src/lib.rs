//! # geolayer-join
//!
//! Relational joins between in-memory geo layers.
//!
//! ## Quick Start
//!
//! ```rust
//! use geolayer_join::{join, FieldDefinition, FieldType, Feature, JoinOptions, Layer, Schema};
//!
//! let dept_schema = Schema::new()
//!     .with_field("CODE_DEPT", FieldDefinition::new(FieldType::String).with_width(2)).unwrap()
//!     .with_field("NOM_DEPT", FieldDefinition::new(FieldType::String).with_width(23)).unwrap();
//! let departments = Layer::new("dept", dept_schema)
//!     .with_features([Feature::new().with_attribute("CODE_DEPT", "32").with_attribute("NOM_DEPT", "GERS")]);
//!
//! let pop_schema = Schema::new()
//!     .with_field("CODE_DEPT", FieldDefinition::new(FieldType::String).with_width(2)).unwrap()
//!     .with_field("POPULATION", FieldDefinition::new(FieldType::Integer)).unwrap();
//! let population = Layer::new("population", pop_schema)
//!     .with_features([Feature::new().with_attribute("CODE_DEPT", "32").with_attribute("POPULATION", 191091i64)]);
//!
//! let joined = join(&departments, &population, "CODE_DEPT", "CODE_DEPT", &JoinOptions::default()).unwrap();
//!
//! assert_eq!(joined.len(), 1);
//! assert_eq!(
//!     joined.schema.names().collect::<Vec<_>>(),
//!     vec!["CODE_DEPT", "NOM_DEPT", "CODE_DEPT1", "POPULATION"]
//! );
//! ```
//!
//! ## Features
//!
//! - **Join modes**: inner, left, right and full, with per-key fan-out
//! - **Schema merging**: field filters, explicit renames and automatic
//!   suffixing of colliding names
//! - **Sparse output**: null values and unmatched sides leave no attributes
//! - **Geometry selection**: geometries are copied from one chosen side

pub mod config;
pub mod error;
pub mod join;
pub mod layer;

pub use config::{GeometryRef, JoinOptions, RenameRule};
pub use error::{JoinError, JoinResult};
pub use join::{execute_join, join, join_full, join_left, join_right, JoinMode};
pub use layer::{
    Extent, Feature, FeatureId, FieldDefinition, FieldType, Geometry, GeometryDescriptor, Layer,
    LayerSource, Schema, Value,
};
