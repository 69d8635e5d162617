/// Opaque geometry values and the layer-level geometry descriptor
///
/// The join engine never parses a geometry. It reads the type name and the
/// optional bounding box to describe the output layer and otherwise clones
/// the value by reference.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Bounding box: (xmin, ymin, xmax, ymax)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Smallest extent covering both
    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

/// Geometry payload attached to a feature
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    geometry_type: String,
    bbox: Option<Extent>,
    payload: Arc<[u8]>,
}

impl Geometry {
    pub fn new(geometry_type: impl Into<String>, payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            geometry_type: geometry_type.into(),
            bbox: None,
            payload: payload.into(),
        }
    }

    pub fn with_bbox(mut self, bbox: Extent) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Type name, e.g. `Polygon` or `MultiPolygon`
    pub fn geometry_type(&self) -> &str {
        &self.geometry_type
    }

    pub fn bbox(&self) -> Option<&Extent> {
        self.bbox.as_ref()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// True when both values share the same payload allocation
    pub fn shares_payload(&self, other: &Geometry) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// Geometry description of a whole layer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryDescriptor {
    /// Geometry type names present in the layer
    #[serde(rename = "type")]
    pub geometry_types: BTreeSet<String>,

    /// EPSG code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
}

impl GeometryDescriptor {
    pub fn new<I, S>(geometry_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            geometry_types: geometry_types.into_iter().map(Into::into).collect(),
            crs: None,
            extent: None,
        }
    }

    pub fn with_crs(mut self, crs: u32) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn accepts(&self, geometry_type: &str) -> bool {
        self.geometry_types.contains(geometry_type)
    }

    /// Describe a set of geometries
    ///
    /// Returns `None` when the iterator is empty. The extent is the union of
    /// every available bbox.
    pub fn from_geometries<'a, I>(geometries: I, crs: Option<u32>) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Geometry>,
    {
        let mut descriptor: Option<GeometryDescriptor> = None;
        for geometry in geometries {
            let current = descriptor.get_or_insert_with(|| GeometryDescriptor {
                geometry_types: BTreeSet::new(),
                crs,
                extent: None,
            });
            current.geometry_types.insert(geometry.geometry_type().to_string());
            if let Some(bbox) = geometry.bbox() {
                current.extent = Some(match current.extent {
                    Some(extent) => extent.union(bbox),
                    None => *bbox,
                });
            }
        }
        descriptor
    }
}
