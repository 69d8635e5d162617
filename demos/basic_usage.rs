use anyhow::Result;
use geolayer_join::{
    join, join_full, join_left, join_right, Extent, Feature, FieldDefinition, FieldType, Geometry,
    GeometryDescriptor, GeometryRef, JoinOptions, Layer, Schema,
};
use tracing_subscriber::EnvFilter;

fn departments() -> Result<Layer> {
    let schema = Schema::new()
        .with_field("CODE_DEPT", FieldDefinition::new(FieldType::String).with_width(2))?
        .with_field("NOM_DEPT", FieldDefinition::new(FieldType::String).with_width(23))?;

    let rows = [
        ("32", "GERS", Extent::new(454_000.0, 6_234_000.0, 537_000.0, 6_320_000.0)),
        ("53", "MAYENNE", Extent::new(382_932.0, 6_743_442.0, 474_394.0, 6_833_996.0)),
        ("95", "VAL-D'OISE", Extent::new(620_000.0, 6_868_000.0, 670_000.0, 6_900_000.0)),
    ];
    let layer = Layer::new("FRANCE_DPT", schema)
        .with_geometry_descriptor(GeometryDescriptor::new(["Polygon"]).with_crs(2154))
        .with_features(rows.into_iter().map(|(code, name, bbox)| {
            Feature::new()
                .with_attribute("CODE_DEPT", code)
                .with_attribute("NOM_DEPT", name)
                .with_geometry(Geometry::new("Polygon", code.as_bytes().to_vec()).with_bbox(bbox))
        }));
    Ok(layer)
}

fn population() -> Result<Layer> {
    let schema = Schema::new()
        .with_field("CODE_DEPT", FieldDefinition::new(FieldType::String).with_width(2))?
        .with_field("POPULATION", FieldDefinition::new(FieldType::Integer))?
        .with_field("DENSITY", FieldDefinition::new(FieldType::Real).with_width(7).with_precision(2))?;

    let rows = [("32", 191_091i64, 30.31), ("53", 307_445, 59.03), ("56", 750_863, 109.28)];
    Ok(Layer::new("FRANCE_DPT_POPULATION", schema).with_features(rows.into_iter().map(
        |(code, population, density)| {
            Feature::new()
                .with_attribute("CODE_DEPT", code)
                .with_attribute("POPULATION", population)
                .with_attribute("DENSITY", density)
        },
    )))
}

fn print_layer(title: &str, layer: &Layer) {
    println!("\n--- {} ---", title);
    println!("Layer: {} ({} features)", layer.name, layer.len());
    println!("Fields: {}", layer.schema.names().collect::<Vec<_>>().join(", "));
    for (id, feature) in &layer.features {
        let attributes: Vec<String> = feature
            .attributes
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        let geometry = feature
            .geometry
            .as_ref()
            .map(|g| g.geometry_type().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  [{}] {} | geometry: {}", id, attributes.join(" "), geometry);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Geolayer Join - Basic Usage Example");

    let departments = departments()?;
    let population = population()?;
    let options = JoinOptions::new().with_geometry_ref(GeometryRef::GeolayerA);

    let inner = join(&departments, &population, "CODE_DEPT", "CODE_DEPT", &options)?;
    print_layer("inner", &inner);

    let left = join_left(&departments, &population, "CODE_DEPT", "CODE_DEPT", &options)?;
    print_layer("left", &left);

    let right = join_right(&departments, &population, "CODE_DEPT", "CODE_DEPT", &options)?;
    print_layer("right", &right);

    let full_options = options
        .with_output_name("FRANCE_DPT_WITH_POPULATION")
        .with_field_filter_b(["POPULATION", "DENSITY"]);
    let full = join_full(&departments, &population, "CODE_DEPT", "CODE_DEPT", &full_options)?;
    print_layer("full", &full);
    if let Some(descriptor) = &full.geometry {
        println!("Geometry: {:?} crs={:?} extent={:?}", descriptor.geometry_types, descriptor.crs, descriptor.extent);
    }

    Ok(())
}
