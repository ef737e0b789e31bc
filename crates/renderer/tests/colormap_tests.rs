//! Tests for colormap construction.

use renderer::colormap::{
    AttributeColumn, AttributeTable, Color, ColorInterval, ColorPoint, Colormap, ColumnUsage,
};

// ============================================================================
// Helper functions
// ============================================================================

/// Intervals for a total standing dry matter style legend (kg/ha).
fn biomass_intervals() -> Vec<ColorInterval> {
    let rows: [(u32, u32, [u8; 4]); 14] = [
        (0, 0, [255, 255, 255, 255]),
        (1, 1, [215, 25, 28, 255]),
        (1, 250, [215, 25, 28, 255]),
        (251, 500, [234, 99, 62, 255]),
        (501, 750, [253, 174, 97, 255]),
        (751, 1000, [254, 215, 145, 255]),
        (1001, 1250, [255, 255, 192, 255]),
        (1251, 1500, [211, 236, 149, 255]),
        (1501, 1750, [166, 217, 106, 255]),
        (1751, 2000, [54, 162, 40, 255]),
        (2001, 3000, [8, 96, 9, 255]),
        (3001, 4000, [14, 39, 17, 255]),
        (4001, 5000, [255, 0, 255, 255]),
        (5001, 6000, [148, 33, 225, 255]),
    ];
    rows.iter()
        .map(|(min, max, rgba)| ColorInterval::new(*min, *max, Color::from(*rgba)))
        .collect()
}

fn biomass_points() -> Vec<ColorPoint> {
    let rows: [(u32, [u8; 4]); 14] = [
        (0, [255, 255, 255, 255]),
        (1, [215, 25, 28, 255]),
        (250, [215, 25, 28, 255]),
        (500, [234, 99, 62, 255]),
        (750, [253, 174, 97, 255]),
        (1000, [254, 215, 145, 255]),
        (1250, [255, 255, 192, 255]),
        (1500, [211, 236, 149, 255]),
        (1750, [166, 217, 106, 255]),
        (2000, [54, 162, 40, 255]),
        (3000, [8, 96, 9, 255]),
        (4000, [14, 39, 17, 255]),
        (5000, [255, 0, 255, 255]),
        (6000, [148, 33, 225, 255]),
    ];
    rows.iter()
        .map(|(value, rgba)| ColorPoint::new(*value, Color::from(*rgba)))
        .collect()
}

// ============================================================================
// Interval tests
// ============================================================================

#[test]
fn test_intervals_shape() {
    let map = Colormap::from_intervals(&biomass_intervals()).unwrap();
    assert_eq!(map.shape(), (4, 6000));
    assert_eq!(map.len(), 6000);
}

#[test]
fn test_red_interval_scenario() {
    let white = Color::new(255, 255, 255, 255);
    let red = Color::new(255, 0, 0, 255);
    let map = Colormap::from_intervals(&[
        ColorInterval::new(0, 0, white),
        ColorInterval::new(1, 100, red),
    ])
    .unwrap();

    assert_eq!(map.lookup(50.0), red.to_array());
}

#[test]
fn test_interval_boundaries_are_half_open() {
    let map = Colormap::from_intervals(&biomass_intervals()).unwrap();

    // 250 belongs to no interval: [1, 250) ends before it, [251, 500) starts after
    assert_eq!(map.entry(249), Some([215, 25, 28, 255]));
    assert_eq!(map.entry(250), Some([0, 0, 0, 0]));
    assert_eq!(map.entry(251), Some([234, 99, 62, 255]));
    // Last covered entry
    assert_eq!(map.entry(5999), Some([148, 33, 225, 255]));
    assert_eq!(map.entry(6000), None);
}

#[test]
fn test_empty_intervals_rejected() {
    assert!(Colormap::from_intervals(&[]).is_err());
    // A single empty interval produces a zero-length table
    let empty = [ColorInterval::new(0, 0, Color::transparent())];
    assert!(Colormap::from_intervals(&empty).is_err());
}

// ============================================================================
// Point tests
// ============================================================================

#[test]
fn test_points_shape() {
    let map = Colormap::from_points(&biomass_points()).unwrap();
    assert_eq!(map.shape(), (4, 6001));
}

#[test]
fn test_points_hit_control_values_exactly() {
    let points = biomass_points();
    let map = Colormap::from_points(&points).unwrap();
    for point in &points {
        // value 1 follows value 0 directly, both are exact
        assert_eq!(map.entry(point.value as usize), Some(point.color.to_array()));
    }
}

#[test]
fn test_points_interpolate_midway() {
    let map = Colormap::from_points(&biomass_points()).unwrap();
    // Halfway between 2000 (54,162,40) and 3000 (8,96,9)
    let mid = map.entry(2500).unwrap();
    assert_eq!(mid, [31, 129, 24, 255]);
}

#[test]
fn test_channels_are_bytes() {
    let map = Colormap::from_points(&biomass_points()).unwrap();
    for channel in 0..4 {
        assert_eq!(map.channel(channel).len(), map.len());
    }
}

// ============================================================================
// Attribute table tests
// ============================================================================

fn column(name: &str, usage: ColumnUsage, values: &[f64]) -> AttributeColumn {
    AttributeColumn {
        name: name.to_string(),
        usage,
        values: values.to_vec(),
    }
}

#[test]
fn test_attribute_table_colours() {
    let table = AttributeTable {
        columns: vec![
            column("Histogram", ColumnUsage::Other, &[10.0, 20.0, 30.0]),
            column("Red", ColumnUsage::Red, &[0.0, 255.0, 10.0]),
            column("Green", ColumnUsage::Green, &[0.0, 128.0, 20.0]),
            column("Blue", ColumnUsage::Blue, &[0.0, 64.0, 30.0]),
        ],
    };

    let map = Colormap::from_attribute_table(&table).unwrap();
    assert_eq!(map.shape(), (4, 3));
    assert_eq!(map.entry(1), Some([255, 128, 64, 255]));
    assert_eq!(map.entry(2), Some([10, 20, 30, 255]));
}

#[test]
fn test_attribute_table_alpha_column() {
    let table = AttributeTable {
        columns: vec![
            column("Red", ColumnUsage::Red, &[1.0, 2.0]),
            column("Green", ColumnUsage::Green, &[3.0, 4.0]),
            column("Blue", ColumnUsage::Blue, &[5.0, 6.0]),
            column("Alpha", ColumnUsage::Alpha, &[0.0, 255.0]),
        ],
    };

    let map = Colormap::from_attribute_table(&table).unwrap();
    assert_eq!(map.entry(0), Some([1, 3, 5, 0]));
    assert_eq!(map.entry(1), Some([2, 4, 6, 255]));
}

// ============================================================================
// Serialization tests
// ============================================================================

#[test]
fn test_intervals_from_yaml() {
    let yaml = r#"
- min: 0
  max: 10
  color: [0, 0, 255, 255]
- min: 10
  max: 20
  color: [255, 0, 0, 128]
"#;
    let intervals: Vec<ColorInterval> = serde_yaml::from_str(yaml).unwrap();
    let map = Colormap::from_intervals(&intervals).unwrap();
    assert_eq!(map.lookup(5.0), [0, 0, 255, 255]);
    assert_eq!(map.lookup(15.0), [255, 0, 0, 128]);
}

#[test]
fn test_points_from_json() {
    let json = r#"[{"value": 0, "color": [0, 0, 0, 255]}, {"value": 2, "color": [200, 100, 50, 255]}]"#;
    let points: Vec<ColorPoint> = serde_json::from_str(json).unwrap();
    let map = Colormap::from_points(&points).unwrap();
    assert_eq!(map.entry(1), Some([100, 50, 25, 255]));
}
