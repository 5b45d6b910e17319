use std::fs;
use std::path::Path;

use anyhow::Result;
use geojson::{GeoJson, Geometry, Value};
use tracing::{debug, info, warn};

/// A geographic polyline of (lon, lat) pairs.
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for coastline data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    fn index(self) -> usize {
        match self {
            Lod::Low => 0,
            Lod::Medium => 1,
            Lod::High => 2,
        }
    }
}

const COASTLINE_FILES: [(&str, Lod); 3] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

const BORDER_FILES: [&str; 2] = ["ne_110m_admin_0_boundary_lines_land.json", "ne_50m_borders.json"];

/// Line work drawn under the event markers.
#[derive(Default)]
pub struct Basemap {
    coastlines: [Vec<LineString>; 3],
    borders: Vec<LineString>,
}

impl Basemap {
    /// Load whatever Natural Earth files exist in `data_dir`, falling back to
    /// the built-in outline when no coastline loads.
    pub fn load(data_dir: &Path) -> Self {
        let mut basemap = Self::default();

        for (filename, lod) in COASTLINE_FILES {
            let path = data_dir.join(filename);
            if !path.exists() {
                continue;
            }
            match read_lines(&path) {
                Ok(lines) => {
                    debug!(file = filename, lines = lines.len(), "coastlines loaded");
                    basemap.coastlines[lod.index()].extend(lines);
                }
                Err(e) => warn!(file = filename, error = %e, "failed to load coastlines"),
            }
        }

        // First border file that loads wins.
        for filename in BORDER_FILES {
            let path = data_dir.join(filename);
            if !path.exists() {
                continue;
            }
            match read_lines(&path) {
                Ok(lines) => {
                    basemap.borders = lines;
                    break;
                }
                Err(e) => warn!(file = filename, error = %e, "failed to load borders"),
            }
        }

        if !basemap.has_coastlines() {
            info!(data_dir = %data_dir.display(), "no coastline data, using built-in outline");
            basemap.coastlines[Lod::Low.index()] = builtin_outline();
        }
        basemap
    }

    /// Only the coarse built-in outline.
    pub fn builtin() -> Self {
        let mut basemap = Self::default();
        basemap.coastlines[Lod::Low.index()] = builtin_outline();
        basemap
    }

    pub fn has_coastlines(&self) -> bool {
        self.coastlines.iter().any(|c| !c.is_empty())
    }

    /// Coastlines at `lod`, or the closest coarser level that has data.
    pub fn coastlines(&self, lod: Lod) -> &[LineString] {
        self.coastlines[..=lod.index()]
            .iter()
            .rev()
            .find(|c| !c.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn borders(&self) -> &[LineString] {
        &self.borders
    }
}

fn read_lines(path: &Path) -> Result<Vec<LineString>> {
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;
    let mut lines = Vec::new();
    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    collect_lines(geometry, &mut lines);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                collect_lines(geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => collect_lines(geometry, &mut lines),
    }
    Ok(lines)
}

fn collect_lines(geometry: &Geometry, out: &mut Vec<LineString>) {
    let to_line = |coords: &Vec<Vec<f64>>| -> LineString {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(to_line)),
        // Exterior rings only
        Value::Polygon(rings) => out.extend(rings.first().map(to_line)),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().filter_map(|rings| rings.first().map(to_line)))
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, out);
            }
        }
        _ => {}
    }
}

/// Very coarse continent outlines for when no data files are present.
fn builtin_outline() -> Vec<LineString> {
    const OUTLINES: [&[(f64, f64)]; 6] = [
        // North America
        &[
            (-165.0, 65.0), (-140.0, 60.0), (-125.0, 49.0), (-117.0, 32.0),
            (-105.0, 22.0), (-97.0, 26.0), (-82.0, 25.0), (-76.0, 35.0),
            (-66.0, 44.0), (-55.0, 51.0), (-64.0, 60.0), (-80.0, 63.0),
            (-95.0, 68.0), (-125.0, 70.0), (-165.0, 65.0),
        ],
        // South America
        &[
            (-78.0, 8.0), (-60.0, 8.0), (-50.0, 0.0), (-35.0, -7.0),
            (-40.0, -22.0), (-57.0, -36.0), (-68.0, -52.0), (-74.0, -45.0),
            (-71.0, -18.0), (-81.0, -5.0), (-78.0, 8.0),
        ],
        // Europe
        &[
            (-9.0, 37.0), (3.0, 43.0), (12.0, 44.0), (19.0, 40.0),
            (26.0, 38.0), (30.0, 45.0), (40.0, 47.0), (30.0, 60.0),
            (20.0, 69.0), (5.0, 61.0), (-5.0, 58.0), (-4.0, 48.0),
            (-9.0, 43.0), (-9.0, 37.0),
        ],
        // Africa
        &[
            (-17.0, 21.0), (-10.0, 30.0), (10.0, 37.0), (32.0, 31.0),
            (43.0, 12.0), (51.0, 12.0), (40.0, -3.0), (35.0, -25.0),
            (20.0, -35.0), (12.0, -18.0), (9.0, 4.0), (-8.0, 5.0),
            (-17.0, 14.0), (-17.0, 21.0),
        ],
        // Asia
        &[
            (27.0, 41.0), (36.0, 36.0), (48.0, 30.0), (57.0, 25.0),
            (67.0, 24.0), (77.0, 8.0), (88.0, 22.0), (98.0, 16.0),
            (105.0, 9.0), (109.0, 21.0), (122.0, 31.0), (127.0, 38.0),
            (142.0, 46.0), (160.0, 60.0), (180.0, 68.0), (100.0, 77.0),
            (60.0, 70.0), (40.0, 66.0), (30.0, 60.0),
        ],
        // Australia
        &[
            (114.0, -22.0), (130.0, -12.0), (142.0, -11.0), (153.0, -27.0),
            (146.0, -39.0), (135.0, -35.0), (115.0, -34.0), (114.0, -22.0),
        ],
    ];

    OUTLINES.iter().map(|points| points.to_vec()).collect()
}
