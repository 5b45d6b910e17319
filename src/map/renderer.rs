use std::collections::HashSet;

use crate::braille::BrailleCanvas;
use crate::map::basemap::{Basemap, LineString, Lod};
use crate::map::geometry::{draw_disc, draw_line};
use crate::map::projection::Viewport;
use crate::present::GeoPoint;

/// Smallest marker radius that gets a city label.
const LABEL_MIN_RADIUS: i32 = 2;

/// Display settings for map layers
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_labels: true,
        }
    }
}

/// Rendered map layers, back to front.
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    /// One canvas per attack-type colour index.
    pub markers: Vec<BrailleCanvas>,
    /// (col, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

/// Draws the basemap and event markers for a viewport.
pub struct MapRenderer {
    basemap: Basemap,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new(basemap: Basemap) -> Self {
        Self {
            basemap,
            settings: DisplaySettings::default(),
        }
    }

    /// Render into `cols` x `rows` character cells. `colors` is the number
    /// of marker layers (attack types in the domain).
    pub fn render(
        &self,
        cols: usize,
        rows: usize,
        viewport: &Viewport,
        points: &[GeoPoint],
        colors: usize,
    ) -> MapLayers {
        let mut coastlines = BrailleCanvas::new(cols, rows);
        let mut borders = BrailleCanvas::new(cols, rows);

        for line in self.basemap.coastlines(Lod::from_zoom(viewport.zoom)) {
            draw_linestring(&mut coastlines, line, viewport);
        }
        if self.settings.show_borders {
            for line in self.basemap.borders() {
                draw_linestring(&mut borders, line, viewport);
            }
        }

        let mut markers = vec![BrailleCanvas::new(cols, rows); colors.max(1)];
        let mut labels = Vec::new();
        let mut labelled: HashSet<&str> = HashSet::new();

        // Largest markers last so they stay on top of smaller ones.
        let mut ordered: Vec<&GeoPoint> = points.iter().collect();
        ordered.sort_by_key(|p| p.radius);

        for point in ordered {
            let pos = viewport.project(point.lon, point.lat);
            if !viewport.is_visible(pos) {
                continue;
            }
            let layer = point.color.min(markers.len() - 1);
            draw_disc(&mut markers[layer], pos, point.radius);

            if self.settings.show_labels
                && point.radius >= LABEL_MIN_RADIUS
                && !point.city.is_empty()
                && labelled.insert(point.city.as_str())
            {
                let col = (pos.0 / 2) as u16;
                let row = (pos.1 / 4) as u16;
                if let Some(col) = col.checked_add(2) {
                    labels.push((col, row, point.city.clone()));
                }
            }
        }

        MapLayers {
            coastlines,
            borders,
            markers,
            labels,
        }
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

/// Draw a polyline, skipping segments that wrap the antimeridian or are
/// entirely off screen.
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let p = viewport.project(lon, lat);
        if let Some(q) = prev {
            let dist = ((p.0 - q.0).abs() + (p.1 - q.1).abs()) as usize;
            if dist < viewport.width && viewport.segment_might_be_visible(q, p) {
                draw_line(canvas, q, p);
            }
        }
        prev = Some(p);
    }
}
