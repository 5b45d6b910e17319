use std::f64::consts::PI;

const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 64.0;
/// Zoom used when every point sits at the same spot.
const SINGLE_POINT_ZOOM: f64 = 12.0;

/// Visible map area: Web Mercator centered on (lon, lat).
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub center_lon: f64,
    pub center_lat: f64,
    /// 1.0 shows the whole world across the width
    pub zoom: f64,
    /// Canvas width in dots
    pub width: usize,
    /// Canvas height in dots
    pub height: usize,
}

/// Normalized Mercator (x, y), both in [0, 1] for the world.
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-85.0, 85.0).to_radians();
    let x = (lon + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    (x, y)
}

impl Viewport {
    pub fn world(width: usize, height: usize) -> Self {
        Self {
            center_lon: 0.0,
            center_lat: 20.0,
            zoom: MIN_ZOOM,
            width,
            height,
        }
    }

    /// Viewport that frames every (lon, lat) point with some margin.
    pub fn fit(points: impl IntoIterator<Item = (f64, f64)>, width: usize, height: usize) -> Self {
        let mut bbox: Option<(f64, f64, f64, f64)> = None;
        for (lon, lat) in points {
            bbox = Some(match bbox {
                None => (lon, lat, lon, lat),
                Some((w, s, e, n)) => (w.min(lon), s.min(lat), e.max(lon), n.max(lat)),
            });
        }
        let Some((west, south, east, north)) = bbox else {
            return Self::world(width, height);
        };

        let (x0, y0) = mercator(west, north);
        let (x1, y1) = mercator(east, south);
        let span_x = (x1 - x0).abs();
        let span_y = (y1 - y0).abs();

        let zoom = if span_x < 1e-9 && span_y < 1e-9 {
            SINGLE_POINT_ZOOM
        } else {
            // scale = zoom * width dots per unit; keep 80% of the canvas in use
            let by_x = if span_x > 0.0 { 0.8 / span_x } else { MAX_ZOOM };
            let by_y = if span_y > 0.0 {
                0.8 * height as f64 / (width.max(1) as f64 * span_y)
            } else {
                MAX_ZOOM
            };
            by_x.min(by_y)
        };

        Self {
            center_lon: (west + east) / 2.0,
            center_lat: (south + north) / 2.0,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Pan by a dot delta.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5;

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Project (lon, lat) to dot coordinates.
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = mercator(lon, lat);
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.zoom * self.width as f64;

        let px = ((x - cx) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - cy) * scale + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    pub fn is_visible(&self, (px, py): (i32, i32)) -> bool {
        px >= 0 && py >= 0 && (px as usize) < self.width && (py as usize) < self.height
    }

    /// Rough bounding-box test for a segment.
    pub fn segment_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        p1.0.max(p2.0) >= 0
            && p1.0.min(p2.0) < self.width as i32
            && p1.1.max(p2.1) >= 0
            && p1.1.min(p2.1) < self.height as i32
    }

    /// Center as "12.3°N, 45.6°W".
    pub fn center_label(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.center_lat.abs(),
            if self.center_lat >= 0.0 { "N" } else { "S" },
            self.center_lon.abs(),
            if self.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_projects_to_middle() {
        let vp = Viewport {
            center_lon: 0.0,
            center_lat: 0.0,
            zoom: 1.0,
            width: 100,
            height: 100,
        };
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn pan_moves_center_east() {
        let mut vp = Viewport::world(100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
    }

    #[test]
    fn fit_keeps_points_visible() {
        let points = [(-77.0, -12.0), (-74.1, 4.7), (-58.4, -34.6)];
        let vp = Viewport::fit(points, 160, 80);
        assert!(vp.zoom > 1.0);
        for (lon, lat) in points {
            assert!(vp.is_visible(vp.project(lon, lat)), "({lon}, {lat})");
        }
    }

    #[test]
    fn fit_single_point_zooms_in() {
        let vp = Viewport::fit([(2.3, 48.9), (2.3, 48.9)], 100, 60);
        assert_eq!(vp.zoom, SINGLE_POINT_ZOOM);
        assert!(vp.is_visible(vp.project(2.3, 48.9)));
    }

    #[test]
    fn fit_without_points_shows_world() {
        let vp = Viewport::fit(std::iter::empty(), 100, 60);
        assert_eq!(vp, Viewport::world(100, 60));
    }

    #[test]
    fn center_label_hemispheres() {
        let mut vp = Viewport::world(10, 10);
        vp.center_lon = -3.5;
        vp.center_lat = -12.3;
        assert_eq!(vp.center_label(), "12.3°S, 3.5°W");
    }
}
