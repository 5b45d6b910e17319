//! Everything the dashboard shows for one filtered view.

mod export;

pub use export::{export_columns, export_csv, write_export, EXPORT_FILE_NAME, EXPORT_MIME};

use std::collections::BTreeSet;
use std::fmt;

use crate::filter::{Bound, Domain, FilteredView, Selections};

/// Headers of the table view.
pub const TABLE_COLUMNS: [&str; 6] = ["Year", "City", "Attack Type", "Fatalities", "Wounded", "Summary"];

/// Metrics strip values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub count: usize,
    pub total_fatalities: u64,
    pub distinct_countries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBucket {
    pub year: i32,
    pub count: u64,
}

/// One event marker on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
    pub city: String,
    /// Position of the attack type in the domain's sorted list.
    pub color: usize,
    /// Marker radius in Braille pixels.
    pub radius: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoView {
    /// The source has no coordinate columns at all.
    ColumnsMissing,
    /// Columns exist but no filtered row has both coordinates.
    NoCoordinates,
    Points(Vec<GeoPoint>),
}

impl GeoView {
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::ColumnsMissing => Some("Geolocation columns missing."),
            Self::NoCoordinates => Some("No geolocation data available."),
            Self::Points(_) => None,
        }
    }
}

/// The filter combination matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyResultWarning;

impl fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("No events found. Try adjusting your filters.")
    }
}

/// Display artifacts for a non-empty view.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub summary: Summary,
    pub rows: Vec<[String; 6]>,
    pub histogram: Vec<YearBucket>,
    pub geo: GeoView,
}

/// Outcome of one render cycle. `Empty` stops every downstream view.
#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    Empty(EmptyResultWarning),
    Ready(Dashboard),
}

pub fn render(view: &FilteredView<'_>, selections: &Selections, domain: &Domain) -> Render {
    if view.is_empty() {
        return Render::Empty(EmptyResultWarning);
    }
    Render::Ready(Dashboard {
        summary: summarize(view),
        rows: table_rows(view),
        histogram: histogram(view, selections.years),
        geo: geo_view(view, &domain.attack_types),
    })
}

pub fn summarize(view: &FilteredView<'_>) -> Summary {
    let countries: BTreeSet<&str> = view.iter().filter_map(|e| e.country.as_deref()).collect();
    Summary {
        count: view.len(),
        total_fatalities: view.iter().map(|e| u64::from(e.fatalities)).sum(),
        distinct_countries: countries.len(),
    }
}

/// Cells in [`TABLE_COLUMNS`] order.
pub fn table_rows(view: &FilteredView<'_>) -> Vec<[String; 6]> {
    view.iter()
        .map(|e| {
            [
                e.year.to_string(),
                e.city.clone().unwrap_or_default(),
                e.attack_type.clone().unwrap_or_default(),
                e.fatalities.to_string(),
                e.wounded.to_string(),
                e.summary.clone(),
            ]
        })
        .collect()
}

/// One bucket per year of the selected span, zero counts included.
pub fn histogram(view: &FilteredView<'_>, years: Bound<i32>) -> Vec<YearBucket> {
    let (min, max) = (years.min(), years.max());
    let mut buckets: Vec<YearBucket> = (min..=max).map(|year| YearBucket { year, count: 0 }).collect();
    for e in view.iter() {
        if years.contains(e.year) {
            buckets[(i64::from(e.year) - i64::from(min)) as usize].count += 1;
        }
    }
    buckets
}

/// Marker radius by fatalities: 0, 1-9, 10-99, 100+.
pub fn marker_radius(fatalities: u32) -> i32 {
    match fatalities {
        0 => 0,
        1..=9 => 1,
        10..=99 => 2,
        _ => 3,
    }
}

pub fn geo_view(view: &FilteredView<'_>, attack_types: &[String]) -> GeoView {
    if !view.has_geolocation() {
        return GeoView::ColumnsMissing;
    }

    let points: Vec<GeoPoint> = view
        .iter()
        .filter_map(|e| {
            let (lon, lat) = e.coordinates()?;
            let color = e
                .attack_type
                .as_ref()
                .and_then(|t| attack_types.iter().position(|a| a == t))
                .unwrap_or(0);
            Some(GeoPoint {
                lon,
                lat,
                city: e.city.clone().unwrap_or_default(),
                color,
                radius: marker_radius(e.fatalities),
            })
        })
        .collect();

    if points.is_empty() {
        GeoView::NoCoordinates
    } else {
        GeoView::Points(points)
    }
}
