mod source;
mod synthetic;

pub use synthetic::synthetic_table;
pub use source::{CsvSource, DataSource, GraphSource, EVENT_QUERY, EVENT_QUERY_WITH_GEO};

use std::cell::OnceCell;

use tracing::{info, warn};

use crate::error::LoadError;

/// One recorded incident.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub year: i32,
    pub group: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub attack_type: Option<String>,
    pub fatalities: u32,
    pub wounded: u32,
    /// Free text searched by the keyword filter; empty when the source has none.
    pub summary: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Event {
    /// (lon, lat) when both coordinates are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => Some((lon, lat)),
            _ => None,
        }
    }
}

/// A row as it comes out of a source, before sanitizing.
#[derive(Debug, Default, Clone)]
pub(crate) struct RawEvent {
    pub year: Option<f64>,
    pub group: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub attack_type: Option<String>,
    pub fatalities: Option<f64>,
    pub wounded: Option<f64>,
    pub summary: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RawEvent {
    /// Coerce casualty nulls to zero and the year to an integer.
    /// Returns `None` when the year is unreadable or outside `i32`.
    pub fn normalize(self) -> Option<Event> {
        let year = self.year.filter(|y| y.is_finite())?.trunc();
        if year < i32::MIN as f64 || year > i32::MAX as f64 {
            return None;
        }
        let year = year as i32;
        Some(Event {
            year,
            group: non_blank(self.group),
            country: non_blank(self.country),
            city: non_blank(self.city),
            attack_type: non_blank(self.attack_type),
            fatalities: casualty_count(self.fatalities),
            wounded: casualty_count(self.wounded),
            summary: self.summary.unwrap_or_default(),
            latitude: self.latitude.filter(|v| v.is_finite()),
            longitude: self.longitude.filter(|v| v.is_finite()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn casualty_count(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// The loaded event table. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    events: Vec<Event>,
    has_geolocation: bool,
}

impl EventTable {
    pub fn new(events: Vec<Event>, has_geolocation: bool) -> Self {
        Self {
            events,
            has_geolocation,
        }
    }

    /// Build a table from raw rows, dropping rows without a usable year.
    pub(crate) fn from_raw(rows: impl IntoIterator<Item = RawEvent>, has_geolocation: bool) -> Self {
        let mut dropped = 0usize;
        let events: Vec<Event> = rows
            .into_iter()
            .filter_map(|raw| {
                let event = raw.normalize();
                if event.is_none() {
                    dropped += 1;
                }
                event
            })
            .collect();

        if dropped > 0 {
            warn!(dropped, "skipped rows without a readable year");
        }
        info!(rows = events.len(), has_geolocation, "event table built");

        Self::new(events, has_geolocation)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Whether the source carried latitude/longitude columns at all.
    pub fn has_geolocation(&self) -> bool {
        self.has_geolocation
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Process-scoped handle to the event table.
///
/// The first call to [`EventStore::table`] runs the source load; every later
/// call returns the same table. There is no invalidation.
pub struct EventStore {
    source: DataSource,
    table: OnceCell<EventTable>,
}

impl EventStore {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            table: OnceCell::new(),
        }
    }

    /// Store over an already built table (tests, benches).
    pub fn preloaded(table: EventTable) -> Self {
        Self {
            source: DataSource::Preloaded,
            table: OnceCell::from(table),
        }
    }

    /// The cached table, loading it on first access.
    pub fn table(&self) -> Result<&EventTable, LoadError> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let table = self.source.load()?;
        Ok(self.table.get_or_init(|| table))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal event used across the crate's tests.
    pub fn event(year: i32, group: &str, country: &str, attack_type: &str, fatalities: u32) -> Event {
        Event {
            year,
            group: Some(group.to_owned()),
            country: Some(country.to_owned()),
            city: Some(format!("{country}-city")),
            attack_type: Some(attack_type.to_owned()),
            fatalities,
            wounded: 0,
            summary: String::new(),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn null_casualties_become_zero() {
        let raw = RawEvent {
            year: Some(1999.0),
            group: Some("A".into()),
            ..RawEvent::default()
        };
        let event = raw.normalize().unwrap();
        assert_eq!(event.fatalities, 0);
        assert_eq!(event.wounded, 0);
        assert_eq!(event.summary, "");
    }

    #[test]
    fn fractional_and_negative_counts_are_sanitized() {
        let raw = RawEvent {
            year: Some(2004.0),
            fatalities: Some(12.7),
            wounded: Some(-3.0),
            ..RawEvent::default()
        };
        let event = raw.normalize().unwrap();
        assert_eq!(event.fatalities, 12);
        assert_eq!(event.wounded, 0);
    }

    #[test]
    fn year_is_truncated_to_integer() {
        let raw = RawEvent {
            year: Some(2001.0),
            ..RawEvent::default()
        };
        assert_eq!(raw.normalize().unwrap().year, 2001);
    }

    #[test]
    fn rows_without_year_are_dropped() {
        let rows = vec![
            RawEvent {
                year: None,
                ..RawEvent::default()
            },
            RawEvent {
                year: Some(f64::NAN),
                ..RawEvent::default()
            },
            RawEvent {
                year: Some(1980.0),
                ..RawEvent::default()
            },
        ];
        let table = EventTable::from_raw(rows, false);
        assert_eq!(table.len(), 1);
        assert_eq!(table.events()[0].year, 1980);
    }

    #[test]
    fn out_of_range_years_are_dropped() {
        let rows = [3.0e10, -3.0e10, 2000.0].map(|year| RawEvent {
            year: Some(year),
            ..RawEvent::default()
        });
        let table = EventTable::from_raw(rows, false);
        assert_eq!(table.len(), 1);
        assert_eq!(table.events()[0].year, 2000);
    }

    #[test]
    fn blank_text_is_absent() {
        let raw = RawEvent {
            year: Some(1990.0),
            group: Some("  ".into()),
            country: Some("Peru".into()),
            ..RawEvent::default()
        };
        let event = raw.normalize().unwrap();
        assert_eq!(event.group, None);
        assert_eq!(event.country.as_deref(), Some("Peru"));
    }

    #[test]
    fn coordinates_need_both_values() {
        let mut e = event(2000, "A", "X", "bombing", 1);
        assert_eq!(e.coordinates(), None);
        e.latitude = Some(10.0);
        assert_eq!(e.coordinates(), None);
        e.longitude = Some(20.0);
        assert_eq!(e.coordinates(), Some((20.0, 10.0)));
    }

    #[test]
    fn store_returns_the_same_table() {
        let table = EventTable::new(vec![event(2000, "A", "X", "bombing", 1)], false);
        let store = EventStore::preloaded(table);
        let first = store.table().unwrap() as *const EventTable;
        let second = store.table().unwrap() as *const EventTable;
        assert_eq!(first, second);
    }

    #[test]
    fn store_loads_lazily_from_source() {
        let csv = "year,group,country,city,attack_type,fatalities,wounded\n2001,A,X,x1,bombing,5,0\n";
        let path = std::env::temp_dir().join(format!("terrorgraph-store-{}.csv", std::process::id()));
        std::fs::write(&path, csv).unwrap();

        let store = EventStore::new(DataSource::Csv(CsvSource::new(&path)));
        assert_eq!(store.table().unwrap().len(), 1);
        std::fs::remove_file(&path).unwrap();
        // Cached: the file is gone but the table is still served.
        assert_eq!(store.table().unwrap().len(), 1);
    }
}
