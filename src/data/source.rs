use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use neo4rs::{query, Graph, Row};
use serde::Deserialize;
use tracing::{debug, info};

use super::{EventTable, RawEvent};
use crate::config::{SourceConfig, SourceKind};
use crate::error::{ConnectError, LoadError};

/// The fixed read query against the graph store.
pub const EVENT_QUERY: &str = "MATCH (e:Event)
RETURN
    e.year AS year,
    e.group AS group,
    e.country AS country,
    e.city AS city,
    e.attack_type AS attack_type,
    e.nkill AS fatalities,
    e.nwound AS wounded";

/// Same as [`EVENT_QUERY`] plus node coordinates.
pub const EVENT_QUERY_WITH_GEO: &str = "MATCH (e:Event)
RETURN
    e.year AS year,
    e.group AS group,
    e.country AS country,
    e.city AS city,
    e.attack_type AS attack_type,
    e.nkill AS fatalities,
    e.nwound AS wounded,
    e.latitude AS latitude,
    e.longitude AS longitude";

/// Where the event table is read from.
pub enum DataSource {
    Graph(GraphSource),
    Csv(CsvSource),
    /// Generated demo data.
    Synthetic { rows: usize, seed: u64 },
    /// Table handed in directly; loading yields nothing.
    Preloaded,
}

impl DataSource {
    pub fn from_config(config: &SourceConfig) -> Self {
        match config.kind {
            SourceKind::Neo4j => Self::Graph(GraphSource {
                uri: config.uri.clone(),
                user: config.user.clone(),
                password: config.password.clone(),
                include_geolocation: config.include_geolocation,
                connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            }),
            SourceKind::Csv => Self::Csv(CsvSource::new(&config.csv_path)),
            SourceKind::Demo => Self::Synthetic {
                rows: config.demo_rows,
                seed: config.demo_seed,
            },
        }
    }

    pub fn load(&self) -> Result<EventTable, LoadError> {
        let started = Instant::now();
        let table = match self {
            Self::Graph(source) => source.load()?,
            Self::Csv(source) => source.load()?,
            Self::Synthetic { rows, seed } => super::synthetic_table(*rows, *seed),
            Self::Preloaded => EventTable::default(),
        };
        info!(
            rows = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "event table loaded"
        );
        Ok(table)
    }
}

/// Neo4j connection parameters.
pub struct GraphSource {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub include_geolocation: bool,
    /// Upper bound on connecting plus the reachability probe.
    pub connect_timeout: Duration,
}

impl GraphSource {
    /// Run the fixed query on a throwaway current-thread runtime.
    pub fn load(&self) -> Result<EventTable, LoadError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(LoadError::Runtime)?;
        runtime.block_on(self.fetch())
    }

    fn query_text(&self) -> &'static str {
        if self.include_geolocation {
            EVENT_QUERY_WITH_GEO
        } else {
            EVENT_QUERY
        }
    }

    /// Open the pool and run a trivial query, so reachability failures are
    /// not reported as query failures.
    async fn connect(&self) -> Result<Graph, neo4rs::Error> {
        let graph = Graph::new(self.uri.as_str(), self.user.as_str(), self.password.as_str()).await?;
        let mut probe = graph.execute(query("RETURN 1")).await?;
        while probe.next().await?.is_some() {}
        Ok(graph)
    }

    async fn fetch(&self) -> Result<EventTable, LoadError> {
        let connection = |source: ConnectError| LoadError::Connection {
            uri: self.uri.clone(),
            source,
        };

        info!(
            uri = %self.uri,
            user = %self.user,
            timeout_ms = self.connect_timeout.as_millis() as u64,
            "connecting to graph store"
        );
        // The driver retries refused connections with backoff; cap that here.
        let graph = tokio::time::timeout(self.connect_timeout, self.connect())
            .await
            .map_err(|_| connection(ConnectError::Timeout(self.connect_timeout)))?
            .map_err(|e| connection(ConnectError::Graph(e)))?;

        let mut stream = graph
            .execute(query(self.query_text()))
            .await
            .map_err(LoadError::Query)?;

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(LoadError::Query)? {
            rows.push(raw_from_row(&row));
        }
        debug!(rows = rows.len(), "graph rows fetched");

        Ok(EventTable::from_raw(rows, self.include_geolocation))
    }
}

fn raw_from_row(row: &Row) -> RawEvent {
    RawEvent {
        year: number(row, "year"),
        group: text(row, "group"),
        country: text(row, "country"),
        city: text(row, "city"),
        attack_type: text(row, "attack_type"),
        fatalities: number(row, "fatalities"),
        wounded: number(row, "wounded"),
        summary: None,
        latitude: number(row, "latitude"),
        longitude: number(row, "longitude"),
    }
}

/// Integers, floats and numeric strings all read as a number.
fn number(row: &Row, key: &str) -> Option<f64> {
    if let Ok(Some(value)) = row.get::<Option<f64>>(key) {
        return Some(value);
    }
    row.get::<Option<String>>(key)
        .ok()
        .flatten()
        .and_then(|s| s.trim().parse().ok())
}

fn text(row: &Row, key: &str) -> Option<String> {
    row.get::<Option<String>>(key).ok().flatten()
}

/// A CSV snapshot of the event table.
///
/// Accepts the table's own column names (so exports load back) and the
/// GTD names (`iyear`, `gname`, `country_txt`, `attacktype1_txt`, `nkill`,
/// `nwound`).
pub struct CsvSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "iyear", default, deserialize_with = "csv::invalid_option")]
    year: Option<f64>,
    #[serde(alias = "gname", default)]
    group: Option<String>,
    #[serde(alias = "country_txt", default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(alias = "attacktype1_txt", default)]
    attack_type: Option<String>,
    #[serde(alias = "nkill", default, deserialize_with = "csv::invalid_option")]
    fatalities: Option<f64>,
    #[serde(alias = "nwound", default, deserialize_with = "csv::invalid_option")]
    wounded: Option<f64>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    longitude: Option<f64>,
}

impl From<CsvRecord> for RawEvent {
    fn from(record: CsvRecord) -> Self {
        Self {
            year: record.year,
            group: record.group,
            country: record.country,
            city: record.city,
            attack_type: record.attack_type,
            fatalities: record.fatalities,
            wounded: record.wounded,
            summary: record.summary,
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

impl CsvSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<EventTable, LoadError> {
        info!(path = %self.path.display(), "reading CSV snapshot");
        let file = File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Decode a CSV document with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<EventTable, LoadError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = reader.headers()?.clone();
        let has_geolocation = ["latitude", "longitude"]
            .iter()
            .all(|name| headers.iter().any(|h| h.trim() == *name));

        let mut rows = Vec::new();
        for record in reader.deserialize::<CsvRecord>() {
            rows.push(RawEvent::from(record?));
        }

        Ok(EventTable::from_raw(rows, has_geolocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_native_columns() {
        let csv = "\
year,group,country,city,attack_type,fatalities,wounded,summary
2001,A,X,Xville,bombing,5,2,market blast
2003,A,Y,,bombing,,,
";
        let table = CsvSource::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(!table.has_geolocation());

        let first = &table.events()[0];
        assert_eq!(first.year, 2001);
        assert_eq!(first.group.as_deref(), Some("A"));
        assert_eq!(first.city.as_deref(), Some("Xville"));
        assert_eq!(first.fatalities, 5);
        assert_eq!(first.wounded, 2);
        assert_eq!(first.summary, "market blast");

        let second = &table.events()[1];
        assert_eq!(second.city, None);
        assert_eq!(second.fatalities, 0);
        assert_eq!(second.wounded, 0);
        assert_eq!(second.summary, "");
    }

    #[test]
    fn reads_gtd_column_names() {
        let csv = "\
eventid,iyear,gname,country_txt,city,attacktype1_txt,nkill,nwound,latitude,longitude
1,1970.0,Group One,Peru,Lima,Assassination,1.0,0.0,-12.04,-77.03
2,1971,Group One,Peru,Cusco,Bombing/Explosion,,3,,
";
        let table = CsvSource::from_reader(csv.as_bytes()).unwrap();
        assert!(table.has_geolocation());
        assert_eq!(table.len(), 2);

        let first = &table.events()[0];
        assert_eq!(first.year, 1970);
        assert_eq!(first.group.as_deref(), Some("Group One"));
        assert_eq!(first.country.as_deref(), Some("Peru"));
        assert_eq!(first.attack_type.as_deref(), Some("Assassination"));
        assert_eq!(first.fatalities, 1);
        assert_eq!(first.coordinates(), Some((-77.03, -12.04)));

        let second = &table.events()[1];
        assert_eq!(second.fatalities, 0);
        assert_eq!(second.wounded, 3);
        assert_eq!(second.coordinates(), None);
    }

    #[test]
    fn unparsable_numbers_are_sanitized() {
        let csv = "year,group,fatalities\n1999,A,unknown\n";
        let table = CsvSource::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.events()[0].fatalities, 0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let source = CsvSource::new(Path::new("/nonexistent/terrorgraph/events.csv"));
        assert!(matches!(source.load(), Err(LoadError::Io { .. })));
    }

    #[test]
    fn query_includes_coordinates_only_when_asked() {
        let mut source = GraphSource {
            uri: "neo4j://localhost:7687".into(),
            user: "neo4j".into(),
            password: String::new(),
            include_geolocation: false,
            connect_timeout: Duration::from_secs(10),
        };
        assert!(!source.query_text().contains("latitude"));
        source.include_geolocation = true;
        assert!(source.query_text().contains("e.latitude AS latitude"));
    }

    #[test]
    fn unreachable_graph_fails_fast_as_connection_error() {
        let source = GraphSource {
            uri: "127.0.0.1:1".into(),
            user: "neo4j".into(),
            password: "secret".into(),
            include_geolocation: false,
            connect_timeout: Duration::from_millis(500),
        };
        let started = Instant::now();
        let err = source.load().unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(10), "took {:?}", started.elapsed());
        assert!(matches!(err, LoadError::Connection { .. }), "{err:?}");
        assert!(err.to_string().contains("127.0.0.1:1"));
    }

    #[test]
    fn config_selects_source_kind() {
        let mut config = SourceConfig::default();
        assert!(matches!(DataSource::from_config(&config), DataSource::Graph(_)));
        config.kind = SourceKind::Csv;
        assert!(matches!(DataSource::from_config(&config), DataSource::Csv(_)));
        config.kind = SourceKind::Demo;
        assert!(matches!(
            DataSource::from_config(&config),
            DataSource::Synthetic { rows: 50_000, .. }
        ));
    }
}
