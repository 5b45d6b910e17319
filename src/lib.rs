//! Terminal dashboard over a table of recorded terrorist incidents.
//!
//! Events load once from a Neo4j graph, a CSV snapshot or a synthetic
//! generator. A group selection then narrows the filter domains and the
//! filtered rows feed the metrics, table, yearly chart and braille map.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod map;
pub mod present;
pub mod ui;
