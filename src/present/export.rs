use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ExportError;
use crate::filter::FilteredView;

pub const EXPORT_FILE_NAME: &str = "filtered_terror_data.csv";
pub const EXPORT_MIME: &str = "text/csv";

const BASE_COLUMNS: [&str; 8] = [
    "year",
    "group",
    "country",
    "city",
    "attack_type",
    "fatalities",
    "wounded",
    "summary",
];

/// Header row; coordinates only when the source had them.
pub fn export_columns(has_geolocation: bool) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    if has_geolocation {
        columns.extend(["latitude", "longitude"]);
    }
    columns
}

/// Encode the view as UTF-8 CSV with a header row.
pub fn export_csv(view: &FilteredView<'_>) -> Result<Vec<u8>, ExportError> {
    let geo = view.has_geolocation();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(export_columns(geo))?;

    let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for e in view.iter() {
        let mut record = vec![
            e.year.to_string(),
            e.group.clone().unwrap_or_default(),
            e.country.clone().unwrap_or_default(),
            e.city.clone().unwrap_or_default(),
            e.attack_type.clone().unwrap_or_default(),
            e.fatalities.to_string(),
            e.wounded.to_string(),
            e.summary.clone(),
        ];
        if geo {
            record.push(opt(e.latitude));
            record.push(opt(e.longitude));
        }
        writer.write_record(&record)?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Write the export into `dir`, returning the file path.
pub fn write_export(view: &FilteredView<'_>, dir: &Path) -> Result<PathBuf, ExportError> {
    let bytes = export_csv(view)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, &bytes)?;
    info!(
        path = %path.display(),
        rows = view.len(),
        bytes = bytes.len(),
        mime = EXPORT_MIME,
        "exported filtered events"
    );
    Ok(path)
}
