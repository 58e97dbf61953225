//! CSV product report

use crate::output::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Header of the report file
pub const REPORT_HEADER: [&str; 2] = ["Domain", "Product_URL"];

/// One unique product URL and the host it lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Domain")]
    pub domain: String,

    #[serde(rename = "Product_URL")]
    pub product_url: String,
}

/// Writes the report, replacing any previous file
///
/// The rows are written to a sibling temporary file that is renamed over
/// the target, so readers never see a half-written report. Parent
/// directories are created as needed. The header is written even when
/// there are no rows.
///
/// # Arguments
///
/// * `path` - Destination CSV path
/// * `rows` - Deduplicated product rows
///
/// # Returns
///
/// * `Ok(())` - Report written
/// * `Err(ReportError)` - The file could not be created or written
pub fn write_report(path: &Path, rows: &[ReportRow]) -> ReportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    {
        let file = std::fs::File::create(&tmp)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(REPORT_HEADER)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        ReportError::Io(e)
    })?;

    tracing::info!("Wrote {} product URLs to {}", rows.len(), path.display());
    Ok(())
}

/// Reads a report written by [`write_report`]
pub fn read_report(path: &Path) -> ReportResult<Vec<ReportRow>> {
    let mut reader = csv::ReaderBuilder::new().from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<ReportRow>, csv::Error>>()?;
    Ok(rows)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
