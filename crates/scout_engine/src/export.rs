use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use scout_core::{dedupe_for_export, Item, Platform, UNKNOWN};
use scout_logging::scout_info;

use crate::persist::{AtomicFileWriter, PersistError};

const BOM: &str = "\u{FEFF}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub dropped_duplicates: usize,
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer error: {0}")]
    Buffer(String),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

fn header(platform: Platform) -> Vec<&'static str> {
    if platform.has_engagement_fields() {
        vec!["标题", "价格", "店铺", "销量", "好评率", "链接"]
    } else {
        vec!["标题", "价格", "店铺", "链接"]
    }
}

fn row(item: &Item, platform: Platform) -> Vec<&str> {
    let mut row = vec![item.title.as_str(), item.price.as_str(), item.shop.as_str()];
    if platform.has_engagement_fields() {
        row.push(item.sales.as_deref().unwrap_or(UNKNOWN));
        row.push(item.rating.as_deref().unwrap_or(UNKNOWN));
    }
    row.push(item.link.as_str());
    row
}

/// The CSV document for `items` after a fresh uniqueness pass: UTF-8 with a
/// BOM, every field quoted. Returns the text and the number of rows.
pub fn render_csv(items: &[Item], platform: Platform) -> Result<(String, usize), ExportError> {
    let unique = dedupe_for_export(items, platform);
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(header(platform))?;
    for item in &unique {
        writer.write_record(row(item, platform))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|err| ExportError::Buffer(err.to_string()))?;
    Ok((format!("{BOM}{body}"), unique.len()))
}

pub fn export_filename(platform: Platform, unix_millis: u128) -> String {
    format!("{}_{}.csv", platform.as_str(), unix_millis)
}

/// Renders `items` and writes them atomically to `dir/filename`.
pub fn write_csv(
    dir: &Path,
    filename: &str,
    items: &[Item],
    platform: Platform,
) -> Result<ExportSummary, ExportError> {
    let (csv, rows) = render_csv(items, platform)?;
    let path = AtomicFileWriter::new(dir).write(filename, csv.as_bytes())?;
    let dropped_duplicates = items.len() - rows;
    scout_info!(
        "Exported {} unique items (filtered from {}) to {}",
        rows,
        items.len(),
        path.display()
    );
    Ok(ExportSummary {
        rows,
        dropped_duplicates,
        path,
    })
}
