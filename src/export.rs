// src/export.rs
//! CSV feed of the in-memory batch: `id,subreddit,title,score,sentiment,chain_signal`.

use anyhow::{Context, Result};
use metrics::counter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::record::EnrichedRecord;

pub const CSV_HEADER: [&str; 6] = ["id", "subreddit", "title", "score", "sentiment", "chain_signal"];

/// Write the batch to `path` (overwriting). Returns the number of data rows.
pub fn write_csv(path: &Path, records: &[EnrichedRecord]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating export directory {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("creating export file {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_records(&mut w, records).with_context(|| format!("writing {}", path.display()))?;
    w.flush()?;

    counter!("export_rows_total").increment(records.len() as u64);
    tracing::info!(rows = records.len(), path = %path.display(), "exported batch");
    Ok(records.len())
}

pub fn write_records<W: Write>(w: &mut W, records: &[EnrichedRecord]) -> std::io::Result<()> {
    writeln!(w, "{}", CSV_HEADER.join(","))?;
    for r in records {
        let (id, source, title, score, sentiment, signal) = r.as_tuple();
        writeln!(
            w,
            "{},{},{},{},{},{}",
            escape_field(id),
            escape_field(source),
            escape_field(title),
            score,
            sentiment,
            escape_field(signal)
        )?;
    }
    Ok(())
}

/// RFC 4180 quoting: wrap in quotes when needed, double embedded quotes.
fn escape_field(s: &str) -> std::borrow::Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\"")).into()
    } else {
        s.into()
    }
}
