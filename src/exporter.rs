//! Export serialization for domain collections.
//!
//! Text mode writes one domain per line, streamed through the writer as rows
//! arrive. JSON mode emits a single envelope with a count and a timestamp
//! captured at export start; the count precedes the list in the envelope, so
//! JSON collects the filtered set before serializing.

use std::io::Write;

use chrono::Utc;
use clap::ValueEnum;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Text,
    Json,
}

/// JSON export envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub domain_count: usize,
    pub exported_at: String,
    pub domains: Vec<String>,
}

/// Writes domains as newline-delimited text, incrementally. Returns the
/// number of domains written.
pub async fn write_text<W: Write>(
    mut out: W,
    mut domains: BoxStream<'_, Result<String, AppError>>,
) -> Result<u64, AppError> {
    let mut count = 0u64;
    while let Some(name) = domains.try_next().await? {
        writeln!(out, "{name}")?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

/// Writes domains as a JSON envelope. The timestamp is captured before the
/// stream is drained. Returns the number of domains written.
pub async fn write_json<W: Write>(
    mut out: W,
    domains: BoxStream<'_, Result<String, AppError>>,
) -> Result<u64, AppError> {
    let exported_at = Utc::now().to_rfc3339();
    let domains: Vec<String> = domains.try_collect().await?;

    let envelope = ExportEnvelope {
        domain_count: domains.len(),
        exported_at,
        domains,
    };

    serde_json::to_writer_pretty(&mut out, &envelope)
        .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
    writeln!(out)?;
    out.flush()?;
    Ok(envelope.domain_count as u64)
}
