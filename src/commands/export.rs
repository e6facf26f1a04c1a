//! `export` — write stored domains to a file as text or JSON.

use std::fs::File;
use std::io::{BufWriter, ErrorKind};
use std::path::PathBuf;

use crate::error::AppError;
use crate::exporter::{write_json, write_text, ExportFormat};
use crate::filter::DomainFilter;
use crate::store::PgDomainStore;

pub async fn run(
    store: &PgDomainStore,
    file: PathBuf,
    format: ExportFormat,
    filter: Option<DomainFilter>,
    sorted: bool,
) -> Result<(), AppError> {
    let out = File::create(&file).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            // Missing parent directory.
            AppError::FileNotFound { path: file.clone() }
        } else {
            AppError::Io(e)
        }
    })?;
    let writer = BufWriter::with_capacity(1024 * 1024, out);

    let stream = store.stream(filter.as_ref(), sorted);
    let count = match format {
        ExportFormat::Text => write_text(writer, stream).await?,
        ExportFormat::Json => write_json(writer, stream).await?,
    };

    println!("Exported {} domains to {}", count, file.display());
    Ok(())
}
