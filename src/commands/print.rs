//! `print` — stream stored domains to stdout.

use std::io::{self, BufWriter, ErrorKind};

use crate::error::AppError;
use crate::exporter::write_text;
use crate::filter::DomainFilter;
use crate::store::PgDomainStore;

pub async fn run(
    store: &PgDomainStore,
    filter: Option<DomainFilter>,
    sorted: bool,
) -> Result<(), AppError> {
    let stdout = io::stdout();
    let handle = BufWriter::new(stdout.lock());

    let result = write_text(handle, store.stream(filter.as_ref(), sorted)).await;

    match result {
        Ok(count) => {
            if count == 0 {
                tracing::info!("no domains matched");
            }
            Ok(())
        }
        // A consumer like `head` closing the pipe early is not a failure;
        // dropping the stream has already released the cursor.
        Err(AppError::Io(e)) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e),
    }
}
