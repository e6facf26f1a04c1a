//! `remove` — delete domains by name, by list, or by filter.
//!
//! Removal is idempotent: names not present are reported, not errors.

use std::io::BufRead;
use std::path::PathBuf;

use crate::commands::input_reader;
use crate::error::AppError;
use crate::filter::DomainFilter;
use crate::store::PgDomainStore;
use crate::validator::canonicalize;

pub async fn run(
    store: &PgDomainStore,
    domain: Option<String>,
    file: Option<PathBuf>,
    filter: Option<DomainFilter>,
) -> Result<(), AppError> {
    if let Some(f) = filter {
        let removed = store.delete_by_filter(&f).await?;
        println!("Removed {removed} domains matching filter");
        return Ok(());
    }

    let names: Vec<String> = match domain {
        Some(d) => vec![canonicalize(&d)],
        None => {
            let reader = input_reader(file.as_deref())?;
            let mut names = Vec::new();
            for line in reader.lines() {
                let name = canonicalize(&line?);
                if !name.is_empty() {
                    names.push(name);
                }
            }
            names
        }
    };

    let report = store.delete(&names).await?;
    println!(
        "Removed {} domains ({} not found)",
        report.removed, report.not_found
    );
    Ok(())
}
