//! `add` — ingest domains from a file or stdin.
//!
//! Lines are trimmed, lowercased, validated (unless `--no-validate`), and
//! bulk-loaded in batches. Invalid lines are counted and skipped, never
//! fatal. If a batch fails mid-import, everything committed so far stays
//! committed and the summary reports how many lines were left unimported.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;

use colored::Colorize;

use crate::commands::input_reader;
use crate::error::AppError;
use crate::store::PgDomainStore;
use crate::validator::{canonicalize, is_valid_domain};

const BATCH_SIZE: usize = 100_000;

pub async fn run(
    store: &PgDomainStore,
    file: Option<PathBuf>,
    validate: bool,
) -> Result<(), AppError> {
    let start = Instant::now();
    let reader = input_reader(file.as_deref())?;

    let mut total = 0u64;
    let mut invalid = 0u64;
    let mut inserted = 0u64;
    let mut batch: Vec<String> = Vec::with_capacity(BATCH_SIZE);

    for line in reader.lines() {
        let line = line?;
        let name = canonicalize(&line);
        if name.is_empty() {
            continue;
        }

        total += 1;

        if validate && !is_valid_domain(&name) {
            invalid += 1;
            tracing::debug!(domain = %name, "rejected by validator");
            continue;
        }

        batch.push(name);

        if batch.len() >= BATCH_SIZE {
            inserted += flush(store, &mut batch, total, invalid, inserted).await?;
        }
    }

    if !batch.is_empty() {
        inserted += flush(store, &mut batch, total, invalid, inserted).await?;
    }

    let valid = total - invalid;
    let duplicates = valid - inserted;
    let duplicate_pct = if valid > 0 {
        duplicates as f64 / valid as f64 * 100.0
    } else {
        0.0
    };

    println!(
        "Processed {} domains: {} new, {} duplicates ({:.2}%) in {:.1}s",
        total,
        inserted.to_string().green(),
        duplicates,
        duplicate_pct,
        start.elapsed().as_secs_f64()
    );
    if invalid > 0 {
        println!("Skipped {} invalid domains", invalid.to_string().yellow());
    }

    if total > 0 && valid == 0 {
        return Err(AppError::InvalidDomain { invalid });
    }

    Ok(())
}

/// Sends one batch to the store. On failure, prints what was already
/// committed and how much input is being abandoned before propagating.
async fn flush(
    store: &PgDomainStore,
    batch: &mut Vec<String>,
    total: u64,
    invalid: u64,
    inserted_so_far: u64,
) -> Result<u64, AppError> {
    match store.bulk_insert(batch).await {
        Ok(n) => {
            batch.clear();
            Ok(n)
        }
        Err(e) => {
            eprintln!(
                "Import aborted after {} lines: {} new domains committed, {} invalid skipped, {} lines in the failed batch were NOT imported",
                total,
                inserted_so_far,
                invalid,
                batch.len()
            );
            Err(e)
        }
    }
}
