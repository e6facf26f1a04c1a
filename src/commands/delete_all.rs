//! `delete-all` — truncate the whole collection.
//!
//! Destructive, so it prompts unless `--confirm` is given. Declining (or a
//! non-interactive session without `--confirm`) aborts with a non-zero exit
//! and no changes.

use dialoguer::Confirm;

use crate::error::AppError;
use crate::store::PgDomainStore;

pub async fn run(store: &PgDomainStore, confirm: bool) -> Result<(), AppError> {
    if !confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete ALL stored domains?")
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmed {
            return Err(AppError::ConfirmationRequired);
        }
    }

    let removed = store.delete_all().await?;
    println!("Deleted {removed} domains");
    Ok(())
}
