//! `count` — print how many stored domains match.

use crate::error::AppError;
use crate::filter::DomainFilter;
use crate::store::PgDomainStore;

pub async fn run(store: &PgDomainStore, filter: Option<DomainFilter>) -> Result<(), AppError> {
    let count = store.count(filter.as_ref()).await?;
    println!("{count}");
    Ok(())
}
