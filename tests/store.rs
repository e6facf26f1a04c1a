//! Integration tests for the PostgreSQL store adapter.
//!
//! These run against a live database via `#[sqlx::test]`, which provisions an
//! isolated database per test from `DATABASE_URL`.

use futures::TryStreamExt;
use regex::Regex;
use sqlx::PgPool;

use scopebank::filter::DomainFilter;
use scopebank::store::{PgDomainStore, RemovalReport};
use scopebank::validator::{canonicalize, is_valid_domain};

async fn store_with_schema(pool: PgPool) -> PgDomainStore {
    let store = PgDomainStore::new(pool);
    store.init_schema().await.unwrap();
    store
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[sqlx::test]
async fn bulk_insert_is_idempotent(pool: PgPool) {
    let store = store_with_schema(pool).await;
    let batch = names(&["a.example.com", "b.example.com", "c.example.com"]);

    let first = store.bulk_insert(&batch).await.unwrap();
    assert_eq!(first, 3);
    assert_eq!(store.count(None).await.unwrap(), 3);

    let second = store.bulk_insert(&batch).await.unwrap();
    assert_eq!(second, 0);
    assert_eq!(store.count(None).await.unwrap(), 3);
}

#[sqlx::test]
async fn duplicates_inside_one_batch_collapse(pool: PgPool) {
    let store = store_with_schema(pool).await;
    let batch = names(&["dup.example.com", "dup.example.com", "other.example.com"]);

    let inserted = store.bulk_insert(&batch).await.unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(store.count(None).await.unwrap(), 2);
}

#[sqlx::test]
async fn validated_import_scenario_case_folds_and_rejects(pool: PgPool) {
    // Mirrors the ingest path: canonicalize, validate, bulk-load.
    let store = store_with_schema(pool).await;

    let input = ["example.com", "EXAMPLE.com", "*.wild.example.com", "bad-.com"];
    let mut rejected = 0;
    let mut batch = Vec::new();
    for raw in input {
        let name = canonicalize(raw);
        if is_valid_domain(&name) {
            batch.push(name);
        } else {
            rejected += 1;
        }
    }

    store.bulk_insert(&batch).await.unwrap();

    let mut stored: Vec<String> = store.stream(None, true).try_collect().await.unwrap();
    stored.sort();
    assert_eq!(stored, names(&["*.wild.example.com", "example.com"]));
    assert_eq!(rejected, 1);
}

#[sqlx::test]
async fn stream_respects_sort_flag(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store
        .bulk_insert(&names(&["charlie.com", "alpha.com", "bravo.com"]))
        .await
        .unwrap();

    let sorted: Vec<String> = store.stream(None, true).try_collect().await.unwrap();
    assert_eq!(sorted, names(&["alpha.com", "bravo.com", "charlie.com"]));
}

#[sqlx::test]
async fn substring_filter_counts_containment(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store
        .bulk_insert(&names(&[
            "www.dell.com",
            "api.dell.com",
            "dell.net",
            "example.org",
        ]))
        .await
        .unwrap();

    let filter = DomainFilter::Substring(".dell.com".into());
    assert_eq!(store.count(Some(&filter)).await.unwrap(), 2);

    let matched: Vec<String> = store
        .stream(Some(&filter), true)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(matched, names(&["api.dell.com", "www.dell.com"]));
}

#[sqlx::test]
async fn regex_filter_is_subset_of_substring_filter(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store
        .bulk_insert(&names(&["www.dell.com", "api.dell.com", "dell.net"]))
        .await
        .unwrap();

    let substring = DomainFilter::Substring(".dell.com".into());
    let regex = DomainFilter::Regex(Regex::new(r"\.dell\.com$").unwrap());

    let substring_count = store.count(Some(&substring)).await.unwrap();
    let regex_count = store.count(Some(&regex)).await.unwrap();

    assert_eq!(regex_count, 2);
    assert!(regex_count <= substring_count);
}

#[sqlx::test]
async fn failed_batch_rolls_back_whole_without_touching_committed_batches(pool: PgPool) {
    let store = store_with_schema(pool).await;

    // First batch commits normally.
    let first = names(&["committed-a.com", "committed-b.com"]);
    assert_eq!(store.bulk_insert(&first).await.unwrap(), 2);

    // PostgreSQL TEXT rejects NUL bytes, so this batch fails inside COPY
    // after the previous batch's transaction has already committed.
    let second = vec!["would-be-new.com".to_string(), "nul\0name.com".to_string()];
    assert!(store.bulk_insert(&second).await.is_err());

    // Earlier batch intact, failed batch absent in its entirety.
    let mut stored: Vec<String> = store.stream(None, true).try_collect().await.unwrap();
    stored.sort();
    assert_eq!(stored, names(&["committed-a.com", "committed-b.com"]));
    assert_eq!(store.count(None).await.unwrap(), 2);

    // The failed batch can be retried without its poison line and nothing
    // is lost or duplicated.
    let retry = names(&["would-be-new.com"]);
    assert_eq!(store.bulk_insert(&retry).await.unwrap(), 1);
    assert_eq!(store.count(None).await.unwrap(), 3);
}

#[sqlx::test]
async fn delete_reports_removed_and_not_found(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store.bulk_insert(&names(&["keep.com", "gone.com"])).await.unwrap();

    let report = store.delete(&names(&["missing.com"])).await.unwrap();
    assert_eq!(
        report,
        RemovalReport {
            removed: 0,
            not_found: 1
        }
    );

    let before = store.count(None).await.unwrap();
    let report = store.delete(&names(&["gone.com"])).await.unwrap();
    assert_eq!(
        report,
        RemovalReport {
            removed: 1,
            not_found: 0
        }
    );
    assert_eq!(store.count(None).await.unwrap(), before - 1);
}

#[sqlx::test]
async fn delete_counts_duplicate_input_names_once(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store.bulk_insert(&names(&["dup.com"])).await.unwrap();

    let report = store
        .delete(&names(&["dup.com", "dup.com", "nope.com"]))
        .await
        .unwrap();
    assert_eq!(
        report,
        RemovalReport {
            removed: 1,
            not_found: 1
        }
    );
}

#[sqlx::test]
async fn delete_by_substring_filter(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store
        .bulk_insert(&names(&["a.target.com", "b.target.com", "safe.org"]))
        .await
        .unwrap();

    let removed = store
        .delete_by_filter(&DomainFilter::Substring(".target.com".into()))
        .await
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(store.count(None).await.unwrap(), 1);
}

#[sqlx::test]
async fn delete_by_regex_filter(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store
        .bulk_insert(&names(&["api.x.com", "www.x.com", "api.y.com"]))
        .await
        .unwrap();

    let removed = store
        .delete_by_filter(&DomainFilter::Regex(Regex::new(r"^api\.").unwrap()))
        .await
        .unwrap();

    assert_eq!(removed, 2);
    let left: Vec<String> = store.stream(None, false).try_collect().await.unwrap();
    assert_eq!(left, names(&["www.x.com"]));
}

#[sqlx::test]
async fn delete_all_truncates_and_reports_count(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store
        .bulk_insert(&names(&["one.com", "two.com", "three.com"]))
        .await
        .unwrap();

    let removed = store.delete_all().await.unwrap();
    assert_eq!(removed, 3);
    assert_eq!(store.count(None).await.unwrap(), 0);

    // Idempotent on an empty collection.
    assert_eq!(store.delete_all().await.unwrap(), 0);
}

#[sqlx::test]
async fn export_then_reimport_round_trips_membership(pool: PgPool) {
    let store = store_with_schema(pool).await;
    let original = names(&["a.com", "b.com", "*.wild.c.com"]);
    store.bulk_insert(&original).await.unwrap();

    // Text round trip.
    let mut text = Vec::new();
    scopebank::exporter::write_text(&mut text, store.stream(None, false))
        .await
        .unwrap();

    store.delete_all().await.unwrap();
    let reimported: Vec<String> = std::str::from_utf8(&text)
        .unwrap()
        .lines()
        .map(canonicalize)
        .filter(|l| !l.is_empty())
        .collect();
    store.bulk_insert(&reimported).await.unwrap();

    let mut got: Vec<String> = store.stream(None, true).try_collect().await.unwrap();
    let mut want = original.clone();
    got.sort();
    want.sort();
    assert_eq!(got, want);

    // JSON round trip via the envelope's domain list.
    let mut json = Vec::new();
    scopebank::exporter::write_json(&mut json, store.stream(None, false))
        .await
        .unwrap();
    let envelope: scopebank::exporter::ExportEnvelope = serde_json::from_slice(&json).unwrap();
    assert_eq!(envelope.domain_count, 3);

    store.delete_all().await.unwrap();
    store.bulk_insert(&envelope.domains).await.unwrap();
    let mut got: Vec<String> = store.stream(None, true).try_collect().await.unwrap();
    got.sort();
    assert_eq!(got, want);
}

#[sqlx::test]
async fn early_stream_drop_releases_the_cursor(pool: PgPool) {
    let store = store_with_schema(pool).await;
    store
        .bulk_insert(&names(&["a.com", "b.com", "c.com"]))
        .await
        .unwrap();

    {
        let mut stream = store.stream(None, false);
        let first = stream.try_next().await.unwrap();
        assert!(first.is_some());
        // Dropped here with rows still pending.
    }

    // The connection must be reusable afterwards.
    assert_eq!(store.count(None).await.unwrap(), 3);
}
