//! Tests for the artifact accessor against an in-memory bucket.

use std::collections::HashSet;
use std::sync::Arc;

use bluesky_common::{AdminError, RunStatus};
use storage::{ArtifactStore, CachePolicy, ObjectStorage};
use tempfile::TempDir;
use test_utils::{SeededBucket, BUCKET, REQUEST_ID, RUN_ID, RUN_LOG};

async fn seeded() -> (SeededBucket, Arc<ObjectStorage>) {
    let bucket = SeededBucket::with_complete_request().await;
    let storage = Arc::new(ObjectStorage::from_store(bucket.store(), BUCKET));
    (bucket, storage)
}

// ============================================================================
// Cache behaviour
// ============================================================================

#[tokio::test]
async fn test_second_fetch_served_from_cache() {
    let (_bucket, storage) = seeded().await;
    let cache_root = TempDir::new().unwrap();
    let artifacts = ArtifactStore::with_file_cache(storage.clone(), cache_root.path());

    let first = artifacts.run_log(REQUEST_ID, RUN_ID).await.unwrap();
    let second = artifacts.run_log(REQUEST_ID, RUN_ID).await.unwrap();

    assert_eq!(storage.remote_reads(), 1);
    assert_eq!(first, second);
    assert_eq!(first.text(), RUN_LOG);
    assert!(cache_root
        .path()
        .join(BUCKET)
        .join("log")
        .join(REQUEST_ID)
        .join(format!("{}.log", RUN_ID))
        .exists());
}

#[tokio::test]
async fn test_cached_object_survives_remote_deletion() {
    let (bucket, storage) = seeded().await;
    let cache_root = TempDir::new().unwrap();
    let artifacts = ArtifactStore::with_file_cache(storage, cache_root.path());

    let key = format!("input/{}/{}-input.json", REQUEST_ID, RUN_ID);
    let before = artifacts.run_input(REQUEST_ID, RUN_ID).await.unwrap();
    bucket.delete(&key).await;
    let after = artifacts.run_input(REQUEST_ID, RUN_ID).await.unwrap();

    assert_eq!(before.contents, after.contents);
    assert_eq!(after.name, format!("{}-input.json", RUN_ID));
}

#[tokio::test]
async fn test_status_never_cached() {
    let (_bucket, storage) = seeded().await;
    let cache_root = TempDir::new().unwrap();
    let artifacts = ArtifactStore::with_file_cache(storage.clone(), cache_root.path());

    artifacts.request_status(REQUEST_ID).await.unwrap();
    artifacts.request_status(REQUEST_ID).await.unwrap();

    assert_eq!(storage.remote_reads(), 2);
    assert!(!cache_root.path().join(BUCKET).join("status").exists());
}

#[tokio::test]
async fn test_without_cache_root_every_fetch_is_remote() {
    let (_bucket, storage) = seeded().await;
    let artifacts = ArtifactStore::new(storage.clone());

    let key = format!("requests/{}.json", REQUEST_ID);
    artifacts.fetch(&key, CachePolicy::ReadWrite).await.unwrap();
    artifacts.fetch(&key, CachePolicy::ReadWrite).await.unwrap();

    assert_eq!(storage.remote_reads(), 2);
}

#[tokio::test]
async fn test_cache_write_failure_is_swallowed() {
    let (_bucket, storage) = seeded().await;
    let cache_root = TempDir::new().unwrap();
    // A plain file where the bucket directory should be makes every write fail.
    std::fs::write(cache_root.path().join(BUCKET), b"in the way").unwrap();
    let artifacts = ArtifactStore::with_file_cache(storage.clone(), cache_root.path());

    let payload = artifacts.bluesky_config(REQUEST_ID).await.unwrap();
    assert_eq!(payload.name, format!("{}-config-bluesky.json", REQUEST_ID));

    artifacts.bluesky_config(REQUEST_ID).await.unwrap();
    assert_eq!(storage.remote_reads(), 2);
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn test_request_status_parsed() {
    let (_bucket, storage) = seeded().await;
    let artifacts = ArtifactStore::new(storage);

    let status = artifacts.request_status(REQUEST_ID).await.unwrap();
    assert_eq!(status.runs.len(), 2);
    assert_eq!(status.run(RUN_ID).unwrap().status, RunStatus::Success);
    assert_eq!(status.run_counts().running, 1);
}

#[tokio::test]
async fn test_missing_status_is_not_found() {
    let (_bucket, storage) = seeded().await;
    let artifacts = ArtifactStore::new(storage);

    let err = artifacts.request_status("no-such-request").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "status/no-such-request-status.json does not exist"
    );
}

#[tokio::test]
async fn test_malformed_status_is_invalid_document() {
    let (bucket, storage) = seeded().await;
    bucket.put("status/broken-status.json", "{not json").await;
    let artifacts = ArtifactStore::new(storage);

    let err = artifacts.request_status("broken").await.unwrap_err();
    assert!(matches!(err, AdminError::InvalidDocument { .. }));
}

#[tokio::test]
async fn test_aws_config_redacted() {
    let (_bucket, storage) = seeded().await;
    let artifacts = ArtifactStore::new(storage);

    let payload = artifacts.bluesky_aws_config(REQUEST_ID).await.unwrap();
    let config: serde_json::Value = serde_json::from_slice(&payload.contents).unwrap();

    assert_eq!(config["ssh_key"], "(removed)");
    assert_eq!(config["aws"]["iam_instance_profile"]["Arn"], "(removed)");
    assert_eq!(config["aws"]["ec2"]["key_pair_name"], "(removed)");
    assert_eq!(config["notifications"]["email"]["password"], "(removed)");
    assert_eq!(config["aws"]["ec2"]["instance_type"], "t2.small");
    assert_eq!(
        config["run_id_format"],
        "{request_id}-{fire_id}-{utc_timestamp}"
    );
}

#[tokio::test]
async fn test_invalid_identifiers_rejected_before_fetch() {
    let (_bucket, storage) = seeded().await;
    let artifacts = ArtifactStore::new(storage.clone());

    let err = artifacts.run_log("../etc", RUN_ID).await.unwrap_err();
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(storage.remote_reads(), 0);
}

// ============================================================================
// Request listing
// ============================================================================

#[tokio::test]
async fn test_list_requests_strips_index_prefix() {
    let (_bucket, storage) = seeded().await;
    let artifacts = ArtifactStore::new(storage);

    let page = artifacts.list_requests(None, 25, None).await.unwrap();
    let ids: Vec<_> = page.requests.iter().map(|r| r.request_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "emissions-request-20200113",
            REQUEST_ID,
            "emissions-request-20200201"
        ]
    );
    assert!(page.next.is_none());
}

#[tokio::test]
async fn test_list_requests_date_prefix() {
    let (_bucket, storage) = seeded().await;
    let artifacts = ArtifactStore::new(storage);

    let page = artifacts
        .list_requests(Some("202001"), 25, None)
        .await
        .unwrap();
    assert_eq!(page.requests.len(), 2);
    assert!(page
        .requests
        .iter()
        .all(|r| r.request_id.starts_with("emissions-request-202001")));
}

#[tokio::test]
async fn test_pages_never_repeat() {
    let (bucket, storage) = seeded().await;
    bucket
        .put_index_entries(&["20200301/a", "20200302/b", "20200303/c", "20200304/d"])
        .await;
    let artifacts = ArtifactStore::new(storage);

    let mut seen = HashSet::new();
    let mut next: Option<String> = None;
    let mut pages = 0;
    loop {
        let page = artifacts
            .list_requests(None, 2, next.as_deref())
            .await
            .unwrap();
        for request in &page.requests {
            assert!(seen.insert(request.request_id.clone()), "repeated {}", request.request_id);
        }
        pages += 1;
        match page.next {
            Some(token) => next = Some(token),
            None => break,
        }
    }

    assert_eq!(seen.len(), 7);
    assert_eq!(pages, 4);
}

#[tokio::test]
async fn test_malformed_continuation_token() {
    let (_bucket, storage) = seeded().await;
    let artifacts = ArtifactStore::new(storage);

    let err = artifacts
        .list_requests(None, 2, Some("%%%"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}
