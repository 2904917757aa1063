//! Tests for output archive materialization.

use std::sync::Arc;

use bluesky_common::AdminError;
use storage::{ArtifactStore, ObjectStorage, OutputArchives};
use tempfile::TempDir;
use test_utils::{
    build_archive_with_links, build_output_archive, SeededBucket, BUCKET, OUTPUT_PATH, REQUEST_ID,
    RUN_ID,
};

struct Fixture {
    bucket: SeededBucket,
    storage: Arc<ObjectStorage>,
    outputs: OutputArchives,
    cache_root: TempDir,
}

async fn fixture() -> Fixture {
    let bucket = SeededBucket::with_complete_request().await;
    let storage = Arc::new(ObjectStorage::from_store(bucket.store(), BUCKET));
    let cache_root = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::with_file_cache(
        storage.clone(),
        cache_root.path(),
    ));
    let outputs = OutputArchives::new(artifacts, cache_root.path(), OUTPUT_PATH);
    Fixture {
        bucket,
        storage,
        outputs,
        cache_root,
    }
}

#[tokio::test]
async fn test_unpacked_dir_layout() {
    let f = fixture().await;
    assert_eq!(
        f.outputs.unpacked_dir(REQUEST_ID, RUN_ID),
        f.cache_root
            .path()
            .join(BUCKET)
            .join(OUTPUT_PATH)
            .join(REQUEST_ID)
            .join(RUN_ID)
    );
}

#[tokio::test]
async fn test_list_files_extracts_archive() {
    let f = fixture().await;

    let tree = f.outputs.list_files(REQUEST_ID, RUN_ID).await.unwrap();
    assert_eq!(tree.name, RUN_ID);
    assert_eq!(tree.files, vec!["output.json", "summary.json"]);
    assert_eq!(tree.file_count(), 5);

    let images = tree.dir("images").unwrap();
    assert_eq!(images.files, vec!["legend.png"]);
    assert!(images.dir("hourly").unwrap().dir("100m").is_some());

    // The archive itself is cached next to the unpacked directory.
    let archive = f
        .cache_root
        .path()
        .join(BUCKET)
        .join(OUTPUT_PATH)
        .join(REQUEST_ID)
        .join(format!("{}.tar.gz", RUN_ID));
    assert!(archive.exists());
}

#[tokio::test]
async fn test_extraction_happens_once() {
    let f = fixture().await;

    let first = f.outputs.list_files(REQUEST_ID, RUN_ID).await.unwrap();
    let second = f.outputs.list_files(REQUEST_ID, RUN_ID).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(f.storage.remote_reads(), 1);
}

#[tokio::test]
async fn test_unpacked_dir_reused_after_remote_change() {
    let f = fixture().await;
    f.outputs.materialize(REQUEST_ID, RUN_ID).await.unwrap();

    let key = format!("{}/{}/{}.tar.gz", OUTPUT_PATH, REQUEST_ID, RUN_ID);
    f.bucket
        .put(&key, build_output_archive(RUN_ID, &[("other.txt", &b"new"[..])]))
        .await;

    let tree = f.outputs.list_files(REQUEST_ID, RUN_ID).await.unwrap();
    assert!(!tree.files.contains(&"other.txt".to_string()));
    assert!(tree.files.contains(&"output.json".to_string()));
}

#[tokio::test]
async fn test_read_file_returns_bytes_and_basename() {
    let f = fixture().await;

    let payload = f
        .outputs
        .read_file(REQUEST_ID, RUN_ID, "images/legend.png")
        .await
        .unwrap();
    assert_eq!(payload.name, "legend.png");
    assert_eq!(payload.contents, b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_read_file_rejects_traversal_without_download() {
    let f = fixture().await;

    let err = f
        .outputs
        .read_file(REQUEST_ID, RUN_ID, "../../../status/x")
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(f.storage.remote_reads(), 0);
}

#[tokio::test]
async fn test_missing_archive_is_not_found() {
    let f = fixture().await;

    let err = f
        .outputs
        .list_files(REQUEST_ID, "no-such-run")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::NotFound { .. }));
}

#[tokio::test]
async fn test_archive_without_run_directory_fails() {
    let f = fixture().await;
    let key = format!("{}/{}/odd-run.tar.gz", OUTPUT_PATH, REQUEST_ID);
    f.bucket
        .put(&key, build_output_archive("something-else", &[("a.txt", &b"a"[..])]))
        .await;

    let err = f
        .outputs
        .list_files(REQUEST_ID, "odd-run")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Failed to fetch output file {}", key)
    );
}

#[tokio::test]
async fn test_corrupt_archive_fails_extraction() {
    let f = fixture().await;
    let key = format!("{}/{}/corrupt.tar.gz", OUTPUT_PATH, REQUEST_ID);
    f.bucket.put(&key, "definitely not gzip").await;

    let err = f
        .outputs
        .materialize(REQUEST_ID, "corrupt")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::ExtractionFailed { .. }));
    assert!(!f.outputs.unpacked_dir(REQUEST_ID, "corrupt").exists());
}

#[tokio::test]
async fn test_run_ids_with_archive_suffix_do_not_collide() {
    let f = fixture().await;
    for run_id in ["x", "x.tar.gz"] {
        let key = format!("{}/{}/{}.tar.gz", OUTPUT_PATH, REQUEST_ID, run_id);
        let file_name = format!("from-{}.txt", run_id);
        f.bucket
            .put(
                &key,
                build_output_archive(run_id, &[(file_name.as_str(), &b"data"[..])]),
            )
            .await;
    }

    assert_ne!(
        f.outputs.unpacked_dir(REQUEST_ID, "x"),
        f.outputs.unpacked_dir(REQUEST_ID, "x.tar.gz")
    );
    assert!(f
        .outputs
        .unpacked_dir(REQUEST_ID, "x.tar.gz")
        .ends_with("x.tar.gz"));

    let first = f.outputs.list_files(REQUEST_ID, "x").await.unwrap();
    assert_eq!(first.files, vec!["from-x.txt"]);

    let second = f.outputs.list_files(REQUEST_ID, "x.tar.gz").await.unwrap();
    assert_eq!(second.name, "x.tar.gz");
    assert_eq!(second.files, vec!["from-x.tar.gz.txt"]);
}

#[tokio::test]
async fn test_symlink_entries_are_not_unpacked() {
    let f = fixture().await;
    let outside = TempDir::new().unwrap();
    let secret = outside.path().join("secret.txt");
    std::fs::write(&secret, b"TOP-SECRET").unwrap();

    let key = format!("{}/{}/linked.tar.gz", OUTPUT_PATH, REQUEST_ID);
    let target = secret.to_string_lossy().into_owned();
    f.bucket
        .put(
            &key,
            build_archive_with_links(
                "linked",
                &[("kept.txt", &b"kept"[..])],
                &[("leak.txt", target.as_str())],
            ),
        )
        .await;

    let tree = f.outputs.list_files(REQUEST_ID, "linked").await.unwrap();
    assert_eq!(tree.files, vec!["kept.txt"]);

    let err = f
        .outputs
        .read_file(REQUEST_ID, "linked", "leak.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::NotFound { .. }));

    let kept = f
        .outputs
        .read_file(REQUEST_ID, "linked", "kept.txt")
        .await
        .unwrap();
    assert_eq!(kept.contents, b"kept");
}
