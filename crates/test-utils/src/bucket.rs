//! In-memory buckets seeded with pipeline artifacts.

use bytes::Bytes;
use object_store::{memory::InMemory, path::Path, ObjectStore};
use std::sync::Arc;

use crate::archives::{build_output_archive, sample_output_files};
use crate::fixtures::*;

/// An `InMemory` object store standing in for the pipeline bucket.
#[derive(Clone)]
pub struct SeededBucket {
    store: Arc<InMemory>,
}

impl Default for SeededBucket {
    fn default() -> Self {
        Self::empty()
    }
}

impl SeededBucket {
    /// A bucket with no objects.
    pub fn empty() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
        }
    }

    /// A bucket holding every artifact of [`REQUEST_ID`] / [`RUN_ID`] plus
    /// three request index entries.
    pub async fn with_complete_request() -> Self {
        let bucket = Self::empty();
        let json = |v: serde_json::Value| serde_json::to_vec(&v).expect("serialize fixture");

        bucket
            .put(&format!("status/{}-status.json", REQUEST_ID), json(status_json()))
            .await;
        bucket
            .put(&format!("requests/{}.json", REQUEST_ID), json(request_input_json()))
            .await;
        bucket
            .put(
                &format!("config/{}-config-bluesky.json", REQUEST_ID),
                json(bluesky_config_json()),
            )
            .await;
        bucket
            .put(
                &format!("config/{}-config-bluesky-aws.json", REQUEST_ID),
                json(aws_config_json()),
            )
            .await;
        bucket
            .put(&format!("log/{}/{}.log", REQUEST_ID, RUN_ID), RUN_LOG.as_bytes().to_vec())
            .await;
        bucket
            .put(
                &format!("input/{}/{}-input.json", REQUEST_ID, RUN_ID),
                json(run_input_json()),
            )
            .await;
        bucket
            .put(
                &format!("{}/{}/{}.tar.gz", OUTPUT_PATH, REQUEST_ID, RUN_ID),
                build_output_archive(RUN_ID, &sample_output_files()),
            )
            .await;

        bucket
            .put_index_entries(&[
                "20200113/emissions-request-20200113",
                format!("20200114/{}", REQUEST_ID).as_str(),
                "20200201/emissions-request-20200201",
            ])
            .await;

        bucket
    }

    /// Store `data` at `key`.
    pub async fn put(&self, key: &str, data: impl Into<Bytes>) {
        let data: Bytes = data.into();
        self.store
            .put(&Path::from(key), data.into())
            .await
            .expect("seed object");
    }

    /// Add `request-index/{entry}` objects.
    pub async fn put_index_entries(&self, entries: &[&str]) {
        for entry in entries {
            self.put(&format!("request-index/{}", entry), Bytes::new()).await;
        }
    }

    /// Remove `key` from the bucket.
    pub async fn delete(&self, key: &str) {
        self.store
            .delete(&Path::from(key))
            .await
            .expect("delete object");
    }

    /// The bucket as a trait object for `ObjectStorage::from_store`.
    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }
}
