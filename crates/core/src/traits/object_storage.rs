use crate::error::Result;
use async_trait::async_trait;

/// Object storage: the backing store for ingested media, context files, and
/// review bundles.
#[async_trait]
pub trait ObjectStorageAdapter: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    async fn get_text(&self, bucket: &str, key: &str) -> Result<String>;

    /// Reads raw bytes for a key, used by ingestion to read source media
    /// (images/video) for face detection and audio extraction.
    async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// The public URL for an already-stored key, without re-uploading.
    /// Ingestion's vault-upsert stage (S6) walks existing keys and needs
    /// this to populate `MemoryRecord::file_url` for files it didn't just
    /// `put` itself.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use super::*;
    use crate::RemindError;
    use parking_lot::RwLock;
    use std::collections::HashMap;

    /// An in-memory object store keyed by `(bucket, key)`, used by
    /// ingestion's own tests and by any crate exercising the pipeline
    /// without a live object store.
    #[derive(Default)]
    pub struct InMemoryObjectStore {
        objects: RwLock<HashMap<(String, String), Vec<u8>>>,
        public_base_url: String,
    }

    impl InMemoryObjectStore {
        pub fn new(public_base_url: impl Into<String>) -> Self {
            Self {
                objects: RwLock::new(HashMap::new()),
                public_base_url: public_base_url.into(),
            }
        }
    }

    #[async_trait]
    impl ObjectStorageAdapter for InMemoryObjectStore {
        async fn put(
            &self,
            bucket: &str,
            key: &str,
            bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String> {
            self.objects
                .write()
                .insert((bucket.to_string(), key.to_string()), bytes);
            Ok(format!("{}/{}/{}", self.public_base_url, bucket, key))
        }

        async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
            let mut keys: Vec<String> = self
                .objects
                .read()
                .keys()
                .filter(|(b, k)| b == bucket && k.starts_with(prefix))
                .map(|(_, k)| k.clone())
                .collect();
            keys.sort();
            Ok(keys)
        }

        async fn get_text(&self, bucket: &str, key: &str) -> Result<String> {
            let bytes = self.get_bytes(bucket, key).await?;
            String::from_utf8(bytes)
                .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))
        }

        async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
            self.objects
                .read()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| RemindError::NotFound(key.to_string()))
        }

        fn public_url(&self, bucket: &str, key: &str) -> String {
            format!("{}/{}/{}", self.public_base_url, bucket, key)
        }
    }
}
