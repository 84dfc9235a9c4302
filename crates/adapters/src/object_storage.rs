use async_trait::async_trait;
use remind_core::traits::ObjectStorageAdapter;
use remind_core::{RemindError, Result};
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Clone)]
pub struct HttpObjectStoreConfig {
    pub endpoint: String,
    pub credentials: Option<String>,
    pub public_base_url: String,
}

/// A REST-fronted object store: `PUT {endpoint}/{bucket}/{key}`, `GET
/// {endpoint}/{bucket}?prefix=`, `GET {endpoint}/{bucket}/{key}`. The
/// concrete backing store is an external collaborator; this adapter only
/// fixes the wire shape ReMind expects of it.
pub struct HttpObjectStorageAdapter {
    client: reqwest::Client,
    config: HttpObjectStoreConfig,
}

impl HttpObjectStorageAdapter {
    pub fn new(client: reqwest::Client, config: HttpObjectStoreConfig) -> Self {
        Self { client, config }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.credentials {
            Some(creds) => builder.bearer_auth(creds),
            None => builder,
        }
    }
}

#[async_trait]
impl ObjectStorageAdapter for HttpObjectStorageAdapter {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!("{}/{}/{}", self.config.endpoint, bucket, key);
        let request = self
            .authed(self.client.put(&url))
            .header("Content-Type", content_type)
            .body(bytes);
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RemindError::ExternalUnavailable(format!(
                "object store returned {}",
                response.status()
            )));
        }
        Ok(format!("{}/{}/{}", self.config.public_base_url, bucket, key))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let url = format!("{}/{}", self.config.endpoint, bucket);
        let request = self.authed(self.client.get(&url)).query(&[("prefix", prefix)]);
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))
    }

    async fn get_text(&self, bucket: &str, key: &str) -> Result<String> {
        let url = format!("{}/{}/{}", self.config.endpoint, bucket, key);
        let request = self.authed(self.client.get(&url));
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RemindError::NotFound(key.to_string()));
        }
        response
            .text()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))
    }

    async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}/{}", self.config.endpoint, bucket, key);
        let request = self.authed(self.client.get(&url));
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RemindError::NotFound(key.to_string()));
        }
        Ok(response
            .bytes()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?
            .to_vec())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.config.public_base_url, bucket, key)
    }
}

/// Filesystem-backed object store for local ingestion runs and tests: each
/// bucket is a directory under `root`, each key a relative path beneath it.
pub struct LocalFsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn path_for(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

#[async_trait]
impl ObjectStorageAdapter for LocalFsObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String> {
        let path = self.path_for(bucket, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        }
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(format!("{}/{}/{}", self.public_base_url, bucket, key))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let dir = self.root.join(bucket);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        let mut stack = vec![dir.clone()];
        while let Some(current) = stack.pop() {
            let mut entries = tokio::fs::read_dir(&current)
                .await
                .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?
            {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&dir) {
                    let key = relative.to_string_lossy().replace('\\', "/");
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn get_text(&self, bucket: &str, key: &str) -> Result<String> {
        let path = self.path_for(bucket, key);
        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|_| RemindError::NotFound(key.to_string()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(contents)
    }

    async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(bucket, key);
        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|_| RemindError::NotFound(key.to_string()))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(contents)
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_fs_store_round_trips_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsObjectStore::new(dir.path(), "https://cdn.example");
        let url = store
            .put("trip", "a.json", b"{}".to_vec(), "application/json")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/trip/a.json");
        let text = store.get_text("trip", "a.json").await.unwrap();
        assert_eq!(text, "{}");
        let keys = store.list("trip", "").await.unwrap();
        assert_eq!(keys, vec!["a.json".to_string()]);
    }
}
