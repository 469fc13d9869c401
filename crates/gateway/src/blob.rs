//! Blob storage boundary.
//!
//! The engine only requires that a successful upload yields a stable
//! reference and a failed one leaves no partial state. Download access goes
//! through short-lived signed URLs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use traverse_core::{StorageRef, Time, UploadFile};
use super::auth::{with_auth_retry, AuthProvider};
use super::{GatewayError, Result};

/// A time-limited download link for a stored artifact.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SignedUrl {
    /// The download URL
    pub url: String,

    /// When the link stops working
    pub expires_at: Time,
}

/// Opaque artifact store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a file, returning a stable reference. All-or-nothing: an error
    /// means nothing was stored.
    async fn put(&self, file: &UploadFile) -> Result<StorageRef>;

    /// Produce a signed download URL for a stored artifact.
    async fn signed_url(&self, storage_ref: &StorageRef) -> Result<SignedUrl>;
}

/// HTTP-backed blob store speaking to the platform's upload service.
pub struct HttpBlobStore {
    base_url: String,
    client: reqwest::Client,
    auth: Arc<dyn AuthProvider>,
}

impl HttpBlobStore {
    /// Create a store against a base URL, e.g. `https://api.example.com/v1/blobs`.
    pub fn new(base_url: impl Into<String>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            auth,
        }
    }
}

#[derive(serde::Deserialize)]
struct PutResponse {
    storage_ref: String,
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, file: &UploadFile) -> Result<StorageRef> {
        let url = format!("{}/objects", self.base_url);
        let response = with_auth_retry(self.auth.as_ref(), |token| {
            let request = self
                .client
                .post(&url)
                .bearer_auth(token)
                .header("x-file-name", &file.name)
                .header(reqwest::header::CONTENT_TYPE, &file.content_type)
                .body(file.bytes.clone());
            async move {
                let response = request.send().await?;
                if response.status() == reqwest::StatusCode::UNAUTHORIZED {
                    return Err(GatewayError::Unauthenticated);
                }
                let response = response
                    .error_for_status()
                    .map_err(|e| GatewayError::Transport(e.to_string()))?;
                Ok(response.json::<PutResponse>().await?)
            }
        })
        .await?;

        tracing::info!("Stored artifact {} as {}", file.name, response.storage_ref);
        Ok(StorageRef(response.storage_ref))
    }

    async fn signed_url(&self, storage_ref: &StorageRef) -> Result<SignedUrl> {
        let url = format!("{}/objects/{}/signed-url", self.base_url, storage_ref);
        let signed = with_auth_retry(self.auth.as_ref(), |token| {
            let request = self.client.get(&url).bearer_auth(token);
            async move {
                let response = request.send().await?;
                match response.status() {
                    reqwest::StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthenticated),
                    reqwest::StatusCode::NOT_FOUND => {
                        Err(GatewayError::UnknownRef(String::new()))
                    }
                    _ => {
                        let response = response
                            .error_for_status()
                            .map_err(|e| GatewayError::Transport(e.to_string()))?;
                        Ok(response.json::<SignedUrl>().await?)
                    }
                }
            }
        })
        .await
        .map_err(|e| match e {
            GatewayError::UnknownRef(_) => GatewayError::UnknownRef(storage_ref.to_string()),
            other => other,
        })?;

        Ok(signed)
    }
}

/// Blob store writing artifacts to a local directory.
///
/// Backs single-machine deployments and the CLI; the storage ref is the
/// file path relative to the root.
pub struct FsBlobStore {
    root: std::path::PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at a directory, creating it if needed.
    pub async fn new(root: impl AsRef<std::path::Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, file: &UploadFile) -> Result<StorageRef> {
        let key = format!("{}-{}", ulid::Ulid::new(), file.name);
        let path = self.root.join(&key);
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(StorageRef(key))
    }

    async fn signed_url(&self, storage_ref: &StorageRef) -> Result<SignedUrl> {
        let path = self.root.join(&storage_ref.0);
        if !path.exists() {
            return Err(GatewayError::UnknownRef(storage_ref.to_string()));
        }
        Ok(SignedUrl {
            url: format!("file://{}", path.display()),
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(15),
        })
    }
}

/// In-memory blob store for tests and offline use.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts: bool,
}

impl MemoryBlobStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every `put` fails with a transport error, for
    /// exercising failure paths.
    pub fn failing() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_puts: true,
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    /// Whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, file: &UploadFile) -> Result<StorageRef> {
        if self.fail_puts {
            return Err(GatewayError::Transport("simulated outage".to_string()));
        }
        let key = format!("mem://{}/{}", ulid::Ulid::new(), file.name);
        self.objects.lock().await.insert(key.clone(), file.bytes.clone());
        Ok(StorageRef(key))
    }

    async fn signed_url(&self, storage_ref: &StorageRef) -> Result<SignedUrl> {
        let objects = self.objects.lock().await;
        if !objects.contains_key(&storage_ref.0) {
            return Err(GatewayError::UnknownRef(storage_ref.to_string()));
        }
        Ok(SignedUrl {
            url: format!("{}?signature=test", storage_ref),
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(15),
        })
    }
}
