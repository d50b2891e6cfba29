//! Media storage. Uploaded photos and voice notes live in an S3-compatible
//! blob container. The database only keeps the canonical object URL; clients
//! always receive a short-lived presigned URL instead.

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::models::entry::TimelineEntry;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid storage endpoint: {0}")]
    Endpoint(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("not a blob URL: {0}")]
    NotBlobUrl(String),

    #[error("presign failed: {0}")]
    Presign(String),
}

/// Container and key addressed by a stored blob URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub container: String,
    pub key: String,
}

/// Parses a path-style blob URL (`{origin}/{container}/{key...}`).
/// Key segments are percent-decoded. Returns `None` when there is no key.
pub fn locate_blob(stored_url: &str) -> Option<BlobLocation> {
    let url = Url::parse(stored_url).ok()?;
    let mut segments = url.path_segments()?;
    let container = segments.next().filter(|c| !c.is_empty())?.to_string();
    let key = segments
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if key.is_empty() {
        return None;
    }
    Some(BlobLocation { container, key })
}

/// Storage key for an upload: `{user_id}/{entry_id}/{file_name}`.
/// Only the final component of the client-supplied file name is kept.
pub fn blob_key(user_id: &str, entry_id: &uuid::Uuid, file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("upload");
    format!("{user_id}/{entry_id}/{base}")
}

fn strip_query(stored_url: &str) -> String {
    match Url::parse(stored_url) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => stored_url.to_string(),
    }
}

#[derive(Clone)]
pub struct MediaStore {
    s3: aws_sdk_s3::Client,
    endpoint: Url,
    bucket: String,
    url_ttl: Duration,
}

impl MediaStore {
    pub fn new(
        s3: aws_sdk_s3::Client,
        endpoint: &str,
        bucket: impl Into<String>,
        url_ttl: Duration,
    ) -> Result<Self, MediaError> {
        let endpoint = Url::parse(endpoint).map_err(|e| MediaError::Endpoint(e.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(MediaError::Endpoint(endpoint.to_string()));
        }
        Ok(Self {
            s3,
            endpoint,
            bucket: bucket.into(),
            url_ttl,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Canonical, unsigned URL of an object in the media container.
    pub fn object_url(&self, key: &str) -> Result<String, MediaError> {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| MediaError::Endpoint(self.endpoint.to_string()))?;
            segments.pop_if_empty();
            segments.push(&self.bucket);
            segments.extend(key.split('/'));
        }
        Ok(url.to_string())
    }

    /// Uploads the bytes and returns the canonical object URL.
    pub async fn upload(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<String, MediaError> {
        let size = body.len();
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        self.object_url(key)
    }

    /// Deletes the object a stored URL points at.
    pub async fn delete_by_url(&self, stored_url: &str) -> Result<(), MediaError> {
        let location =
            locate_blob(stored_url).ok_or_else(|| MediaError::NotBlobUrl(stored_url.to_string()))?;
        self.s3
            .delete_object()
            .bucket(&location.container)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| MediaError::Delete(e.to_string()))?;

        info!("Deleted s3://{}/{}", location.container, location.key);
        Ok(())
    }

    async fn presign_read(&self, key: &str) -> Result<String, MediaError> {
        let presigning =
            PresigningConfig::expires_in(self.url_ttl).map_err(|e| MediaError::Presign(e.to_string()))?;
        let request = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| MediaError::Presign(e.to_string()))?;
        Ok(request.uri().to_string())
    }

    /// Rewrites a stored URL into a read-only signed URL.
    ///
    /// Only URLs inside the configured container are rewritten; anything else
    /// is returned untouched. When signing fails the plain URL (query removed)
    /// is returned.
    pub async fn signed_url(&self, stored_url: &str) -> String {
        let location = match locate_blob(stored_url) {
            Some(loc) if loc.container == self.bucket => loc,
            _ => return stored_url.to_string(),
        };

        match self.presign_read(&location.key).await {
            Ok(signed) => signed,
            Err(e) => {
                warn!("Could not sign media URL for {}: {e}", location.key);
                strip_query(stored_url)
            }
        }
    }

    pub async fn sign_entry(&self, mut entry: TimelineEntry) -> TimelineEntry {
        if let Some(stored) = entry.media_url.take() {
            entry.media_url = Some(self.signed_url(&stored).await);
        }
        entry
    }

    pub async fn sign_entries(&self, entries: Vec<TimelineEntry>) -> Vec<TimelineEntry> {
        let mut signed = Vec::with_capacity(entries.len());
        for entry in entries {
            signed.push(self.sign_entry(entry).await);
        }
        signed
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    pub const ENDPOINT: &str = "http://localhost:9000";

    pub fn store(bucket: &str) -> MediaStore {
        let conf = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test-secret", None, None, "test"))
            .endpoint_url(ENDPOINT)
            .force_path_style(true)
            .build();
        MediaStore::new(
            aws_sdk_s3::Client::from_conf(conf),
            ENDPOINT,
            bucket,
            Duration::from_secs(3600),
        )
        .expect("valid endpoint")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_locate_blob_decodes_key() {
        let loc = locate_blob("http://localhost:9000/timeline-media/ada%40example.com/123/my%20photo.jpg")
            .unwrap();
        assert_eq!(loc.container, "timeline-media");
        assert_eq!(loc.key, "ada@example.com/123/my photo.jpg");
    }

    #[test]
    fn test_locate_blob_ignores_existing_query() {
        let loc = locate_blob("https://acct.blob.core.windows.net/timeline-media/a/b.png?sv=2021&sig=abc")
            .unwrap();
        assert_eq!(loc.key, "a/b.png");
    }

    #[test]
    fn test_locate_blob_requires_key() {
        assert!(locate_blob("http://localhost:9000/timeline-media").is_none());
        assert!(locate_blob("http://localhost:9000/").is_none());
        assert!(locate_blob("not a url").is_none());
    }

    #[test]
    fn test_blob_key_keeps_only_file_name() {
        let id = Uuid::nil();
        assert_eq!(
            blob_key("ada", &id, "../../etc/passwd"),
            format!("ada/{id}/passwd")
        );
        assert_eq!(blob_key("ada", &id, ""), format!("ada/{id}/upload"));
    }

    #[test]
    fn test_object_url_round_trips_through_locate() {
        let store = test_support::store("timeline-media");
        let url = store.object_url("ada@example.com/1/summer trip.jpg").unwrap();
        assert!(url.starts_with("http://localhost:9000/timeline-media/"));
        let loc = locate_blob(&url).unwrap();
        assert_eq!(loc.key, "ada@example.com/1/summer trip.jpg");
    }

    #[tokio::test]
    async fn test_signed_url_for_configured_container() {
        let store = test_support::store("timeline-media");
        let signed = store
            .signed_url("http://localhost:9000/timeline-media/ada/1/photo.jpg")
            .await;
        assert!(signed.starts_with("http://localhost:9000/timeline-media/ada/1/photo.jpg?"));
        assert!(signed.contains("X-Amz-Signature="));
        assert!(signed.contains("X-Amz-Expires=3600"));
    }

    #[tokio::test]
    async fn test_signed_url_leaves_other_containers_alone() {
        let store = test_support::store("timeline-media");
        let foreign = "http://localhost:9000/avatars/ada.png";
        assert_eq!(store.signed_url(foreign).await, foreign);
    }

    #[tokio::test]
    async fn test_signed_url_leaves_unparseable_urls_alone() {
        let store = test_support::store("timeline-media");
        assert_eq!(store.signed_url("relative/path.png").await, "relative/path.png");
    }

    #[test]
    fn test_strip_query_removes_stale_signature() {
        assert_eq!(
            strip_query("http://localhost:9000/timeline-media/a.png?sig=old"),
            "http://localhost:9000/timeline-media/a.png"
        );
    }
}
