//! File storage collaborator
//!
//! Listing media lives in an external file store; this service only needs
//! to turn stored file ids into fetchable URLs. Upload mechanics belong to
//! the store itself.

use std::env;

/// Resolves file-storage ids to public URLs
pub trait FileStorage: Send + Sync {
    /// Public URL for a stored file id
    fn media_url(&self, file_id: &str) -> String;
}

/// File storage fronted by an HTTP base URL (CDN or object-store gateway)
#[derive(Debug, Clone)]
pub struct HttpFileStorage {
    base_url: String,
}

impl HttpFileStorage {
    /// Create a new storage resolver with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Create a resolver from the environment
    ///
    /// # Environment Variables
    /// - `MEDIA_BASE_URL`: base URL media ids are resolved against
    ///   (default: "http://localhost:9000/media")
    pub fn from_env() -> Self {
        let base_url = env::var("MEDIA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:9000/media".to_string());
        Self::new(base_url)
    }
}

impl FileStorage for HttpFileStorage {
    fn media_url(&self, file_id: &str) -> String {
        format!("{}/{}", self.base_url, file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url_joins_base_and_id() {
        let storage = HttpFileStorage::new("https://cdn.example.com/media");
        assert_eq!(
            storage.media_url("abc-123.jpg"),
            "https://cdn.example.com/media/abc-123.jpg"
        );
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let storage = HttpFileStorage::new("https://cdn.example.com/media///");
        assert_eq!(
            storage.media_url("x.png"),
            "https://cdn.example.com/media/x.png"
        );
    }
}
