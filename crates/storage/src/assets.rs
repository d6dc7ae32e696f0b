use anyhow::{anyhow, Result};
use url::Url;

/// Resolves stored image paths to public URLs of the form
/// `<base>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    base_url: Url,
    bucket: String,
}

impl AssetStore {
    pub fn new(base_url: Url, bucket: impl Into<String>) -> Self {
        Self {
            base_url,
            bucket: bucket.into(),
        }
    }

    pub fn public_url(&self, image_path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("asset base url '{}' cannot be a base", self.base_url))?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(
                image_path
                    .trim_start_matches('/')
                    .split('/')
                    .filter(|segment| !segment.is_empty()),
            );
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> AssetStore {
        AssetStore::new(Url::parse(base).expect("url"), "artcast_images")
    }

    #[test]
    fn joins_bucket_and_path() {
        let url = store("https://cdn.example.com/storage/v1/object/public")
            .public_url("roots/sunset.png")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://cdn.example.com/storage/v1/object/public/artcast_images/roots/sunset.png"
        );
    }

    #[test]
    fn tolerates_trailing_and_leading_slashes() {
        let url = store("https://cdn.example.com/public/")
            .public_url("/a.png")
            .expect("url");
        assert_eq!(url.as_str(), "https://cdn.example.com/public/artcast_images/a.png");
    }

    #[test]
    fn encodes_unsafe_characters() {
        let url = store("https://cdn.example.com")
            .public_url("my image.png")
            .expect("url");
        assert_eq!(url.as_str(), "https://cdn.example.com/artcast_images/my%20image.png");
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        assert!(store("mailto:someone@example.com").public_url("a.png").is_err());
    }
}
