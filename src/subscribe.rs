//! Local subscriber list kept in `subscribers.json`.
//!
//! Purely a convenience list: addresses are trimmed and de-duplicated, not
//! validated. Delivery is handled elsewhere.

use crate::error::DigestResult;
use crate::outputs::write_replacing;
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

pub const SUBSCRIBERS_FILE: &str = "subscribers.json";
pub const SUBSCRIBED_MESSAGE: &str = "✅ Thanks — you are subscribed!";

#[derive(Debug, Default)]
pub struct SubscriberList {
    path: PathBuf,
    emails: Vec<String>,
}

impl SubscriberList {
    /// Load the list from `data_dir`.
    ///
    /// A missing file starts an empty list. Any other read failure, or a
    /// file that is not a JSON array of strings, is an error so that a
    /// later [`save`](Self::save) cannot overwrite existing subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::DigestError::Io`] or
    /// [`crate::error::DigestError::Json`].
    #[instrument(level = "debug")]
    pub async fn load(data_dir: &str) -> DigestResult<Self> {
        let path = Path::new(data_dir).join(SUBSCRIBERS_FILE);
        let emails = match fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No subscriber list yet");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, emails })
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    /// Add `email` unless already present. Returns whether the list changed.
    pub fn add(&mut self, email: &str) -> bool {
        let email = email.trim();
        if email.is_empty() || self.emails.iter().any(|e| e == email) {
            return false;
        }
        self.emails.push(email.to_string());
        true
    }

    pub async fn save(&self) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.emails)?;
        write_replacing(&self.path, json.as_bytes()).await?;
        info!(path = %self.path.display(), count = self.emails.len(), "Saved subscriber list");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestError;

    #[tokio::test]
    async fn test_subscribing_twice_keeps_one_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();

        let mut list = SubscriberList::load(dir).await.unwrap();
        assert!(list.add("reader@example.com"));
        list.save().await.unwrap();

        let mut list = SubscriberList::load(dir).await.unwrap();
        assert!(!list.add(" reader@example.com "));
        list.save().await.unwrap();

        let list = SubscriberList::load(dir).await.unwrap();
        assert_eq!(list.emails(), ["reader@example.com".to_string()]);
    }

    #[test]
    fn test_blank_email_ignored() {
        let mut list = SubscriberList::default();
        assert!(!list.add("   "));
        assert!(list.emails().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_list_is_an_error_and_left_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SUBSCRIBERS_FILE);
        let seeded = r#"["a@x.com", "b@x.com",]"#;
        std::fs::write(&path, seeded).unwrap();

        let result = SubscriberList::load(tmp.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(DigestError::Json(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), seeded);
    }

    #[tokio::test]
    async fn test_unreadable_list_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(SUBSCRIBERS_FILE), [0xffu8, 0xfe, 0x00]).unwrap();

        let result = SubscriberList::load(tmp.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(DigestError::Io(_))));
    }

    #[tokio::test]
    async fn test_missing_list_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let list = SubscriberList::load(tmp.path().to_str().unwrap()).await.unwrap();
        assert!(list.emails().is_empty());
    }
}
