use std::fmt;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use tokio::fs;
use uuid::Uuid;

use super::store::Session;
use super::{SessionError, FLASH_EXTENSION};
use crate::layout::SiteLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "info" => Some(Severity::Info),
            "success" => Some(Severity::Success),
            "warning" => Some(Severity::Warning),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub text: String,
    pub severity: Severity,
}

impl FlashMessage {
    fn encode(&self) -> String {
        format!("{}\n{}", self.severity, self.text)
    }

    fn decode(raw: &str) -> Self {
        match raw.split_once('\n') {
            Some((tag, text)) => match Severity::parse(tag) {
                Some(severity) => FlashMessage {
                    text: text.to_string(),
                    severity,
                },
                None => FlashMessage {
                    text: raw.to_string(),
                    severity: Severity::Info,
                },
            },
            None => FlashMessage {
                text: raw.to_string(),
                severity: Severity::Info,
            },
        }
    }
}

/// One-shot status messages attached to a session.
#[derive(Debug, Clone)]
pub struct FlashChannel {
    layout: SiteLayout,
}

impl FlashChannel {
    pub fn new(layout: SiteLayout) -> Self {
        Self { layout }
    }

    fn flash_path(&self, token: &str) -> PathBuf {
        self.layout
            .work_dir()
            .join(format!("{}.{}", token, FLASH_EXTENSION))
    }

    /// Replace the session's pending message.
    pub async fn set(
        &self,
        session: &Session,
        text: &str,
        severity: Severity,
    ) -> Result<(), SessionError> {
        let path = self.flash_path(&session.token);
        let staging = path.with_extension(format!("{}.{}.tmp", FLASH_EXTENSION, Uuid::new_v4()));
        let message = FlashMessage {
            text: text.to_string(),
            severity,
        };
        fs::write(&staging, message.encode())
            .await
            .map_err(SessionError::io("writing flash message", &staging))?;
        fs::rename(&staging, &path)
            .await
            .map_err(SessionError::io("publishing flash message", &path))?;
        tracing::debug!(%severity, "flash message set");
        Ok(())
    }

    /// Consume the pending message, if any.
    ///
    /// The flash file is first renamed to a private claim name; only one
    /// caller can win that rename, so a message is never delivered twice.
    pub async fn take(&self, session: &Session) -> Result<Option<FlashMessage>, SessionError> {
        let path = self.flash_path(&session.token);
        let claim = path.with_extension(format!("{}.{}.taken", FLASH_EXTENSION, Uuid::new_v4()));
        match fs::rename(&path, &claim).await {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionError::io("claiming flash message", &path)(e)),
        }

        let raw = fs::read_to_string(&claim)
            .await
            .map_err(SessionError::io("reading flash message", &claim));
        if let Err(e) = fs::remove_file(&claim).await {
            tracing::warn!(path = %claim.display(), "failed to remove consumed flash: {}", e);
        }
        Ok(Some(FlashMessage::decode(&raw?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{sha256_hex, SessionStore};

    async fn setup() -> (SessionStore, Session, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(SiteLayout::new(dir.path()));
        let session = store
            .login("secret", Some(sha256_hex("secret").as_str()))
            .await
            .unwrap()
            .session;
        (store, session, dir)
    }

    #[tokio::test]
    async fn test_take_is_one_shot() {
        let (store, session, _dir) = setup().await;
        store
            .flash()
            .set(&session, "Created file a.md in content", Severity::Success)
            .await
            .unwrap();

        let first = store.flash().take(&session).await.unwrap();
        assert_eq!(
            first,
            Some(FlashMessage {
                text: "Created file a.md in content".to_string(),
                severity: Severity::Success,
            })
        );
        assert_eq!(store.flash().take(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_pending_message() {
        let (store, session, _dir) = setup().await;
        store.flash().set(&session, "first", Severity::Info).await.unwrap();
        store
            .flash()
            .set(&session, "second\nwith two lines", Severity::Warning)
            .await
            .unwrap();

        let msg = store.flash().take(&session).await.unwrap().unwrap();
        assert_eq!(msg.text, "second\nwith two lines");
        assert_eq!(msg.severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_concurrent_takes_deliver_once() {
        let (store, session, _dir) = setup().await;
        store.flash().set(&session, "only once", Severity::Info).await.unwrap();

        let takers = (0..8).map(|_| {
            let store = store.clone();
            let session = session.clone();
            tokio::spawn(async move { store.flash().take(&session).await.unwrap() })
        });
        let results = futures::future::join_all(takers).await;
        let delivered = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Some(_))))
            .count();
        assert_eq!(delivered, 1);
    }

    #[test]
    fn test_decode_untagged_content() {
        let msg = FlashMessage::decode("legacy message");
        assert_eq!(msg.severity, Severity::Info);
        assert_eq!(msg.text, "legacy message");
    }
}
