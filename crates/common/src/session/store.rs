use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use rand::distr::{Alphanumeric, SampleString};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::flash::{FlashChannel, Severity};
use super::{is_well_formed_token, SessionError, FLASH_EXTENSION, SESSION_EXTENSION};
use crate::layout::SiteLayout;

const TOKEN_LENGTH: usize = 32;

pub const PLAINTEXT_PASSWORD_ADVISORY: &str = "The admin password in wmk_admin.yaml is stored in plaintext. \
For increased security, replace it with its SHA-256 hex digest (see `site-admin hash-password`).";

/// An authenticated operator session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    /// Set when the login succeeded but the configuration deserves attention;
    /// the same text is already queued as the session's flash message.
    pub advisory: Option<String>,
}

/// Issues, validates and revokes sessions backed by marker files.
#[derive(Debug, Clone)]
pub struct SessionStore {
    layout: SiteLayout,
    flash: FlashChannel,
}

impl SessionStore {
    pub fn new(layout: SiteLayout) -> Self {
        let flash = FlashChannel::new(layout.clone());
        Self { layout, flash }
    }

    pub fn flash(&self) -> &FlashChannel {
        &self.flash
    }

    pub fn cookie_name(&self) -> &str {
        self.layout.cookie_name()
    }

    fn marker_path(&self, token: &str) -> PathBuf {
        self.layout
            .work_dir()
            .join(format!("{}.{}", token, SESSION_EXTENSION))
    }

    /// Check `submitted` against the configured credential and open a session.
    ///
    /// The configured credential is either a lowercase SHA-256 hex digest or
    /// plaintext; plaintext still logs in but queues an advisory flash.
    #[tracing::instrument(skip_all)]
    pub async fn login(
        &self,
        submitted: &str,
        configured: Option<&str>,
    ) -> Result<LoginOutcome, SessionError> {
        let configured = configured
            .filter(|c| !c.is_empty())
            .ok_or(SessionError::ConfigMissing)?;

        let hashed = is_sha256_hex(configured);
        let matches = if hashed {
            constant_time_eq(sha256_hex(submitted).as_bytes(), configured.as_bytes())
        } else {
            constant_time_eq(submitted.as_bytes(), configured.as_bytes())
        };
        if !matches {
            tracing::warn!("rejected login attempt");
            return Err(SessionError::BadCredentials);
        }

        let session = self.open().await?;
        let advisory = if hashed {
            None
        } else {
            let text = PLAINTEXT_PASSWORD_ADVISORY.to_string();
            self.flash.set(&session, &text, Severity::Warning).await?;
            Some(text)
        };

        tracing::info!(created_at = %session.created_at, "operator logged in");
        Ok(LoginOutcome { session, advisory })
    }

    async fn open(&self) -> Result<Session, SessionError> {
        let work_dir = self.layout.work_dir();
        fs::create_dir_all(&work_dir)
            .await
            .map_err(SessionError::io("creating work dir", &work_dir))?;

        loop {
            let token = Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LENGTH);
            let path = self.marker_path(&token);
            let created_at = Local::now();
            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == IoErrorKind::AlreadyExists => continue,
                Err(e) => return Err(SessionError::io("creating session marker", &path)(e)),
            };
            let marker = format!("{} {}", self.layout.cookie_name(), created_at.to_rfc3339());
            file.write_all(marker.as_bytes())
                .await
                .map_err(SessionError::io("writing session marker", &path))?;
            return Ok(Session { token, created_at });
        }
    }

    /// Look up the session for a cookie value. Absence is the normal
    /// "not logged in" answer, never an error.
    pub async fn validate(&self, token: &str) -> Option<Session> {
        if !is_well_formed_token(token) {
            return None;
        }
        let path = self.marker_path(token);
        let marker = fs::read_to_string(&path).await.ok()?;
        let created_at = marker
            .split_once(' ')
            .and_then(|(_, ts)| DateTime::parse_from_rfc3339(ts.trim()).ok())
            .map(|ts| ts.with_timezone(&Local));
        let created_at = match created_at {
            Some(ts) => ts,
            None => fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
                .map(DateTime::<Local>::from)
                .unwrap_or_else(|_| Local::now()),
        };
        Some(Session {
            token: token.to_string(),
            created_at,
        })
    }

    /// Remove the session marker and any pending flash. Logging out twice is fine.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> Result<(), SessionError> {
        if !is_well_formed_token(token) {
            return Ok(());
        }
        let flash = self
            .layout
            .work_dir()
            .join(format!("{}.{}", token, FLASH_EXTENSION));
        for path in [self.marker_path(token), flash] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == IoErrorKind::NotFound => {}
                Err(e) => return Err(SessionError::io("removing session file", &path)(e)),
            }
        }
        tracing::info!("operator logged out");
        Ok(())
    }
}

pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
