use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::{BuildMode, BuildOutcome};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One entry of the audit log. Records are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub duration: Duration,
    pub reason: String,
    pub mode: BuildMode,
    pub outcome: BuildOutcome,
    pub diagnostics: Vec<String>,
}

impl BuildRecord {
    pub fn render(&self) -> String {
        let mut text = format!(
            "\n=====\nRan build. Reason: {}\n[Timing: {} to {}; duration={:.3}s]\n[Mode: {}; Outcome: {}]\n",
            self.reason,
            self.started_at.format(TIMESTAMP_FORMAT),
            self.ended_at.format(TIMESTAMP_FORMAT),
            self.duration.as_secs_f64(),
            self.mode,
            self.outcome,
        );
        for line in &self.diagnostics {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    pub async fn append_to(&self, log: &Path) -> std::io::Result<()> {
        if let Some(parent) = log.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log)
            .await?;
        file.write_all(self.render().as_bytes()).await?;
        file.flush().await
    }
}
