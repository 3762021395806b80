//! Append-only audit trail.
//!
//! Each request appends its records in a single call. Sinks must make that
//! batch visible all at once: lines from concurrent requests may interleave
//! between batches, never within one.
//!
//! Records are written as JSON lines:
//!
//! ```json
//! {"ts":"2026-03-02T10:00:00Z","event":"shown","keywords":["midterm"],"question_id":"q1","session_id":"…","rank":1,"user_id":"u42"}
//! {"ts":"2026-03-02T10:00:05Z","event":"feedback","raw":"Partial,…,1","rating":"Partial","session_id":"…","rank":1}
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::models::AuditRecord;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, records: &[AuditRecord]) -> Result<()>;
}

#[derive(Serialize)]
struct Line<'a> {
    ts: String,
    #[serde(flatten)]
    record: &'a AuditRecord,
}

/// Serializes `records` into one newline-terminated JSON line each.
pub fn format_lines(records: &[AuditRecord]) -> Result<String> {
    let ts = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(&Line {
            ts: ts.clone(),
            record,
        })?);
        out.push('\n');
    }
    Ok(out)
}

/// Appends JSON lines to a file.
pub struct FileAuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditLog {
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open audit log: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileAuditLog {
    async fn append(&self, records: &[AuditRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let lines = format_lines(records)?;
        let mut file = self.file.lock().await;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Emits each batch as a single `info` event on the `forum_archive::audit`
/// target.
pub struct TracingAuditLog;

#[async_trait]
impl AuditSink for TracingAuditLog {
    async fn append(&self, records: &[AuditRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let lines = format_lines(records)?;
        tracing::info!(target: "forum_archive::audit", "\n{}", lines.trim_end());
        Ok(())
    }
}

/// Keeps batches in memory, for tests and embedding.
#[derive(Default)]
pub struct MemoryAuditLog {
    batches: StdMutex<Vec<Vec<AuditRecord>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every batch appended so far, in order.
    pub fn batches(&self) -> Vec<Vec<AuditRecord>> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, records: &[AuditRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.batches
            .lock()
            .map_err(|_| anyhow::anyhow!("audit log lock poisoned"))?
            .push(records.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditLogEntry, FeedbackEntry};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn shown(qid: &str, rank: u32, session: &str) -> AuditRecord {
        AuditRecord::Shown(AuditLogEntry {
            keywords: vec!["midterm".into()],
            question_id: qid.into(),
            session_id: session.into(),
            rank,
            user_id: "u42".into(),
        })
    }

    #[test]
    fn test_format_lines_one_json_object_per_record() {
        let lines = format_lines(&[
            shown("q1", 1, "s"),
            AuditRecord::Feedback(FeedbackEntry::parse("Partial,s,1")),
        ])
        .unwrap();
        let parsed: Vec<serde_json::Value> = lines
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["event"], "shown");
        assert_eq!(parsed[0]["question_id"], "q1");
        assert_eq!(parsed[0]["keywords"][0], "midterm");
        assert!(parsed[0]["ts"].is_string());
        assert_eq!(parsed[1]["event"], "feedback");
        assert_eq!(parsed[1]["rating"], "Partial");
    }

    #[tokio::test]
    async fn test_file_log_appends_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/audit.jsonl");

        let log = FileAuditLog::open(&path).await.unwrap();
        log.append(&[shown("q1", 1, "a")]).await.unwrap();
        drop(log);
        let log = FileAuditLog::open(&path).await.unwrap();
        log.append(&[shown("q2", 1, "b")]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().contains("\"q1\""));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_do_not_interleave() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.jsonl");
        let log = Arc::new(FileAuditLog::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for s in 0..16 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let session = format!("session-{}", s);
                let batch: Vec<_> = (1..=5).map(|r| shown("q", r, &session)).collect();
                log.append(&batch).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let sessions: Vec<String> = content
            .lines()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).unwrap();
                v["session_id"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(sessions.len(), 80);
        for chunk in sessions.chunks(5) {
            assert!(chunk.iter().all(|s| s == &chunk[0]), "batch interleaved: {:?}", chunk);
        }
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let log = MemoryAuditLog::new();
        log.append(&[]).await.unwrap();
        assert!(log.batches().is_empty());
    }
}
