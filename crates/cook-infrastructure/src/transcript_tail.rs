//! Incremental reading of an append-only transcript.

use cook_core::transcript::parse_line;
use cook_core::{CookError, Message, Result};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

/// Cursor over one transcript file.
///
/// The offset only ever advances past complete (newline-terminated) lines, so
/// a record the agent is still writing is picked up whole on a later poll.
#[derive(Debug, Clone)]
pub struct TranscriptTail {
    path: PathBuf,
    offset: u64,
}

impl TranscriptTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// File name for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Reads every complete line present now. Used once, for history.
    pub async fn replay(&mut self) -> Result<Vec<Message>> {
        self.poll().await
    }

    /// Reads the complete lines appended since the last call.
    pub async fn poll(&mut self) -> Result<Vec<Message>> {
        let lines = self.read_complete_lines().await?;
        Ok(lines.iter().filter_map(|line| parse_line(line)).collect())
    }

    async fn read_complete_lines(&mut self) -> Result<Vec<String>> {
        let file = File::open(&self.path).await.map_err(|e| {
            CookError::transcript(format!("{}: {}", self.path.display(), e))
        })?;

        let len = file.metadata().await?.len();
        if len < self.offset {
            // Truncated or replaced underneath us; keep the cursor where it is.
            tracing::warn!(
                path = %self.path.display(),
                len,
                offset = self.offset,
                "Transcript shrank below read offset"
            );
            return Ok(Vec::new());
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(self.offset)).await?;

        // The cursor only moves once the whole batch has been read.
        let mut offset = self.offset;
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).await?;
            if read == 0 || buf.last() != Some(&b'\n') {
                break;
            }
            offset += read as u64;
            let line = String::from_utf8_lossy(&buf);
            if !line.trim().is_empty() {
                lines.push(line.into_owned());
            }
        }

        self.offset = offset;
        Ok(lines)
    }
}

/// Parses the last non-blank line of a transcript.
pub async fn read_last_message(path: &Path) -> Result<Option<Message>> {
    let content = tokio::fs::read(path).await?;
    let content = String::from_utf8_lossy(&content);
    Ok(content
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(parse_line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cook_core::Role;
    use std::io::Write;
    use tempfile::TempDir;

    const USER: &str = r#"{"type":"user","message":{"content":"build X"}}"#;
    const ASSISTANT: &str =
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Done."}]}}"#;

    fn append(path: &Path, text: &str) {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn test_replay_then_poll() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.jsonl");
        append(&path, &format!("{USER}\n{{\"type\":\"summary\"}}\n"));

        let mut tail = TranscriptTail::new(&path);
        let history = tail.replay().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);

        assert!(tail.poll().await.unwrap().is_empty());

        append(&path, &format!("{ASSISTANT}\n"));
        let fresh = tail.poll().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].text, "Done.");
    }

    #[tokio::test]
    async fn test_partial_line_is_not_consumed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.jsonl");
        append(&path, &format!("{USER}\n"));

        let mut tail = TranscriptTail::new(&path);
        tail.replay().await.unwrap();
        let after_history = tail.offset();

        let (head, rest) = ASSISTANT.split_at(20);
        append(&path, head);
        assert!(tail.poll().await.unwrap().is_empty());
        assert_eq!(tail.offset(), after_history);

        append(&path, &format!("{rest}\n"));
        let fresh = tail.poll().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_offset_is_monotonic_across_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.jsonl");
        append(&path, "");

        let mut tail = TranscriptTail::new(&path);
        let mut last = tail.offset();
        let chunks = [
            format!("{USER}\n"),
            "not json at all\n".to_string(),
            ASSISTANT[..10].to_string(),
            format!("{}\n\n", &ASSISTANT[10..]),
            String::new(),
            format!("{USER}\n{ASSISTANT}\n"),
        ];
        for chunk in chunks {
            append(&path, &chunk);
            tail.poll().await.unwrap();
            assert!(tail.offset() >= last);
            last = tail.offset();
        }
        assert_eq!(last, std::fs::metadata(&path).unwrap().len());
    }

    #[tokio::test]
    async fn test_missing_file_is_transcript_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut tail = TranscriptTail::new(temp_dir.path().join("gone.jsonl"));
        assert!(matches!(
            tail.poll().await,
            Err(CookError::Transcript(_))
        ));
        assert_eq!(tail.offset(), 0);
    }

    #[tokio::test]
    async fn test_read_error_leaves_cursor_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("not-a-file.jsonl");
        std::fs::create_dir(&dir).unwrap();

        let mut tail = TranscriptTail::new(&dir);
        assert!(tail.poll().await.is_err());
        assert_eq!(tail.offset(), 0);
    }

    #[tokio::test]
    async fn test_shrunk_transcript_keeps_cursor() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.jsonl");
        append(&path, &format!("{USER}\n{ASSISTANT}\n"));

        let mut tail = TranscriptTail::new(&path);
        assert_eq!(tail.replay().await.unwrap().len(), 2);
        let cursor = tail.offset();

        std::fs::write(&path, "").unwrap();
        assert!(tail.poll().await.unwrap().is_empty());
        assert_eq!(tail.offset(), cursor);

        // Rewritten up to the old cursor, then grown past it.
        append(&path, &format!("{USER}\n{ASSISTANT}\n"));
        assert!(tail.poll().await.unwrap().is_empty());
        append(&path, &format!("{ASSISTANT}\n"));
        let fresh = tail.poll().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].is_assistant());
        assert_eq!(tail.offset(), std::fs::metadata(&path).unwrap().len());
    }

    #[tokio::test]
    async fn test_read_last_message() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.jsonl");
        append(&path, &format!("{USER}\n{ASSISTANT}\n\n"));

        let last = read_last_message(&path).await.unwrap().unwrap();
        assert!(last.is_assistant());
        assert_eq!(last.text, "Done.");

        let empty = temp_dir.path().join("empty.jsonl");
        append(&empty, "");
        assert!(read_last_message(&empty).await.unwrap().is_none());
    }
}
