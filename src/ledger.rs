use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::warn;

use crate::error::DiscoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub sequence: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<Vec<ErrorRecord>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line breaks inside `message` are folded so each entry is one log line.
    pub fn record(&self, message: impl Into<String>) {
        let message = single_line(&message.into());
        warn!("{message}");
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = entries.len();
        entries.push(ErrorRecord { sequence, message });
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<ErrorRecord> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn write_to(&self, path: &Path) -> Result<(), DiscoError> {
        let entries = self.snapshot();
        let mut content = String::new();
        for entry in &entries {
            content.push_str(&entry.message);
            content.push('\n');
        }
        std::fs::write(path, content).map_err(|err| {
            DiscoError::Filesystem(format!("write {}: {err}", path.display()))
        })
    }
}

fn single_line(message: &str) -> String {
    if !message.contains(['\r', '\n']) {
        return message.to_string();
    }
    message
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
pub struct RunLog {
    file: Mutex<File>,
}

impl RunLog {
    pub fn create(path: &Path) -> Result<Self, DiscoError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| DiscoError::Filesystem(format!("open {}: {err}", path.display())))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn line(&self, message: &str) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let mut buffer = String::with_capacity(message.len() + 1);
        buffer.push_str(message);
        buffer.push('\n');
        if let Err(err) = file.write_all(buffer.as_bytes()) {
            warn!(error = %err, "run log write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_follow_append_order() {
        let log = ErrorLog::new();
        log.record("first");
        log.record("second");
        let entries = log.snapshot();
        assert_eq!(entries[0].sequence, 0);
        assert_eq!(entries[1].message, "second");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn multi_line_messages_are_folded() {
        let log = ErrorLog::new();
        log.record("status 400: {\r\n  \"error\": \"bad\"\n}\n");
        assert_eq!(log.snapshot()[0].message, "status 400: { \"error\": \"bad\" }");
    }
}
