// Per-cycle decision log, persisted per trigger instance

use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name of the persisted polling log, under the workload's storage root.
pub const POLLING_LOG_FILE_NAME: &str = "scriptTrigger-polling.log";

/// Path of the polling log for a workload rooted at `workload_root`.
pub fn polling_log_path(workload_root: &Path) -> PathBuf {
    workload_root.join(POLLING_LOG_FILE_NAME)
}

/// Append-only decision log for one polling cycle.
///
/// The engine writes one line per `info` call; the caller owns persistence.
/// When opened with a file sink, lines are appended to the per-trigger
/// polling log, which is never truncated by the engine.
pub struct PollLog {
    lines: Vec<String>,
    sink: Option<File>,
}

impl PollLog {
    /// In-memory log with no file sink.
    pub fn in_memory() -> Self {
        Self {
            lines: Vec::new(),
            sink: None,
        }
    }

    /// Log appending to `<workload_root>/scriptTrigger-polling.log`.
    ///
    /// Writes a cycle header so consecutive cycles are separated in the file.
    pub fn open(workload_root: &Path) -> io::Result<Self> {
        let mut sink = OpenOptions::new()
            .create(true)
            .append(true)
            .open(polling_log_path(workload_root))?;
        writeln!(
            sink,
            "Polling started on {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        )?;

        Ok(Self {
            lines: Vec::new(),
            sink: Some(sink),
        })
    }

    /// Append one line to the log.
    pub fn info(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::info!(target: "script_trigger::polling", "{}", message);
        if let Some(sink) = &mut self.sink {
            // Persistence is best-effort; a full disk must not turn a
            // decision into a cycle failure
            let _ = writeln!(sink, "{}", message);
        }
        self.lines.push(message.to_string());
    }

    /// Lines recorded during this cycle, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Script process output is streamed into the poll log line by line.
impl Write for PollLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        for line in text.lines() {
            if !line.is_empty() {
                self.info(line);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(sink) = &mut self.sink {
            sink.flush()?;
        }
        Ok(())
    }
}
