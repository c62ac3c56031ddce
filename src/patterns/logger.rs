//! Named loggers shared through a registry
//!
//! Asking the registry twice for the same name yields the same logger.
//! Messages are prefixed with `Log----->` and handed to a [`LogWriter`].

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::Result;

/// Destination for formatted log lines
pub trait LogWriter: Send + Sync {
    fn write(&self, logger: &str, text: &str) -> Result<()>;
}

/// Forwards lines to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWriter;

impl LogWriter for TracingWriter {
    fn write(&self, logger: &str, text: &str) -> Result<()> {
        tracing::info!(logger, "{}", text);
        Ok(())
    }
}

/// Appends lines to a file, creating parent directories on first write
#[derive(Debug, Clone)]
pub struct FileWriter {
    path: PathBuf,
}

impl FileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for FileWriter {
    fn default() -> Self {
        Self::new(PathBuf::from("logs").join("log.txt"))
    }
}

impl LogWriter for FileWriter {
    fn write(&self, _logger: &str, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", text)?;
        Ok(())
    }
}

pub struct Logger {
    name: String,
    writer: Arc<dyn LogWriter>,
}

impl Logger {
    pub fn new(name: impl Into<String>, writer: Arc<dyn LogWriter>) -> Self {
        Self { name: name.into(), writer }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write one line. A failing writer is reported, never propagated.
    pub fn log(&self, text: &str) {
        let line = format!("Log-----> {}", text);
        if let Err(e) = self.writer.write(&self.name, &line) {
            tracing::warn!(logger = %self.name, "Log writer failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Map from logger name to logger instance
pub struct LoggerRegistry {
    default_writer: Arc<dyn LogWriter>,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    /// Registry whose loggers write through `tracing`
    pub fn new() -> Self {
        Self::with_writer(Arc::new(TracingWriter))
    }

    pub fn with_writer(default_writer: Arc<dyn LogWriter>) -> Self {
        Self {
            default_writer,
            loggers: Mutex::new(HashMap::new()),
        }
    }

    /// The logger registered under `name`, created with the default writer
    /// on first use
    pub fn get(&self, name: &str) -> Arc<Logger> {
        let writer = self.default_writer.clone();
        self.get_or_insert_with(name, writer)
    }

    /// The logger registered under `name`. `writer` is only used when the
    /// logger does not exist yet.
    pub fn get_or_insert_with(&self, name: &str, writer: Arc<dyn LogWriter>) -> Arc<Logger> {
        let mut loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        loggers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Logger::new(name, writer)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry").field("loggers", &self.len()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemoryWriter {
        lines: Mutex<Vec<String>>,
    }

    impl LogWriter for MemoryWriter {
        fn write(&self, _logger: &str, text: &str) -> Result<()> {
            self.lines.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_same_name_returns_same_logger() {
        let registry = LoggerRegistry::new();
        let a = registry.get("views");
        let b = registry.get("views");
        let c = registry.get("engine");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_writer_is_fixed_at_creation() {
        let first = Arc::new(MemoryWriter::default());
        let second = Arc::new(MemoryWriter::default());
        let registry = LoggerRegistry::new();

        registry.get_or_insert_with("views", first.clone()).log("one");
        registry.get_or_insert_with("views", second.clone()).log("two");

        assert_eq!(*first.lines.lock().unwrap(), vec!["Log-----> one", "Log-----> two"]);
        assert!(second.lines.lock().unwrap().is_empty());
    }

    #[test]
    fn test_file_writer_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("log.txt");
        let registry = LoggerRegistry::with_writer(Arc::new(FileWriter::new(&path)));

        let logger = registry.get("views");
        logger.log("first");
        logger.log("second");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Log-----> first\nLog-----> second\n");
    }
}
