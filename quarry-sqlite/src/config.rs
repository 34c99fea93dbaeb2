//! SQLite connection configuration.

use std::path::{Path, PathBuf};

use crate::error::{SqliteError, SqliteResult};

/// Connection settings for [`SqliteEngine`](crate::SqliteEngine).
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Where the database lives.
    pub path: DatabasePath,
    /// Make `LIKE` case-sensitive, matching the in-memory matcher.
    pub case_sensitive_like: bool,
    /// Enable foreign keys.
    pub foreign_keys: bool,
    /// How long a locked database is retried before failing.
    pub busy_timeout_ms: Option<u32>,
    /// Journal mode, left at SQLite's default when unset.
    pub journal_mode: Option<JournalMode>,
    /// Synchronous mode, left at SQLite's default when unset.
    pub synchronous: Option<SynchronousMode>,
}

/// Location of a SQLite database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Path as passed to `sqlite3_open`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Memory => ":memory:",
            Self::File(path) => path.to_str().unwrap_or(":memory:"),
        }
    }

    /// Whether the database lives only in this connection.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

/// `PRAGMA synchronous` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronousMode {
    /// No syncing.
    Off,
    /// Sync at critical moments.
    Normal,
    /// Sync on every commit.
    Full,
}

impl SynchronousMode {
    /// Value for the matching `PRAGMA`.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "normal" => Some(Self::Normal),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Delete the journal after each transaction.
    Delete,
    /// Truncate the journal instead of deleting it.
    Truncate,
    /// Keep the journal in memory.
    Memory,
    /// Write-ahead logging.
    Wal,
    /// No journal.
    Off,
}

impl JournalMode {
    /// Value for the matching `PRAGMA`.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "delete" => Some(Self::Delete),
            "truncate" => Some(Self::Truncate),
            "memory" => Some(Self::Memory),
            "wal" => Some(Self::Wal),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            case_sensitive_like: true,
            foreign_keys: true,
            busy_timeout_ms: Some(5000),
            journal_mode: None,
            synchronous: None,
        }
    }
}

impl SqliteConfig {
    /// Configuration for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Configuration for a file-based database.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Build a configuration from a connection URL.
    ///
    /// Supported formats:
    /// - `sqlite::memory:` or `:memory:` - In-memory database
    /// - `sqlite://path/to/db.sqlite` - File-based database
    /// - `file:path/to/db.sqlite` - Alternative format
    ///
    /// Query options: `case_sensitive_like`, `foreign_keys`, `busy_timeout`,
    /// `journal_mode`, `synchronous`.
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        let url = url.as_ref();
        let (location, query) = match url.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (url, None),
        };

        let mut config = if location == "sqlite::memory:" || location == ":memory:" {
            Self::memory()
        } else if let Some(path) = location.strip_prefix("sqlite://") {
            if path.is_empty() {
                return Err(SqliteError::config("database path is required"));
            }
            Self::file(path)
        } else if let Some(path) = location.strip_prefix("sqlite:") {
            if path == ":memory:" {
                Self::memory()
            } else {
                Self::file(path)
            }
        } else if let Some(path) = location.strip_prefix("file:") {
            Self::file(path)
        } else {
            Self::file(location)
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "mode" if value == "memory" => config.path = DatabasePath::Memory,
                "case_sensitive_like" => config.case_sensitive_like = parse_flag(key, value)?,
                "foreign_keys" => config.foreign_keys = parse_flag(key, value)?,
                "busy_timeout" => {
                    let ms = value
                        .parse()
                        .map_err(|_| SqliteError::config(format!("invalid busy_timeout `{}`", value)))?;
                    config.busy_timeout_ms = Some(ms);
                }
                "journal_mode" => {
                    config.journal_mode = Some(
                        JournalMode::parse(value)
                            .ok_or_else(|| SqliteError::config(format!("unknown journal_mode `{}`", value)))?,
                    );
                }
                "synchronous" => {
                    config.synchronous = Some(
                        SynchronousMode::parse(value)
                            .ok_or_else(|| SqliteError::config(format!("unknown synchronous mode `{}`", value)))?,
                    );
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// Path as passed to `sqlite3_open`.
    pub fn path_str(&self) -> &str {
        self.path.as_str()
    }

    /// Replace the database location.
    pub fn path(mut self, path: DatabasePath) -> Self {
        self.path = path;
        self
    }

    /// Make `LIKE` case-sensitive or not.
    pub fn case_sensitive_like(mut self, enabled: bool) -> Self {
        self.case_sensitive_like = enabled;
        self
    }

    /// Toggle `PRAGMA foreign_keys`.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Retry a locked database for up to `ms` milliseconds.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Set the journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = Some(mode);
        self
    }

    /// Choose the `PRAGMA synchronous` level.
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = Some(mode);
        self
    }
}

fn parse_flag(key: &str, value: &str) -> SqliteResult<bool> {
    match value {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(SqliteError::config(format!("invalid value `{}` for {}", value, key))),
    }
}
