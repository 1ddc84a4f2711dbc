//! Event message types.
//!
//! Events are pushed by the device without a preceding command, as
//! `EVT;KIND;f1;f2;...`. The kind tag selects a decoder from
//! [`EVENT_DECODERS`]; kinds without a decoder are passed through as
//! [`Event::Unknown`].
//!
//! # Event Kinds
//!
//! | Kind | Fields |
//! |------|--------|
//! | `LOG` | `timestampMs;level;"file";line;"message"` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use super::codec::{self, DELIMITER, DecodeError};

// ============================================================================
// Event
// ============================================================================

/// An asynchronous event from the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Event {
    /// Log record streamed by the device.
    Log(LogRecord),

    /// Event kind the client has no decoder for.
    Unknown {
        /// Kind tag.
        kind: String,
        /// Raw fields.
        fields: Vec<String>,
    },
}

impl Event {
    /// Returns the kind tag.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Log(_) => LOG_KIND,
            Self::Unknown { kind, .. } => kind,
        }
    }

    /// Returns the log record, if this is a log event.
    #[inline]
    #[must_use]
    pub fn as_log(&self) -> Option<&LogRecord> {
        match self {
            Self::Log(record) => Some(record),
            Self::Unknown { .. } => None,
        }
    }
}

// ============================================================================
// LogLevel
// ============================================================================

/// Severity of a device log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Unrecoverable error.
    Fatal,
    /// Error.
    Error,
    /// Warning.
    Warning,
    /// Information.
    Info,
    /// Debug output.
    Debug,
    /// Trace output.
    Trace,
}

impl LogLevel {
    /// Maps a wire level (0–5) to a severity.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Fatal),
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Info),
            4 => Some(Self::Debug),
            5 => Some(Self::Trace),
            _ => None,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LogRecord
// ============================================================================

/// One log line streamed by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Device uptime in milliseconds.
    pub timestamp_ms: u64,
    /// Raw severity level (0–5).
    pub severity_level: u8,
    /// Source file that emitted the record.
    pub source_file: String,
    /// Source line.
    pub line: u32,
    /// Log message.
    pub message: String,
}

impl LogRecord {
    /// Returns the severity, or `None` for levels outside 0–5.
    #[inline]
    #[must_use]
    pub fn level(&self) -> Option<LogLevel> {
        LogLevel::from_raw(self.severity_level)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = self.level().map_or("UNKNOWN", LogLevel::as_str);
        write!(
            f,
            "{} {} {}:{} {}",
            self.timestamp_ms, level, self.source_file, self.line, self.message
        )
    }
}

// ============================================================================
// Decoder Table
// ============================================================================

/// Kind tag of log events.
pub const LOG_KIND: &str = "LOG";

/// Decodes the fields of one event kind.
pub type EventDecoder = fn(&[&str]) -> Result<Event, DecodeError>;

/// Event kind tag → field decoder.
pub const EVENT_DECODERS: &[(&str, EventDecoder)] = &[(LOG_KIND, decode_log as EventDecoder)];

/// Decodes the fields of an event frame of the given kind.
///
/// Kinds without a registered decoder yield [`Event::Unknown`].
///
/// # Errors
///
/// Returns [`DecodeError`] if a registered decoder rejects the fields.
pub fn decode_event(kind: &str, fields: &[&str]) -> Result<Event, DecodeError> {
    match EVENT_DECODERS.iter().find(|(tag, _)| *tag == kind) {
        Some((_, decoder)) => decoder(fields),
        None => Ok(Event::Unknown {
            kind: kind.to_string(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }),
    }
}

/// Decodes `timestampMs;level;"file";line;"message"`.
///
/// The message is the last field; a message containing `;` arrives split
/// and is joined back before unquoting.
fn decode_log(fields: &[&str]) -> Result<Event, DecodeError> {
    const CTX: &str = "LOG event";

    let [timestamp, level, file, line, message @ ..] = fields else {
        return Err(codec::arity(CTX, "at least 5", fields.len()));
    };
    if message.is_empty() {
        return Err(codec::arity(CTX, "at least 5", fields.len()));
    }

    let message = message.join(&DELIMITER.to_string());

    Ok(Event::Log(LogRecord {
        timestamp_ms: codec::number(CTX, "timestamp", timestamp)?,
        severity_level: codec::number(CTX, "level", level)?,
        source_file: codec::quoted(CTX, "file", file)?,
        line: codec::number(CTX, "line", line)?,
        message: codec::quoted(CTX, "message", &message)?,
    }))
}

// ============================================================================
// Tests
// ============================================================================
