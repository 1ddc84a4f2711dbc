//! Inbound frame decoding.
//!
//! Splits a text frame on `;` and classifies it by its status tag:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `ACK` | Command succeeded, fields follow |
//! | `EVT` | Asynchronous event, kind and fields follow |
//! | anything else | Command failed, optional reason follows |
//!
//! The field helpers at the bottom are shared by the reply, event and
//! command parsers.

// ============================================================================
// Imports
// ============================================================================

use std::str::FromStr;

use thiserror::Error;

use super::event::{Event, decode_event};

// ============================================================================
// Constants
// ============================================================================

/// Token separator used by every frame.
pub const DELIMITER: char = ';';

/// Status tag of a successful command outcome.
pub const ACK_TAG: &str = "ACK";

/// Status tag of an asynchronous event.
pub const EVT_TAG: &str = "EVT";

/// Reason reported when a failure frame carries none.
pub const UNKNOWN_REASON: &str = "Unknown error.";

// ============================================================================
// DecodeError
// ============================================================================

/// Error raised while decoding a frame or one of its fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame has an empty status tag.
    #[error("frame has an empty status tag")]
    EmptyTag,

    /// Event frame without a kind token.
    #[error("event frame without kind")]
    MissingEventKind,

    /// Event frame whose fields do not match its kind.
    #[error("malformed {kind} event: {message}")]
    MalformedEvent {
        /// Event kind tag.
        kind: String,
        /// What was wrong with it.
        message: String,
    },

    /// Command name not known to the client.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Wrong number of fields.
    #[error("{context}: expected {expected} fields, got {actual}")]
    Arity {
        /// Command name or event kind being decoded.
        context: String,
        /// Expected field count (may be an expression like `1 + 6*4`).
        expected: String,
        /// Field count received.
        actual: usize,
    },

    /// Field could not be parsed.
    #[error("{context}: invalid {field} '{value}'")]
    InvalidField {
        /// Command name or event kind being decoded.
        context: String,
        /// Field name.
        field: &'static str,
        /// Raw field text.
        value: String,
    },
}

impl DecodeError {
    /// Returns `true` if the error came from an event frame.
    ///
    /// Event errors never affect the pending command.
    #[inline]
    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(self, Self::MissingEventKind | Self::MalformedEvent { .. })
    }
}

// ============================================================================
// Frame
// ============================================================================

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Outcome of the pending command.
    Outcome(Outcome),
    /// Asynchronous event.
    Event(Event),
}

/// Outcome of a command, before command-specific decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `ACK` with the raw fields that followed it.
    Success(Vec<String>),
    /// Any non-`ACK`, non-`EVT` tag.
    Failure {
        /// Status tag as received.
        tag: String,
        /// Unquoted reason text, if any.
        reason: Option<String>,
    },
}

impl Outcome {
    /// Returns `true` for a success outcome.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes one inbound text frame.
///
/// # Errors
///
/// - [`DecodeError::EmptyTag`] if the first token is empty
/// - [`DecodeError::MissingEventKind`] / [`DecodeError::MalformedEvent`]
///   for event frames that cannot be decoded
pub fn decode_frame(text: &str) -> Result<Frame, DecodeError> {
    let mut tokens = text.split(DELIMITER);
    let tag = tokens.next().unwrap_or_default();

    match tag {
        "" => Err(DecodeError::EmptyTag),

        EVT_TAG => {
            let kind = tokens
                .next()
                .filter(|kind| !kind.is_empty())
                .ok_or(DecodeError::MissingEventKind)?;
            let fields: Vec<&str> = tokens.collect();

            decode_event(kind, &fields)
                .map(Frame::Event)
                .map_err(|e| DecodeError::MalformedEvent {
                    kind: kind.to_string(),
                    message: e.to_string(),
                })
        }

        ACK_TAG => Ok(Frame::Outcome(Outcome::Success(
            tokens.map(str::to_string).collect(),
        ))),

        _ => {
            let reason = tokens
                .next()
                .filter(|reason| !reason.is_empty())
                .map(|reason| unquote_lenient(reason).to_string());

            Ok(Frame::Outcome(Outcome::Failure {
                tag: tag.to_string(),
                reason,
            }))
        }
    }
}

// ============================================================================
// Field Helpers
// ============================================================================

/// Checks an exact field count.
pub(crate) fn expect_arity(
    context: &str,
    fields: &[&str],
    expected: usize,
) -> Result<(), DecodeError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(arity(context, expected.to_string(), fields.len()))
    }
}

/// Builds an arity error.
pub(crate) fn arity(context: &str, expected: impl Into<String>, actual: usize) -> DecodeError {
    DecodeError::Arity {
        context: context.to_string(),
        expected: expected.into(),
        actual,
    }
}

/// Builds an invalid field error.
pub(crate) fn invalid(context: &str, field: &'static str, value: &str) -> DecodeError {
    DecodeError::InvalidField {
        context: context.to_string(),
        field,
        value: value.to_string(),
    }
}

/// Parses a decimal integer field.
pub(crate) fn number<T: FromStr>(
    context: &str,
    field: &'static str,
    value: &str,
) -> Result<T, DecodeError> {
    value.parse().map_err(|_| invalid(context, field, value))
}

/// Parses a base-16 pixel field, with or without `0x`.
pub(crate) fn hex(context: &str, field: &'static str, value: &str) -> Result<u32, DecodeError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    u32::from_str_radix(digits, 16).map_err(|_| invalid(context, field, value))
}

/// Parses a numeric flag; any non-zero value is `true`.
pub(crate) fn flag(context: &str, field: &'static str, value: &str) -> Result<bool, DecodeError> {
    number::<u32>(context, field, value).map(|n| n != 0)
}

/// Unwraps a double-quoted field by dropping its first and last character.
pub(crate) fn quoted(
    context: &str,
    field: &'static str,
    value: &str,
) -> Result<String, DecodeError> {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(str::to_string)
        .ok_or_else(|| invalid(context, field, value))
}

/// Unwraps a double-quoted field if it is quoted, else returns it as is.
pub(crate) fn unquote_lenient(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}

// ============================================================================
// Tests
// ============================================================================
