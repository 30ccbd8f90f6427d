//! Error types for collision file decoding.

use std::fmt;

/// Errors that can occur while parsing a collision file.
///
/// Every variant is fatal for the zone being loaded: the parser never hands
/// back a partially decoded world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The header magic did not match, or the header is otherwise unusable.
    BadHeader { detail: String },
    /// The header declares a format version this decoder does not understand.
    UnknownFormatVersion { version: u32 },
    /// A read ran past the end of the buffer.
    Truncated {
        context: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// An object carried non-finite, out-of-range or inconsistent geometry.
    InvalidGeometry { object: usize, detail: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadHeader { detail } => write!(f, "bad collision header: {detail}"),
            Self::UnknownFormatVersion { version } => {
                write!(f, "unsupported collision format version {version}")
            }
            Self::Truncated {
                context,
                offset,
                needed,
                available,
            } => {
                write!(
                    f,
                    "truncated {context} at offset {offset}: needed {needed} bytes, {available} left"
                )
            }
            Self::InvalidGeometry { object, detail } => {
                write!(f, "invalid geometry in object {object}: {detail}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
