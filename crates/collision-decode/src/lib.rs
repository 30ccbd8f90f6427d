//! Decode and encode binary zone collision files.
//!
//! This crate provides pure synchronous functions for turning a zone's
//! collision file into a typed [`CollisionWorld`] and back. All functions
//! can be called from any threading context; the caller decides where the
//! work runs.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives, no logging
//! - **All-or-nothing**: A world either decodes completely or not at all
//! - **Bounds-checked**: Malformed input yields an error, never a panic

mod encode;
mod error;
mod flags;
mod parse;
pub mod primitive;
mod reader;
mod transform;
mod world;

pub use encode::encode;
pub use error::{ParseError, ParseResult};
pub use flags::CollisionFlagSet;
pub use parse::{FORMAT_VERSION, MAGIC, parse, parse_prefix};
pub use primitive::GeometryPrimitive;
pub use transform::{ROTATION_TOLERANCE, Transform3D};
pub use world::{CollisionObject, CollisionWorld};
