//! Serialization and identity for configuration payloads of unknown shape.
//!
//! A payload is a [`ConfigSpec`] belonging to one of three families:
//! messages with a full descriptor, named legacy messages with their own
//! serde mapping, or plain serde values. Every operation classifies the
//! payload first, in that order, and then uses the family's own codec.

mod error;
mod json;
mod metadata;
pub mod spec;

#[cfg(test)]
mod fixture;

pub use self::error::*;
pub use self::metadata::*;
pub use self::spec::ConfigSpec;
pub use self::spec::Envelope;
pub use self::spec::LegacySpec;
pub use self::spec::MergeJson;
pub use self::spec::ReflectSpec;
pub use self::spec::StructuralSpec;
