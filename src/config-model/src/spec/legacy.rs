use prost::EncodeError;
use prost::Message;
use prost::Name;
use serde_json::Map;
use serde_json::Value;

use super::ConfigSpec;
use super::Envelope;
use super::MergeJson;
use crate::MarshalError;
use crate::SpecError;

/// Named message whose JSON mapping is its own serde implementation.
/// Apply goes through the type's [`MergeJson`].
pub trait LegacySpec: Send + Sync {
    /// pack into envelope under the message's own type url
    fn to_any(&self) -> Result<Envelope, EncodeError>;

    fn print_json(&self) -> Result<Vec<u8>, serde_json::Error>;

    fn apply_json(&mut self, patch: Map<String, Value>, strict: bool) -> Result<(), SpecError>;

    fn clone_legacy(&self) -> Box<dyn ConfigSpec>;
}

impl<T> LegacySpec for T
where
    T: Message + Name + MergeJson + Clone + ConfigSpec,
{
    fn to_any(&self) -> Result<Envelope, EncodeError> {
        Envelope::from_msg(self)
    }

    fn print_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn apply_json(&mut self, patch: Map<String, Value>, strict: bool) -> Result<(), SpecError> {
        MergeJson::merge_json(self, patch, strict)
    }

    fn clone_legacy(&self) -> Box<dyn ConfigSpec> {
        Box::new(self.clone())
    }
}

pub(super) fn to_envelope(message: &dyn LegacySpec) -> Result<Envelope, MarshalError> {
    Ok(message.to_any()?)
}

pub(super) fn print_json(message: &dyn LegacySpec) -> Result<Vec<u8>, MarshalError> {
    message.print_json().map_err(MarshalError::Print)
}
