use prost::DecodeError;
use prost::EncodeError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// failure while producing bytes or JSON text from a spec
#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("native encode error: {0}")]
    Native(#[from] EncodeError),
    #[error("JSON print error: {0}")]
    Print(#[source] SerdeJsonError),
    #[error("JSON bridge error: {0}")]
    Bridge(#[from] BridgeError),
    #[error("{0} has no structural JSON encoding")]
    NotStructural(&'static str),
}

/// failure while moving a structural value into the envelope container
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("JSON encode error: {0}")]
    Json(#[from] SerdeJsonError),
    #[error("JSON value is not an object")]
    NotAnObject,
}

#[derive(Error, Debug)]
pub enum SpecError {
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    #[error("JSON parse error: {0}")]
    ParseJson(#[source] SerdeJsonError),
    #[cfg(feature = "yaml")]
    #[error("Yaml parse error: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("unmarshal error: {0}")]
    Unmarshal(#[source] SerdeJsonError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("printed JSON is not a map: {0}")]
    Projection(#[source] SerdeJsonError),
}

impl SpecError {
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, SpecError::UnknownField(_))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid group/version/kind: {0}")]
pub struct GvkParseError(pub String);
