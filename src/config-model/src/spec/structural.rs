use prost::Message;
use prost_types::value::Kind;
use prost_types::ListValue;
use prost_types::NullValue;
use prost_types::Struct;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use tracing::warn;

use super::ConfigSpec;
use super::Envelope;
use super::MergeJson;
use crate::BridgeError;
use crate::MarshalError;
use crate::SpecError;

/// type url of the container generic specs are bridged through
pub const STRUCT_TYPE_URL: &str = "type.googleapis.com/google.protobuf.Struct";

/// largest integer a double holds exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Plain serde value without a native codec.
/// Apply goes through the type's [`MergeJson`].
pub trait StructuralSpec: Send + Sync {
    fn to_json_value(&self) -> Result<Value, serde_json::Error>;

    fn encode_json(&self) -> Result<Vec<u8>, serde_json::Error>;

    fn merge_json(&mut self, patch: Map<String, Value>, strict: bool) -> Result<(), SpecError>;

    /// new value of the same type, decoded from this one's JSON
    fn clone_structural(&self) -> Result<Box<dyn ConfigSpec>, serde_json::Error>;
}

impl<T> StructuralSpec for T
where
    T: MergeJson + ConfigSpec,
{
    fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn encode_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn merge_json(&mut self, patch: Map<String, Value>, strict: bool) -> Result<(), SpecError> {
        MergeJson::merge_json(self, patch, strict)
    }

    fn clone_structural(&self) -> Result<Box<dyn ConfigSpec>, serde_json::Error> {
        let value = serde_json::to_value(self)?;
        let copy: T = serde_json::from_value(value)?;
        Ok(Box::new(copy))
    }
}

fn structural(spec: &dyn ConfigSpec) -> Result<&dyn StructuralSpec, MarshalError> {
    spec.as_structural()
        .ok_or_else(|| MarshalError::NotStructural(spec.type_name()))
}

/// JSON encode, decode into a Struct container, then encode the container
pub(super) fn to_envelope(spec: &dyn ConfigSpec) -> Result<Envelope, MarshalError> {
    let value = structural(spec)?
        .to_json_value()
        .map_err(BridgeError::Json)?;
    let container = to_struct(value)?;
    Ok(Envelope {
        type_url: STRUCT_TYPE_URL.to_owned(),
        value: container.encode_to_vec(),
    })
}

pub(super) fn print_json(spec: &dyn ConfigSpec) -> Result<Vec<u8>, MarshalError> {
    structural(spec)?.encode_json().map_err(MarshalError::Print)
}

pub(super) fn apply(
    spec: &mut dyn ConfigSpec,
    patch: Map<String, Value>,
    strict: bool,
) -> Result<(), SpecError> {
    let type_name = spec.type_name();
    match spec.as_structural_mut() {
        Some(target) => target.merge_json(patch, strict),
        None => Err(MarshalError::NotStructural(type_name).into()),
    }
}

pub(super) fn deep_copy(spec: &dyn ConfigSpec) -> Option<Box<dyn ConfigSpec>> {
    let Some(target) = spec.as_structural() else {
        warn!(spec = spec.type_name(), "no JSON encoding, spec can't be copied");
        return None;
    };
    match target.clone_structural() {
        Ok(copy) => Some(copy),
        Err(err) => {
            warn!(spec = spec.type_name(), %err, "JSON round trip failed, spec not copied");
            None
        }
    }
}

fn to_struct(value: Value) -> Result<Struct, BridgeError> {
    match value {
        Value::Object(map) => object_to_struct(map),
        _ => Err(BridgeError::NotAnObject),
    }
}

fn object_to_struct(map: Map<String, Value>) -> Result<Struct, BridgeError> {
    let fields = map
        .into_iter()
        .map(|(key, value)| Ok((key, to_proto_value(value)?)))
        .collect::<Result<_, BridgeError>>()?;
    Ok(Struct { fields })
}

fn to_proto_value(value: Value) -> Result<prost_types::Value, BridgeError> {
    let kind = match value {
        Value::Null => Kind::NullValue(NullValue::NullValue as i32),
        Value::Bool(flag) => Kind::BoolValue(flag),
        Value::Number(number) => number
            .as_f64()
            .map_or(Kind::NullValue(NullValue::NullValue as i32), Kind::NumberValue),
        Value::String(text) => Kind::StringValue(text),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items
                .into_iter()
                .map(to_proto_value)
                .collect::<Result<_, _>>()?,
        }),
        Value::Object(map) => Kind::StructValue(object_to_struct(map)?),
    };
    Ok(prost_types::Value { kind: Some(kind) })
}

/// Render a Struct container back as JSON.
/// Whole numbers within double precision come back as integers.
pub fn struct_to_json(container: &Struct) -> Value {
    Value::Object(
        container
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), proto_value_to_json(value)))
            .collect(),
    )
}

fn proto_value_to_json(value: &prost_types::Value) -> Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(flag)) => Value::Bool(*flag),
        Some(Kind::NumberValue(double)) => number_to_json(*double),
        Some(Kind::StringValue(text)) => Value::String(text.clone()),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.iter().map(proto_value_to_json).collect())
        }
        Some(Kind::StructValue(nested)) => struct_to_json(nested),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn number_to_json(double: f64) -> Value {
    if double.fract() == 0.0 && double.abs() <= MAX_SAFE_INTEGER {
        return Value::from(double as i64);
    }
    Number::from_f64(double).map_or(Value::Null, Value::Number)
}
