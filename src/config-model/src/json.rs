use serde::de::DeserializeOwned;
use serde::de::Error as _;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::trace;

use crate::MarshalError;
use crate::SpecError;

/// parse apply input as a JSON object. a top-level null is a no-op and yields None
pub(crate) fn parse_patch(js: &str) -> Result<Option<Map<String, Value>>, SpecError> {
    let value: Value = serde_json::from_str(js).map_err(SpecError::ParseJson)?;
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(SpecError::Unmarshal(serde_json::Error::custom(format!(
            "expected a JSON object, found: {other}"
        )))),
    }
}

/// merge patch onto target: objects merge key by key, everything else is replaced
pub(crate) fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// decode through serde, reporting fields the target type skipped.
/// in strict mode the first skipped field is an error
pub(crate) fn decode_tracked<T>(value: Value, strict: bool) -> Result<T, SpecError>
where
    T: DeserializeOwned,
{
    let mut ignored = vec![];
    let decoded: T = serde_ignored::deserialize(value, |path| ignored.push(path.to_string()))
        .map_err(SpecError::Unmarshal)?;

    if strict {
        if let Some(field) = ignored.into_iter().next() {
            return Err(SpecError::UnknownField(field));
        }
    } else {
        for field in ignored {
            trace!(%field, "ignoring unknown field");
        }
    }
    Ok(decoded)
}

/// render target with serde, merge patch on top and decode the result back into target.
/// target is only replaced once decoding succeeded
pub(crate) fn apply_merged<T>(
    target: &mut T,
    patch: Map<String, Value>,
    strict: bool,
) -> Result<(), SpecError>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(&*target).map_err(MarshalError::Print)?;
    merge(&mut merged, Value::Object(patch));
    *target = decode_tracked(merged, strict)?;
    Ok(())
}
