use prost::DecodeError;
use prost::Message;
use prost_reflect::DeserializeOptions;
use prost_reflect::DynamicMessage;
use prost_reflect::FieldDescriptor;
use prost_reflect::Kind;
use prost_reflect::MessageDescriptor;
use prost_reflect::ReflectMessage;
use prost_reflect::SerializeOptions;
use serde_json::Map;
use serde_json::Value;
use tracing::trace;

use super::ConfigSpec;
use super::Envelope;
use crate::json;
use crate::MarshalError;
use crate::SpecError;

pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// well-known types have their own JSON mapping and are not walked
const WELL_KNOWN_PACKAGE: &str = "google.protobuf.";

/// type url a message descriptor resolves to
pub fn type_url(descriptor: &MessageDescriptor) -> String {
    format!("{}{}", TYPE_URL_PREFIX, descriptor.full_name())
}

/// Message carrying its own descriptor.
/// JSON follows the protobuf mapping: camelCase names, enums by name,
/// 64-bit integers as strings, default values omitted.
pub trait ReflectSpec: Send + Sync {
    fn message_descriptor(&self) -> MessageDescriptor;

    fn to_dynamic(&self) -> DynamicMessage;

    fn encode_message(&self) -> Vec<u8>;

    /// replace self with the content of a dynamic message of the same type
    fn replace_from_dynamic(&mut self, message: &DynamicMessage) -> Result<(), DecodeError>;

    fn clone_reflect(&self) -> Box<dyn ConfigSpec>;
}

impl<T> ReflectSpec for T
where
    T: ReflectMessage + Default + Clone + ConfigSpec,
{
    fn message_descriptor(&self) -> MessageDescriptor {
        ReflectMessage::descriptor(self)
    }

    fn to_dynamic(&self) -> DynamicMessage {
        self.transcode_to_dynamic()
    }

    fn encode_message(&self) -> Vec<u8> {
        Message::encode_to_vec(self)
    }

    fn replace_from_dynamic(&mut self, message: &DynamicMessage) -> Result<(), DecodeError> {
        *self = message.transcode_to::<T>()?;
        Ok(())
    }

    fn clone_reflect(&self) -> Box<dyn ConfigSpec> {
        Box::new(self.clone())
    }
}

pub(super) fn to_envelope(message: &dyn ReflectSpec) -> Envelope {
    Envelope {
        type_url: type_url(&message.message_descriptor()),
        value: message.encode_message(),
    }
}

pub(super) fn print_json(message: &dyn ReflectSpec) -> Result<Vec<u8>, MarshalError> {
    let mut js = vec![];
    let mut serializer = serde_json::Serializer::new(&mut js);
    message
        .to_dynamic()
        .serialize_with_options(&mut serializer, &SerializeOptions::new())
        .map_err(MarshalError::Print)?;
    Ok(js)
}

pub(super) fn apply(
    message: &mut dyn ReflectSpec,
    mut patch: Map<String, Value>,
    strict: bool,
) -> Result<(), SpecError> {
    let descriptor = message.message_descriptor();
    normalize_fields(&descriptor, &mut patch, "", strict)?;

    let mut merged = message
        .to_dynamic()
        .serialize_with_options(serde_json::value::Serializer, &SerializeOptions::new())
        .map_err(MarshalError::Print)?;
    if let Value::Object(current) = &mut merged {
        clear_oneof_siblings(&descriptor, current, &patch);
    }
    json::merge(&mut merged, Value::Object(patch));

    let options = DeserializeOptions::new().deny_unknown_fields(strict);
    let decoded = DynamicMessage::deserialize_with_options(descriptor, merged, &options)
        .map_err(SpecError::Unmarshal)?;
    message.replace_from_dynamic(&decoded)?;
    Ok(())
}

/// setting one member of a oneof clears the others
fn clear_oneof_siblings(
    descriptor: &MessageDescriptor,
    current: &mut Map<String, Value>,
    patch: &Map<String, Value>,
) {
    for key in patch.keys() {
        let Some(oneof) = descriptor
            .get_field_by_json_name(key)
            .and_then(|field| field.containing_oneof())
        else {
            continue;
        };
        for sibling in oneof.fields() {
            if sibling.json_name() != key {
                current.remove(sibling.json_name());
            }
        }
    }
}

/// Rename proto field names in the input to their JSON names so they merge
/// with the printed message, recursing into nested messages.
/// In strict mode the first field the descriptor doesn't declare is an error.
fn normalize_fields(
    descriptor: &MessageDescriptor,
    object: &mut Map<String, Value>,
    path: &str,
    strict: bool,
) -> Result<(), SpecError> {
    let keys: Vec<String> = object.keys().cloned().collect();
    for key in keys {
        let field = match descriptor
            .get_field_by_json_name(&key)
            .or_else(|| descriptor.get_field_by_name(&key))
        {
            Some(field) => field,
            None if strict => return Err(SpecError::UnknownField(join(path, &key))),
            None => {
                trace!(field = %join(path, &key), "ignoring unknown field");
                continue;
            }
        };

        let Some(mut value) = object.remove(&key) else {
            continue;
        };
        let field_path = join(path, field.json_name());
        normalize_value(&field, &mut value, &field_path, strict)?;
        object.insert(field.json_name().to_owned(), value);
    }
    Ok(())
}

fn normalize_value(
    field: &FieldDescriptor,
    value: &mut Value,
    path: &str,
    strict: bool,
) -> Result<(), SpecError> {
    if field.is_map() {
        let Kind::Message(entry) = field.kind() else {
            return Ok(());
        };
        if let (Some(descriptor), Value::Object(entries)) =
            (nested_message(&entry.map_entry_value_field()), value)
        {
            for (key, entry) in entries.iter_mut() {
                if let Value::Object(object) = entry {
                    normalize_fields(&descriptor, object, &join(path, key), strict)?;
                }
            }
        }
        return Ok(());
    }

    let Some(descriptor) = nested_message(field) else {
        return Ok(());
    };
    match value {
        Value::Object(object) => normalize_fields(&descriptor, object, path, strict),
        Value::Array(items) if field.is_list() => {
            for (index, item) in items.iter_mut().enumerate() {
                if let Value::Object(object) = item {
                    normalize_fields(&descriptor, object, &format!("{path}[{index}]"), strict)?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn nested_message(field: &FieldDescriptor) -> Option<MessageDescriptor> {
    match field.kind() {
        Kind::Message(descriptor) if !descriptor.full_name().starts_with(WELL_KNOWN_PACKAGE) => {
            Some(descriptor)
        }
        _ => None,
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}
