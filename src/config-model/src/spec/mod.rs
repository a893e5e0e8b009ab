mod family;
mod legacy;
mod reflect;
mod structural;

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::trace;

use crate::json;
use crate::MarshalError;
use crate::SpecError;

pub use self::family::classify;
pub use self::family::Family;
pub use self::family::FamilyKind;
pub use self::legacy::LegacySpec;
pub use self::reflect::type_url;
pub use self::reflect::ReflectSpec;
pub use self::reflect::TYPE_URL_PREFIX;
pub use self::structural::struct_to_json;
pub use self::structural::StructuralSpec;
pub use self::structural::STRUCT_TYPE_URL;

/// self-describing binary envelope: type url plus encoded bytes
pub type Envelope = prost_types::Any;

/// Payload of a configuration unit.
///
/// Capabilities are declared by overriding the accessors; anything left at its
/// default is treated as absent. Use [`reflect_spec!`](crate::reflect_spec),
/// [`legacy_spec!`](crate::legacy_spec) or [`structural_spec!`](crate::structural_spec)
/// for the common cases.
pub trait ConfigSpec: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// message with a full descriptor
    fn as_reflect(&self) -> Option<&dyn ReflectSpec> {
        None
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn ReflectSpec> {
        None
    }

    /// message with a type name and its own serde mapping
    fn as_legacy(&self) -> Option<&dyn LegacySpec> {
        None
    }

    fn as_legacy_mut(&mut self) -> Option<&mut dyn LegacySpec> {
        None
    }

    /// plain serde value
    fn as_structural(&self) -> Option<&dyn StructuralSpec> {
        None
    }

    fn as_structural_mut(&mut self) -> Option<&mut dyn StructuralSpec> {
        None
    }

    /// own deep copy, preferred over any family clone
    fn deep_copy_spec(&self) -> Option<Box<dyn ConfigSpec>> {
        None
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<'a> dyn ConfigSpec + 'a {
    pub fn downcast_ref<T: ConfigSpec>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: ConfigSpec>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// How a serde-backed spec takes JSON input.
///
/// The default renders the current value, merges the input on top and decodes
/// the result into a fresh value that replaces the old one only on success.
/// That only works for types whose serde encoding round-trips: fields marked
/// `#[serde(skip)]` come back as their default, and a value that doesn't print
/// back into itself (a NaN float prints as `null`) makes every apply fail.
/// Such types override [`merge_json`](MergeJson::merge_json) and write the
/// input into themselves.
pub trait MergeJson: Serialize + DeserializeOwned {
    fn merge_json(&mut self, patch: Map<String, Value>, strict: bool) -> Result<(), SpecError> {
        json::apply_merged(self, patch, strict)
    }
}

/// encode spec into binary envelope using its family's encoder
pub fn to_envelope(spec: &dyn ConfigSpec) -> Result<Envelope, SpecError> {
    let family = classify(spec);
    let envelope = match family {
        Family::Reflect(message) => reflect::to_envelope(message),
        Family::Legacy(message) => legacy::to_envelope(message)?,
        Family::Generic(spec) => structural::to_envelope(spec)?,
    };
    debug!(family = %family.kind(), type_url = %envelope.type_url, "encoded envelope");
    Ok(envelope)
}

/// print spec as JSON using its family's printer
pub fn to_json(spec: &dyn ConfigSpec) -> Result<Vec<u8>, SpecError> {
    let family = classify(spec);
    trace!(family = %family.kind(), "printing JSON");
    let js = match family {
        Family::Reflect(message) => reflect::print_json(message)?,
        Family::Legacy(message) => legacy::print_json(message)?,
        Family::Generic(spec) => structural::print_json(spec)?,
    };
    Ok(js)
}

pub fn to_json_string(spec: &dyn ConfigSpec) -> Result<String, SpecError> {
    let js = to_json(spec)?;
    String::from_utf8(js)
        .map_err(|err| MarshalError::Print(serde::ser::Error::custom(err)).into())
}

/// project spec into untyped map by way of its JSON
pub fn to_map(spec: &dyn ConfigSpec) -> Result<HashMap<String, Value>, SpecError> {
    let js = to_json(spec)?;
    serde_json::from_slice(&js).map_err(SpecError::Projection)
}

/// Merge JSON onto spec, ignoring fields it doesn't know.
///
/// Descriptor-carrying messages are merged through their dynamic form. Legacy
/// and plain serde specs go through [`MergeJson`], whose default requires a
/// symmetric serde round trip.
pub fn apply_json(spec: &mut dyn ConfigSpec, js: &str) -> Result<(), SpecError> {
    apply(spec, js, false)
}

/// merge JSON onto spec, rejecting fields it doesn't know
pub fn apply_json_strict(spec: &mut dyn ConfigSpec, js: &str) -> Result<(), SpecError> {
    apply(spec, js, true)
}

#[cfg(feature = "yaml")]
pub fn apply_yaml(spec: &mut dyn ConfigSpec, yml: &str) -> Result<(), SpecError> {
    let js = yaml_to_json(yml)?;
    apply_json(spec, &js)
}

#[cfg(feature = "yaml")]
pub fn apply_yaml_strict(spec: &mut dyn ConfigSpec, yml: &str) -> Result<(), SpecError> {
    let js = yaml_to_json(yml)?;
    apply_json_strict(spec, &js)
}

#[cfg(feature = "yaml")]
fn yaml_to_json(yml: &str) -> Result<String, SpecError> {
    let value: Value = serde_yaml::from_str(yml)?;
    serde_json::to_string(&value).map_err(SpecError::ParseJson)
}

/// Decoding happens against a copy; spec is only replaced on success,
/// so a failed apply leaves it as it was.
fn apply(spec: &mut dyn ConfigSpec, js: &str, strict: bool) -> Result<(), SpecError> {
    let Some(patch) = json::parse_patch(js)? else {
        trace!("null input, nothing to apply");
        return Ok(());
    };

    let kind = classify(spec).kind();
    debug!(family = %kind, strict, fields = patch.len(), "applying JSON");
    match kind {
        FamilyKind::Reflect => {
            if let Some(message) = spec.as_reflect_mut() {
                return reflect::apply(message, patch, strict);
            }
        }
        FamilyKind::Legacy => {
            if let Some(message) = spec.as_legacy_mut() {
                return message.apply_json(patch, strict);
            }
        }
        FamilyKind::Generic => {}
    }
    structural::apply(spec, patch, strict)
}

/// Copy spec with the first available strategy: its own deep copy,
/// family clone, then a JSON round trip.
///
/// Returns None if the JSON round trip fails or the spec has no
/// structural encoding.
pub fn deep_copy(spec: &dyn ConfigSpec) -> Option<Box<dyn ConfigSpec>> {
    if let Some(copy) = spec.deep_copy_spec() {
        trace!(spec = spec.type_name(), "using own deep copy");
        return Some(copy);
    }

    match classify(spec) {
        Family::Reflect(message) => Some(message.clone_reflect()),
        Family::Legacy(message) => Some(message.clone_legacy()),
        Family::Generic(spec) => structural::deep_copy(spec),
    }
}

/// implement [`ConfigSpec`](crate::ConfigSpec) for a message with a full descriptor
#[macro_export]
macro_rules! reflect_spec {
    ($spec:ty) => {
        impl $crate::ConfigSpec for $spec {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn as_reflect(&self) -> Option<&dyn $crate::ReflectSpec> {
                Some(self)
            }

            fn as_reflect_mut(&mut self) -> Option<&mut dyn $crate::ReflectSpec> {
                Some(self)
            }
        }
    };
}

/// Implement [`ConfigSpec`](crate::ConfigSpec) for a named message with serde mapping.
/// `legacy_spec!(Type, own_merge)` leaves [`MergeJson`](crate::MergeJson) to the type.
#[macro_export]
macro_rules! legacy_spec {
    ($spec:ty) => {
        $crate::legacy_spec!($spec, own_merge);

        impl $crate::MergeJson for $spec {}
    };
    ($spec:ty, own_merge) => {
        impl $crate::ConfigSpec for $spec {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn as_legacy(&self) -> Option<&dyn $crate::LegacySpec> {
                Some(self)
            }

            fn as_legacy_mut(&mut self) -> Option<&mut dyn $crate::LegacySpec> {
                Some(self)
            }
        }
    };
}

/// Implement [`ConfigSpec`](crate::ConfigSpec) for a plain serde type.
/// `structural_spec!(Type, own_merge)` leaves [`MergeJson`](crate::MergeJson) to the type.
#[macro_export]
macro_rules! structural_spec {
    ($spec:ty) => {
        $crate::structural_spec!($spec, own_merge);

        impl $crate::MergeJson for $spec {}
    };
    ($spec:ty, own_merge) => {
        impl $crate::ConfigSpec for $spec {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn as_structural(&self) -> Option<&dyn $crate::StructuralSpec> {
                Some(self)
            }

            fn as_structural_mut(&mut self) -> Option<&mut dyn $crate::StructuralSpec> {
                Some(self)
            }
        }
    };
}
