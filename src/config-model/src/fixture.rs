//! specs for unit tests, one or more per family

use std::any::Any;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::OnceLock;

use prost_reflect::DescriptorPool;
use prost_reflect::MessageDescriptor;
use prost_reflect::ReflectMessage;
use prost_types::field_descriptor_proto::Label;
use prost_types::field_descriptor_proto::Type;
use prost_types::DescriptorProto;
use prost_types::EnumDescriptorProto;
use prost_types::EnumValueDescriptorProto;
use prost_types::FieldDescriptorProto;
use prost_types::FileDescriptorProto;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::json;
use crate::legacy_spec;
use crate::reflect_spec;
use crate::structural_spec;
use crate::ConfigSpec;
use crate::MergeJson;
use crate::ReflectSpec;
use crate::SpecError;
use crate::StructuralSpec;

#[derive(Clone, PartialEq, prost::Message)]
pub struct Gateway {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, tag = "2")]
    pub max_connections: i64,
    #[prost(enumeration = "Protocol", tag = "3")]
    pub protocol: i32,
    #[prost(message, optional, tag = "4")]
    pub tls: Option<Tls>,
    #[prost(string, repeated, tag = "5")]
    pub hosts: Vec<String>,
    #[prost(int32, tag = "6")]
    pub known_field: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Tls {
    #[prost(string, tag = "1")]
    pub mode: String,
    #[prost(bytes = "vec", tag = "2")]
    pub ca_cert: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Protocol {
    Http = 0,
    Https = 1,
    Grpc = 2,
}

impl ReflectMessage for Gateway {
    fn descriptor(&self) -> MessageDescriptor {
        message_descriptor("demo.v1.Gateway")
    }
}

reflect_spec!(Gateway);

/// message which is also a plain serde value
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Listener {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint32, tag = "2")]
    pub port: u32,
}

impl ReflectMessage for Listener {
    fn descriptor(&self) -> MessageDescriptor {
        message_descriptor("demo.v1.Listener")
    }
}

impl ConfigSpec for Listener {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_reflect(&self) -> Option<&dyn ReflectSpec> {
        Some(self)
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn ReflectSpec> {
        Some(self)
    }

    fn as_structural(&self) -> Option<&dyn StructuralSpec> {
        Some(self)
    }

    fn as_structural_mut(&mut self) -> Option<&mut dyn StructuralSpec> {
        Some(self)
    }
}

impl MergeJson for Listener {}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyRoute {
    #[prost(string, tag = "1")]
    pub host: String,
    #[prost(int64, tag = "2")]
    #[serde(with = "int64_string")]
    pub timeout_ms: i64,
    #[prost(int32, tag = "3")]
    pub known_field: i32,
    #[prost(string, repeated, tag = "4")]
    pub mirrors: Vec<String>,
}

impl prost::Name for LegacyRoute {
    const NAME: &'static str = "LegacyRoute";
    const PACKAGE: &'static str = "legacy.v1";

    fn type_url() -> String {
        "type.googleapis.com/legacy.v1.LegacyRoute".to_owned()
    }
}

legacy_spec!(LegacyRoute);

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub replicas: i32,
    pub host: String,
    pub ports: Vec<u16>,
    pub selector: HashMap<String, String>,
    pub known_field: i32,
    pub ratio: f64,
}

structural_spec!(Settings);

/// copies itself with a bumped generation
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Pinned {
    pub generation: u32,
}

impl ConfigSpec for Pinned {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_structural(&self) -> Option<&dyn StructuralSpec> {
        Some(self)
    }

    fn deep_copy_spec(&self) -> Option<Box<dyn ConfigSpec>> {
        Some(Box::new(Pinned {
            generation: self.generation + 1,
        }))
    }
}

impl MergeJson for Pinned {}

/// serde value that doesn't print back into itself
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Tuning {
    pub replicas: i32,
    pub ratio: f64,
    #[serde(skip)]
    pub cache: u32,
}

structural_spec!(Tuning);

/// same shape as [`Tuning`], but writes input into itself field by field
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Sampler {
    pub replicas: i32,
    pub ratio: f64,
    #[serde(skip)]
    pub cache: u32,
}

structural_spec!(Sampler, own_merge);

#[derive(Deserialize)]
struct SamplerInput {
    replicas: Option<i32>,
    ratio: Option<f64>,
}

impl MergeJson for Sampler {
    fn merge_json(&mut self, patch: Map<String, Value>, strict: bool) -> Result<(), SpecError> {
        let input: SamplerInput = json::decode_tracked(Value::Object(patch), strict)?;
        if let Some(replicas) = input.replicas {
            self.replicas = replicas;
        }
        if let Some(ratio) = input.ratio {
            self.ratio = ratio;
        }
        Ok(())
    }
}

/// serde value printing as a JSON array
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Ports(pub Vec<u16>);

structural_spec!(Ports);

/// no capability at all
#[derive(Debug)]
pub struct Opaque;

impl ConfigSpec for Opaque {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// serde value whose JSON encoding fails: map keys are not strings
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Broken {
    pub grid: BTreeMap<(u8, u8), String>,
}

impl Broken {
    pub fn sample() -> Self {
        Self {
            grid: [((0, 0), "origin".to_owned())].into(),
        }
    }
}

structural_spec!(Broken);

mod int64_string {
    use serde::de::Error;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(D::Error::custom),
            Repr::Number(number) => Ok(number),
        }
    }
}

fn message_descriptor(name: &str) -> MessageDescriptor {
    pool()
        .get_message_by_name(name)
        .expect("message registered in demo pool")
}

fn pool() -> &'static DescriptorPool {
    static POOL: OnceLock<DescriptorPool> = OnceLock::new();
    POOL.get_or_init(|| {
        let mut pool = DescriptorPool::new();
        pool.add_file_descriptor_proto(demo_file())
            .expect("valid demo descriptor");
        pool
    })
}

fn demo_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("demo/v1/demo.proto".to_owned()),
        package: Some("demo.v1".to_owned()),
        syntax: Some("proto3".to_owned()),
        message_type: vec![
            DescriptorProto {
                name: Some("Gateway".to_owned()),
                field: vec![
                    field("name", 1, Type::String, None, Label::Optional),
                    field("max_connections", 2, Type::Int64, None, Label::Optional),
                    field(
                        "protocol",
                        3,
                        Type::Enum,
                        Some(".demo.v1.Protocol"),
                        Label::Optional,
                    ),
                    field("tls", 4, Type::Message, Some(".demo.v1.Tls"), Label::Optional),
                    field("hosts", 5, Type::String, None, Label::Repeated),
                    field("known_field", 6, Type::Int32, None, Label::Optional),
                ],
                ..Default::default()
            },
            DescriptorProto {
                name: Some("Tls".to_owned()),
                field: vec![
                    field("mode", 1, Type::String, None, Label::Optional),
                    field("ca_cert", 2, Type::Bytes, None, Label::Optional),
                ],
                ..Default::default()
            },
            DescriptorProto {
                name: Some("Listener".to_owned()),
                field: vec![
                    field("name", 1, Type::String, None, Label::Optional),
                    field("port", 2, Type::Uint32, None, Label::Optional),
                ],
                ..Default::default()
            },
        ],
        enum_type: vec![EnumDescriptorProto {
            name: Some("Protocol".to_owned()),
            value: ["HTTP", "HTTPS", "GRPC"]
                .iter()
                .zip(0..)
                .map(|(name, number)| EnumValueDescriptorProto {
                    name: Some((*name).to_owned()),
                    number: Some(number),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn field(
    name: &str,
    number: i32,
    ty: Type,
    type_name: Option<&str>,
    label: Label,
) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        type_name: type_name.map(str::to_owned),
        ..Default::default()
    }
}
