use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::GvkParseError;
use crate::spec;
use crate::spec::ConfigSpec;

/// group rendered in place of an empty one
pub const CORE_GROUP: &str = "core";

/// identity key of a configuration unit.
/// group and version are not part of it, so two schemas sharing a kind collide.
pub fn key(kind: &str, namespace: &str, name: &str) -> String {
    format!("{kind}/{namespace}/{name}")
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Hash, Debug, Default, Clone)]
#[serde(default)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new<S>(group: S, version: S, kind: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}/{}", CORE_GROUP, self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

impl FromStr for GroupVersionKind {
    type Err = GvkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(version), Some(kind), None)
                if !version.is_empty() && !kind.is_empty() =>
            {
                let group = if group == CORE_GROUP { "" } else { group };
                Ok(Self::new(group, version, kind))
            }
            _ => Err(GvkParseError(s.to_owned())),
        }
    }
}

/// metadata attached to each configuration unit
#[derive(Deserialize, Serialize, PartialEq, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct Meta {
    #[serde(rename = "type")]
    pub group_version_kind: GroupVersionKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// suffix of the fully qualified name, not part of the key
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
    /// opaque revision assigned by the store, empty if never stored.
    /// only ever compared for equality.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creation_timestamp: String,
}

impl Meta {
    pub fn new<S>(group_version_kind: GroupVersionKind, name: S, namespace: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            group_version_kind,
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// provide builder pattern setter
    pub fn set_labels<T: Into<String>>(mut self, labels: Vec<(T, T)>) -> Self {
        self.labels = labels
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    pub fn set_annotations<T: Into<String>>(mut self, annotations: Vec<(T, T)>) -> Self {
        self.annotations = annotations
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    pub fn key(&self) -> String {
        key(&self.group_version_kind.kind, &self.namespace, &self.name)
    }

    /// true if the store has assigned a revision
    pub fn is_stored(&self) -> bool {
        !self.resource_version.is_empty()
    }

    pub fn same_revision(&self, other: &Meta) -> bool {
        self.resource_version == other.resource_version
    }
}

/// configuration unit: metadata plus an opaque payload
#[derive(Debug, Default)]
pub struct Config {
    pub meta: Meta,
    /// absent if never populated or if a copy could not clone it
    pub spec: Option<Box<dyn ConfigSpec>>,
}

impl Config {
    pub fn new<S>(meta: Meta, spec: S) -> Self
    where
        S: ConfigSpec,
    {
        Self {
            meta,
            spec: Some(Box::new(spec)),
        }
    }

    pub fn key(&self) -> String {
        self.meta.key()
    }

    pub fn spec(&self) -> Option<&dyn ConfigSpec> {
        self.spec.as_deref()
    }

    pub fn spec_mut(&mut self) -> Option<&mut (dyn ConfigSpec + 'static)> {
        self.spec.as_deref_mut()
    }

    /// copy sharing no storage with self.
    /// labels and annotations are always copied even when the spec can't be.
    pub fn deep_copy(&self) -> Config {
        let meta = &self.meta;
        Config {
            meta: Meta {
                group_version_kind: meta.group_version_kind.clone(),
                name: meta.name.clone(),
                namespace: meta.namespace.clone(),
                domain: meta.domain.clone(),
                labels: copy_map(&meta.labels),
                annotations: copy_map(&meta.annotations),
                resource_version: meta.resource_version.clone(),
                creation_timestamp: meta.creation_timestamp.clone(),
            },
            spec: self.spec.as_deref().and_then(spec::deep_copy),
        }
    }
}

fn copy_map(source: &HashMap<String, String>) -> HashMap<String, String> {
    let mut map = HashMap::with_capacity(source.len());
    for (key, value) in source {
        map.insert(key.clone(), value.clone());
    }
    map
}
