use std::fmt;

use super::ConfigSpec;
use super::LegacySpec;
use super::ReflectSpec;

/// representation family of a spec, borrowed through its capability
#[derive(Clone, Copy)]
pub enum Family<'a> {
    Reflect(&'a dyn ReflectSpec),
    Legacy(&'a dyn LegacySpec),
    Generic(&'a dyn ConfigSpec),
}

impl Family<'_> {
    pub fn kind(&self) -> FamilyKind {
        match self {
            Family::Reflect(_) => FamilyKind::Reflect,
            Family::Legacy(_) => FamilyKind::Legacy,
            Family::Generic(_) => FamilyKind::Generic,
        }
    }
}

impl fmt::Debug for Family<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Family({})", self.kind())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilyKind {
    Reflect,
    Legacy,
    Generic,
}

impl fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FamilyKind::Reflect => "reflect",
            FamilyKind::Legacy => "legacy",
            FamilyKind::Generic => "generic",
        };
        f.write_str(label)
    }
}

/// Classify spec by capability: reflect, then legacy, then generic.
/// Every operation goes through here so they all agree on the order.
pub fn classify(spec: &dyn ConfigSpec) -> Family<'_> {
    if let Some(message) = spec.as_reflect() {
        return Family::Reflect(message);
    }
    if let Some(message) = spec.as_legacy() {
        return Family::Legacy(message);
    }
    Family::Generic(spec)
}
