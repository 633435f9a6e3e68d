//! Synthesis configuration supplied by the caller.

use crate::diagnostics::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which concrete immutable container types the materializer produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFamily {
    /// Engine-internal frozen containers backed by `Arc` and `indexmap`.
    #[default]
    Frozen,
    /// Persistent containers from the `im` crate.
    Persistent,
}

/// Governance policy: report uses of builder features as warnings or errors.
///
/// `None` means the feature is used silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagUsage {
    pub builder: Option<Severity>,
    pub singular: Option<Severity>,
    pub default: Option<Severity>,
}

/// Extra irregular plural → singular pairs, checked before the built-in table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub irregulars: BTreeMap<String, String>,
}

impl NamingConfig {
    pub fn with_irregular(mut self, plural: &str, singular: &str) -> Self {
        self.irregulars
            .insert(plural.to_ascii_lowercase(), singular.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Infer singular method names for singular parameters. When disabled
    /// every singular parameter needs an explicit singular name.
    pub infer_singular_names: bool,
    pub collection_family: CollectionFamily,
    pub flag_usage: FlagUsage,
    pub naming: NamingConfig,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            infer_singular_names: true,
            collection_family: CollectionFamily::Frozen,
            flag_usage: FlagUsage::default(),
            naming: NamingConfig::default(),
        }
    }
}

impl SynthConfig {
    pub fn with_family(mut self, family: CollectionFamily) -> Self {
        self.collection_family = family;
        self
    }

    pub fn without_inference(mut self) -> Self {
        self.infer_singular_names = false;
        self
    }

    pub fn with_flag_usage(mut self, flag_usage: FlagUsage) -> Self {
        self.flag_usage = flag_usage;
        self
    }

    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }
}
