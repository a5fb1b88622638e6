//! Bridge configuration file parsing.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::augmenter::DEFAULT_MARKER_ATTRIBUTE;
use super::members::{MemberBinding, MemberCatalog};
use super::resolver::DEFAULT_IGNORED_NAMES;
use crate::runner::ds::value::{JsNumberType, JsValue};

/// Error type for bridge setup.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Bridge config error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Bridge config error: {0}")]
    Invalid(String),
    #[error("Unknown bridging member '{0}'")]
    UnknownMember(String),
}

/// One bridging member as written in the config file. Exactly one of
/// `native`, `alias` and `value` must be present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberConfig {
    pub name: String,
    #[serde(default)]
    pub native: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub value: Option<toml::Value>,
}

impl MemberConfig {
    pub fn native(name: impl Into<String>, native: impl Into<String>) -> Self {
        MemberConfig {
            name: name.into(),
            native: Some(native.into()),
            alias: None,
            value: None,
        }
    }

    fn to_binding(&self, catalog: &MemberCatalog) -> Result<MemberBinding, BridgeError> {
        match (&self.native, &self.alias, &self.value) {
            (Some(native), None, None) => catalog
                .get(native)
                .map(|behavior| MemberBinding::native(self.name.clone(), behavior.clone()))
                .ok_or_else(|| BridgeError::UnknownMember(native.clone())),
            (None, Some(alias), None) => Ok(MemberBinding::alias(self.name.clone(), alias.clone())),
            (None, None, Some(value)) => {
                Ok(MemberBinding::value(self.name.clone(), toml_to_js_value(&self.name, value)?))
            }
            _ => Err(BridgeError::Invalid(format!(
                "member '{}' needs exactly one of `native`, `alias` or `value`",
                self.name
            ))),
        }
    }
}

fn toml_to_js_value(member: &str, value: &toml::Value) -> Result<JsValue, BridgeError> {
    match value {
        toml::Value::String(s) => Ok(JsValue::String(s.clone())),
        toml::Value::Integer(i) => Ok(JsValue::Number(JsNumberType::Integer(*i))),
        toml::Value::Float(f) => Ok(JsValue::Number(JsNumberType::Float(*f))),
        toml::Value::Boolean(b) => Ok(JsValue::Boolean(*b)),
        other => Err(BridgeError::Invalid(format!(
            "member '{}' has unsupported value type {}",
            member,
            other.type_str()
        ))),
    }
}

/// Complete bridge configuration.
///
/// Expected format:
/// ```toml
/// marker = "__moccaccino_bridged__"
/// ignore = ["Object"]
/// heap_limit = 65536
///
/// [[members]]
/// name = "test"
/// native = "test"
///
/// [[members]]
/// name = "kind"
/// alias = "Widget"
///
/// [[members]]
/// name = "bridgeVersion"
/// value = "1.0"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Name of the sentinel property marking augmented prototypes.
    pub marker: String,
    /// Global names that are never resolved to native types.
    pub ignore: Vec<String>,
    /// Heap cap for the bridge's global context, in bytes.
    pub heap_limit: Option<usize>,
    pub members: Vec<MemberConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            marker: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            ignore: DEFAULT_IGNORED_NAMES.iter().map(|s| s.to_string()).collect(),
            heap_limit: None,
            members: vec![MemberConfig::native("test", "test")],
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let content = fs::read_to_string(path).map_err(|source| BridgeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.marker.trim().is_empty() {
            return Err(BridgeError::Invalid("marker must not be empty".to_string()));
        }
        for (i, member) in self.members.iter().enumerate() {
            if member.name == self.marker {
                return Err(BridgeError::Invalid(format!(
                    "member '{}' collides with the marker attribute",
                    member.name
                )));
            }
            if self.members[..i].iter().any(|m| m.name == member.name) {
                return Err(BridgeError::Invalid(format!(
                    "member '{}' is defined twice",
                    member.name
                )));
            }
        }
        Ok(())
    }

    /// Resolves member definitions against `catalog`.
    pub fn member_bindings(&self, catalog: &MemberCatalog) -> Result<Vec<MemberBinding>, BridgeError> {
        self.members.iter().map(|m| m.to_binding(catalog)).collect()
    }
}
