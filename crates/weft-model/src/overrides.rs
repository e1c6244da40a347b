//! Override configuration (`weft.toml`).
//!
//! Global settings plus two tables keyed by canonical foreign name: type
//! overrides for structs, enums and opaque classes, and callable overrides
//! for functions and delegate typedefs.
//!
//! ```toml
//! [settings]
//! namespace = "SFML.Native"
//! class = "Native"
//! library = "csfml-window"
//!
//! [types.sfVector2f]
//! name = "Vector2f"
//! equality = true
//!
//! [callables.sfWindow_create.parameters]
//! "-1" = "IntPtr"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// The complete override configuration for one generation run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverrideConfig {
    /// Global settings.
    #[serde(default)]
    pub settings: Settings,
    /// Type overrides by canonical name.
    #[serde(default)]
    pub types: BTreeMap<String, TypeOverride>,
    /// Function and delegate overrides by canonical name.
    #[serde(default)]
    pub callables: BTreeMap<String, CallableOverride>,
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Target namespace (required).
    #[serde(default)]
    pub namespace: String,
    /// Name of the static class holding the extern entry points (required).
    #[serde(default)]
    pub class: String,
    /// Native library reference passed to the import attribute (required).
    #[serde(default)]
    pub library: String,
    /// Calling convention used by every entry point and delegate.
    #[serde(default)]
    pub calling_convention: CallingConvention,
    /// Field name prefix marking a struct field as private by convention.
    #[serde(default = "default_private_prefix")]
    pub private_field_prefix: String,
    /// Typedef names that carry a one-byte boolean, in addition to `bool`
    /// and `_Bool`.
    #[serde(default)]
    pub boolean_types: Vec<String>,
}

fn default_private_prefix() -> String {
    "_private_".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            class: String::new(),
            library: String::new(),
            calling_convention: CallingConvention::default(),
            private_field_prefix: default_private_prefix(),
            boolean_types: Vec::new(),
        }
    }
}

/// Native calling convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallingConvention {
    #[default]
    Cdecl,
    StdCall,
    ThisCall,
    FastCall,
    Winapi,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::Cdecl => write!(f, "Cdecl"),
            CallingConvention::StdCall => write!(f, "StdCall"),
            CallingConvention::ThisCall => write!(f, "ThisCall"),
            CallingConvention::FastCall => write!(f, "FastCall"),
            CallingConvention::Winapi => write!(f, "Winapi"),
        }
    }
}

/// Host visibility of an emitted type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Internal => write!(f, "internal"),
        }
    }
}

/// Override for one struct, enum or opaque class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOverride {
    /// Host type name replacing the cleaned canonical name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Make every field and accessor immutable.
    #[serde(default)]
    pub readonly: bool,
    /// Synthesize equality and hashing members.
    #[serde(default)]
    pub equality: bool,
    /// Emit the enum as a flags enum.
    #[serde(default)]
    pub flags: bool,
    /// Synthesize accessor properties for struct fields.
    #[serde(default = "default_true")]
    pub properties: bool,
    /// Foreign member name → host member name.
    #[serde(default)]
    pub members: BTreeMap<String, String>,
    /// Foreign field name → verbatim host type.
    #[serde(default)]
    pub member_types: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for TypeOverride {
    fn default() -> Self {
        Self {
            name: None,
            visibility: Visibility::Public,
            readonly: false,
            equality: false,
            flags: false,
            properties: true,
            members: BTreeMap::new(),
            member_types: BTreeMap::new(),
        }
    }
}

impl TypeOverride {
    pub fn is_internal(&self) -> bool {
        self.visibility == Visibility::Internal
    }

    /// Host name for a member, if renamed.
    pub fn member_name(&self, foreign: &str) -> Option<&str> {
        self.members.get(foreign).map(String::as_str)
    }

    /// Verbatim host type for a field, if overridden.
    pub fn member_type(&self, foreign: &str) -> Option<&str> {
        self.member_types.get(foreign).map(String::as_str)
    }
}

/// Position inside a callable signature that an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterOverrideTarget {
    /// Zero-based parameter index.
    Parameter(usize),
    /// The return value (written `-1` in the configuration file).
    ReturnValue,
}

impl FromStr for ParameterOverrideTarget {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "-1" {
            return Ok(ParameterOverrideTarget::ReturnValue);
        }
        s.parse::<usize>()
            .map(ParameterOverrideTarget::Parameter)
            .map_err(|_| ModelError::InvalidOverride {
                detail: format!("'{s}' is neither a parameter index nor -1"),
            })
    }
}

impl fmt::Display for ParameterOverrideTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterOverrideTarget::Parameter(index) => write!(f, "{index}"),
            ParameterOverrideTarget::ReturnValue => write!(f, "-1"),
        }
    }
}

/// Override for one function or delegate typedef.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCallableOverride")]
pub struct CallableOverride {
    /// Host name replacing the cleaned canonical name.
    pub name: Option<String>,
    /// Verbatim host types by position.
    pub types: BTreeMap<ParameterOverrideTarget, String>,
    /// Keys of the `parameters` table that are not valid positions.
    pub malformed_keys: Vec<String>,
}

#[derive(Deserialize)]
struct RawCallableOverride {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parameters: BTreeMap<String, String>,
}

impl From<RawCallableOverride> for CallableOverride {
    fn from(raw: RawCallableOverride) -> Self {
        let mut types = BTreeMap::new();
        let mut malformed_keys = Vec::new();
        for (key, host) in raw.parameters {
            match key.parse::<ParameterOverrideTarget>() {
                Ok(target) => {
                    types.insert(target, host);
                }
                Err(_) => malformed_keys.push(key),
            }
        }
        Self {
            name: raw.name,
            types,
            malformed_keys,
        }
    }
}

impl CallableOverride {
    /// Verbatim host type for a position, if overridden.
    pub fn type_for(&self, target: ParameterOverrideTarget) -> Option<&str> {
        self.types.get(&target).map(String::as_str)
    }

    /// Parameter indices that do not exist in a signature with
    /// `parameter_count` parameters.
    pub fn out_of_range(&self, parameter_count: usize) -> Vec<usize> {
        self.types
            .keys()
            .filter_map(|target| match target {
                ParameterOverrideTarget::Parameter(i) if *i >= parameter_count => Some(*i),
                _ => None,
            })
            .collect()
    }
}

impl OverrideConfig {
    /// Parse an override configuration from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let config: OverrideConfig = toml::from_str(input)?;
        Ok(config)
    }

    /// Parse an override configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn type_override(&self, name: &str) -> Option<&TypeOverride> {
        self.types.get(name)
    }

    pub fn callable_override(&self, name: &str) -> Option<&CallableOverride> {
        self.callables.get(name)
    }

    /// Whether a canonical name is configured as boolean-semantic.
    pub fn is_boolean_type(&self, name: &str) -> bool {
        self.settings.boolean_types.iter().any(|b| b == name)
    }
}
