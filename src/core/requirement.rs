//! Package requirements.
//!
//! A PackageRequirement says that a named dependency is satisfied by a
//! foreign manifest (a `Cargo.toml` or `vcpkg.json`) plus the options the
//! foreign resolver needs to interpret it. Declaring one never touches the
//! filesystem.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::BridgeError;

/// Foreign manifest formats Ferry knows how to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// A Rust crate described by `Cargo.toml`
    Cargo,
    /// A vcpkg manifest-mode project described by `vcpkg.json`
    Vcpkg,
}

impl ManifestKind {
    /// Infer the manifest kind from a file name.
    pub fn infer(path: &Path) -> Option<Self> {
        match path.file_name()?.to_str()? {
            "Cargo.toml" => Some(ManifestKind::Cargo),
            "vcpkg.json" => Some(ManifestKind::Vcpkg),
            _ => None,
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestKind::Cargo => write!(f, "cargo"),
            ManifestKind::Vcpkg => write!(f, "vcpkg"),
        }
    }
}

impl FromStr for ManifestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cargo" => Ok(ManifestKind::Cargo),
            "vcpkg" => Ok(ManifestKind::Vcpkg),
            other => Err(format!("unknown manifest kind `{}` (expected cargo or vcpkg)", other)),
        }
    }
}

/// Build profile passed to the foreign tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Debug,
    Release,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Debug => "debug",
            Profile::Release => "release",
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" | "dev" => Ok(Profile::Debug),
            "release" => Ok(Profile::Release),
            other => Err(format!("unknown profile `{}` (expected debug or release)", other)),
        }
    }
}

/// How a library artifact is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Static,
    Dynamic,
}

impl FromStr for Linkage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Linkage::Static),
            "dynamic" | "shared" => Ok(Linkage::Dynamic),
            other => Err(format!("unknown linkage `{}` (expected static or dynamic)", other)),
        }
    }
}

/// Options forwarded to the foreign resolver.
///
/// Options whose meaning is shared by every supported ecosystem are typed;
/// anything else lands in `extra` and is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequirementOptions {
    /// Manifest format override (otherwise inferred from the file name)
    pub kind: Option<ManifestKind>,

    /// Features to enable in the foreign package
    pub features: Vec<String>,

    /// Whether the package's default features are enabled
    pub default_features: bool,

    /// Build profile
    pub profile: Profile,

    /// Target triple (cargo) or triplet (vcpkg)
    pub target: Option<String>,

    /// Preferred linkage of the produced library
    pub linkage: Option<Linkage>,

    /// Library names to link instead of the discovered ones
    pub libs: Option<Vec<String>>,

    /// Whether the resolver may run the foreign tool to fetch and build
    pub build: bool,

    /// Open-ended pass-through options
    pub extra: BTreeMap<String, String>,
}

impl Default for RequirementOptions {
    fn default() -> Self {
        RequirementOptions {
            kind: None,
            features: Vec::new(),
            default_features: true,
            profile: Profile::Debug,
            target: None,
            linkage: None,
            libs: None,
            build: true,
            extra: BTreeMap::new(),
        }
    }
}

impl RequirementOptions {
    /// Set the build profile.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Set whether the foreign tool may be invoked.
    pub fn with_build(mut self, build: bool) -> Self {
        self.build = build;
        self
    }

    /// Add a pass-through option.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Build typed options from a loosely-typed TOML table.
    ///
    /// Recognized keys are type-checked. Unrecognized keys must hold a
    /// scalar and are kept verbatim in `extra`.
    pub fn from_table(
        requirement: &str,
        table: BTreeMap<String, toml::Value>,
    ) -> Result<Self, BridgeError> {
        let mut options = RequirementOptions::default();

        for (key, value) in table {
            let invalid = |reason: String| BridgeError::InvalidOption {
                requirement: requirement.to_string(),
                key: key.clone(),
                reason,
            };

            match key.as_str() {
                "" => return Err(invalid("option keys must be non-empty".to_string())),
                "kind" => options.kind = Some(parse_str(&value).map_err(&invalid)?),
                "features" => options.features = string_list(&value).map_err(&invalid)?,
                "default-features" | "default_features" => {
                    options.default_features = value
                        .as_bool()
                        .ok_or_else(|| invalid("expected a boolean".to_string()))?
                }
                "profile" => options.profile = parse_str(&value).map_err(&invalid)?,
                "target" | "triplet" => {
                    options.target = Some(
                        value
                            .as_str()
                            .ok_or_else(|| invalid("expected a string".to_string()))?
                            .to_string(),
                    )
                }
                "linkage" => options.linkage = Some(parse_str(&value).map_err(&invalid)?),
                "libs" => options.libs = Some(string_list(&value).map_err(&invalid)?),
                "build" => {
                    options.build = value
                        .as_bool()
                        .ok_or_else(|| invalid("expected a boolean".to_string()))?
                }
                _ => {
                    let text = scalar_to_string(&value).ok_or_else(|| {
                        invalid("pass-through options must be strings, numbers or booleans".to_string())
                    })?;
                    options.extra.insert(key.clone(), text);
                }
            }
        }

        Ok(options)
    }

    /// Check the invariants the Declarator enforces on options.
    pub fn validate(&self, requirement: &str) -> Result<(), BridgeError> {
        if let Some(key) = self.extra.keys().find(|k| k.trim().is_empty()) {
            return Err(BridgeError::InvalidOption {
                requirement: requirement.to_string(),
                key: key.clone(),
                reason: "option keys must be non-empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_str<T: FromStr<Err = String>>(value: &toml::Value) -> Result<T, String> {
    value
        .as_str()
        .ok_or_else(|| "expected a string".to_string())?
        .parse()
}

fn string_list(value: &toml::Value) -> Result<Vec<String>, String> {
    let array = value
        .as_array()
        .ok_or_else(|| "expected an array of strings".to_string())?;
    array
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| "expected an array of strings".to_string())
        })
        .collect()
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A named reference to a package described by a foreign manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequirement {
    name: String,
    manifest_path: PathBuf,
    options: RequirementOptions,
}

impl PackageRequirement {
    /// Create a requirement after validating its name and option keys.
    pub fn new(
        name: impl Into<String>,
        manifest_path: impl Into<PathBuf>,
        options: RequirementOptions,
    ) -> Result<Self, BridgeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BridgeError::EmptyName { what: "requirement" });
        }
        options.validate(&name)?;

        Ok(PackageRequirement {
            name,
            manifest_path: manifest_path.into(),
            options,
        })
    }

    /// Get the requirement name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the foreign manifest location.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Get the resolver options.
    pub fn options(&self) -> &RequirementOptions {
        &self.options
    }

    /// The manifest kind, explicit or inferred from the file name.
    pub fn manifest_kind(&self) -> Option<ManifestKind> {
        self.options
            .kind
            .or_else(|| ManifestKind::infer(&self.manifest_path))
    }
}

impl fmt::Display for PackageRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.manifest_path.display())
    }
}
