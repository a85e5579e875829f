//! Realm configuration

use serde::{Deserialize, Serialize};

/// Host features the synthesis strategies depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostCapabilities {
    /// Construction with an explicit construction target (`reflect_construct`)
    pub reflective_construct: bool,
    /// Derived declared classes and extension of the base callable type
    pub declared_extension: bool,
}

impl HostCapabilities {
    /// Everything available
    pub fn full() -> Self {
        Self {
            reflective_construct: true,
            declared_extension: true,
        }
    }

    /// Reflective construction only; declared-type extension is rejected
    pub fn restricted() -> Self {
        Self {
            reflective_construct: true,
            declared_extension: false,
        }
    }

    /// Neither reflective construction nor declared-type extension
    pub fn legacy() -> Self {
        Self {
            reflective_construct: false,
            declared_extension: false,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// Options for creating a Realm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmOptions {
    /// Available host features
    pub capabilities: HostCapabilities,
    /// Maximum nesting of call/construct
    pub max_call_depth: usize,
}

impl Default for RealmOptions {
    fn default() -> Self {
        Self {
            capabilities: HostCapabilities::full(),
            max_call_depth: 512,
        }
    }
}

impl RealmOptions {
    /// Default options with specific capabilities
    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        Self {
            capabilities,
            ..Default::default()
        }
    }

    /// Realm that rejects declared-type extension
    pub fn restricted() -> Self {
        Self::with_capabilities(HostCapabilities::restricted())
    }

    /// Realm with neither reflective construction nor declared-type extension
    pub fn legacy() -> Self {
        Self::with_capabilities(HostCapabilities::legacy())
    }
}
