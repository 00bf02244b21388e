//! Generator configuration
//!
//! Every component takes its settings from a [`GeneratorConfig`] handed to its
//! constructor. The configuration can be loaded from a TOML file:
//!
//! ```toml
//! subsystem_prefixes = ["net/ipv4", "net/sctp"]
//! default_group = "misc"
//! target_syscalls = ["setsockopt", "sendmsg"]
//! spec_extension = ".syz"
//! model_extension = ".json"
//! header_markers = ["hdr", "header"]
//! log_level = "debug"
//! ```
//!
//! Missing keys fall back to their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration shared by the specification emitter, the packet model
/// builder and the binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Ordered origin-path prefixes; the first matching prefix names the group
    #[serde(default = "default_subsystem_prefixes")]
    pub subsystem_prefixes: Vec<String>,

    /// Group for resources whose origin matches no prefix
    #[serde(default = "default_group")]
    pub default_group: String,

    /// Syscalls allowed to appear in example usage blocks
    #[serde(default = "default_target_syscalls")]
    pub target_syscalls: Vec<String>,

    /// Extension of generated specification files
    #[serde(default = "default_spec_extension")]
    pub spec_extension: String,

    /// Extension of generated packet model files
    #[serde(default = "default_model_extension")]
    pub model_extension: String,

    /// Case-insensitive name fragments marking a struct as a packet header
    #[serde(default = "default_header_markers")]
    pub header_markers: Vec<String>,

    /// Default tracing level (overridden by `RUST_LOG` and `--debug`)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_subsystem_prefixes() -> Vec<String> {
    [
        "net/ipv4",
        "net/ipv6",
        "net/sctp",
        "net/dccp",
        "net/netfilter",
        "drivers/net",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_group() -> String {
    "misc".to_string()
}

fn default_target_syscalls() -> Vec<String> {
    [
        "setsockopt",
        "getsockopt",
        "sendmsg",
        "recvmsg",
        "sendto",
        "recvfrom",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_spec_extension() -> String {
    ".syz".to_string()
}

fn default_model_extension() -> String {
    ".json".to_string()
}

fn default_header_markers() -> Vec<String> {
    vec!["hdr".to_string(), "header".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            subsystem_prefixes: default_subsystem_prefixes(),
            default_group: default_group(),
            target_syscalls: default_target_syscalls(),
            spec_extension: default_spec_extension(),
            model_extension: default_model_extension(),
            header_markers: default_header_markers(),
            log_level: default_log_level(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse generator configuration TOML")
    }

    /// Whether example usage blocks may use `syscall_name`
    ///
    /// Variant suffixes are ignored: `setsockopt$sctp_info` is allowed when
    /// `setsockopt` is a target.
    pub fn is_target_syscall(&self, syscall_name: &str) -> bool {
        let base = syscall_name.split('$').next().unwrap_or(syscall_name);
        self.target_syscalls.iter().any(|s| s == base)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(idx) = self.subsystem_prefixes.iter().position(|p| p.is_empty()) {
            return Err(format!("subsystem_prefixes[{}] must not be empty", idx));
        }

        if self.default_group.is_empty() {
            return Err("default_group must not be empty".to_string());
        }

        if self.subsystem_prefixes.contains(&self.default_group) {
            return Err(format!(
                "default_group '{}' collides with a subsystem prefix",
                self.default_group
            ));
        }

        for (key, ext) in [
            ("spec_extension", &self.spec_extension),
            ("model_extension", &self.model_extension),
        ] {
            if !ext.starts_with('.') {
                return Err(format!("{} must start with '.', got '{}'", key, ext));
            }
        }

        Ok(())
    }
}
