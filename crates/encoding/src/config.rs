//! TOML configuration for codecs and registries.
//!
//! ```toml
//! [codec]
//! max-list-len = 65536
//! max-string-len = 1048576
//! max-blob-len = 16777216
//!
//! [registry]
//! factory-duplicates = "reject"
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use serde::Deserialize;

use crate::factory::DuplicatePolicy;

/// Configuration load failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to parse MAL config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("invalid MAL config: {0}")]
	Invalid(String),
}

/// Root of the MAL configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MalConfig {
	pub codec: CodecLimits,
	pub registry: RegistryConfig,
}

impl MalConfig {
	pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		let limits = &self.codec;
		for (key, value) in [
			("codec.max-list-len", limits.max_list_len),
			("codec.max-string-len", limits.max_string_len),
			("codec.max-blob-len", limits.max_blob_len),
		] {
			if value == 0 {
				return Err(ConfigError::Invalid(format!("{key} must be positive")));
			}
		}
		Ok(())
	}
}

/// Upper bounds a decoder enforces on lengths read from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CodecLimits {
	pub max_list_len: usize,
	pub max_string_len: usize,
	pub max_blob_len: usize,
}

impl Default for CodecLimits {
	fn default() -> Self {
		Self {
			max_list_len: 1 << 16,
			max_string_len: 1 << 20,
			max_blob_len: 1 << 24,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegistryConfig {
	/// How the element factory registry treats a second factory for a short
	/// form that is already registered.
	pub factory_duplicates: DuplicatePolicy,
}
