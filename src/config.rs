// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::Path;

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::dag::balanced::DEFAULT_FAN_OUT;
use crate::dag::chunker::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, IoContext as _};
use crate::utils::multihash::MultihashCode;

/// Largest leaf accepted by bitswap peers.
pub const MAX_CHUNK_SIZE: u64 = 1 << 20;

/// Knobs of a conversion job. Two jobs with equal `chunk_size`, `fan_out` and
/// `hash` produce identical CARs for identical input.
///
/// ```toml
/// chunk_size = 1048576
/// fan_out = 1024
/// hash = "blake2b-256"
/// max_car_size = 33822867456
/// verify_file_leaves = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    #[default(DEFAULT_CHUNK_SIZE)]
    pub chunk_size: u64,
    #[default(DEFAULT_FAN_OUT)]
    pub fan_out: usize,
    pub hash: MultihashCode,
    /// Fail after size estimation, before writing, if the CAR would be larger.
    pub max_car_size: Option<u64>,
    /// Re-hash file-referenced leaves while serializing to catch sources
    /// modified during the job.
    pub verify_file_leaves: bool,
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "chunk size must be within 1..={MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if self.fan_out == 0 {
            return Err(Error::InvalidConfig("fan-out must be positive".into()));
        }
        Ok(())
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let toml_str = std::fs::read_to_string(path)
            .io_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&toml_str)
    }

    pub fn with_package(mut self, package: PackageType) -> Self {
        self.max_car_size = Some(package.required_size());
        self
    }
}

/// Filecoin sector-sized packages a CAR is prepared for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::Display,
)]
pub enum PackageType {
    #[serde(rename = "32g")]
    #[strum(serialize = "32g")]
    Fcp32G,
}

impl PackageType {
    /// Bytes available to the CAR in a package of this type.
    pub const fn required_size(self) -> u64 {
        match self {
            // 31.5 GiB
            Self::Fcp32G => 33_822_867_456,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn defaults() {
        let config = ConvertConfig::default();
        assert_eq!(config.chunk_size, 1 << 20);
        assert_eq!(config.fan_out, 1024);
        assert_eq!(config.hash, MultihashCode::Blake2b256);
        assert_eq!(config.max_car_size, None);
        config.validate().unwrap();
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ConvertConfig::from_toml("").unwrap(), ConvertConfig::default());
    }

    #[test]
    fn parse_toml() {
        let config = ConvertConfig::from_toml(
            r#"
chunk_size = 262144
fan_out = 174
hash = "sha2-256"
max_car_size = 1000
"#,
        )
        .unwrap();
        assert_eq!(
            config,
            ConvertConfig {
                chunk_size: 262144,
                fan_out: 174,
                hash: MultihashCode::Sha2_256,
                max_car_size: Some(1000),
                verify_file_leaves: false,
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        for toml_str in [
            "chunk_size = 0",
            "chunk_size = 1048577",
            "fan_out = 0",
            "hash = \"md5\"",
            "chunk_sise = 12",
        ] {
            assert!(
                matches!(ConvertConfig::from_toml(toml_str), Err(Error::InvalidConfig(_))),
                "{toml_str}"
            );
        }
    }

    #[test]
    fn package_type() {
        let package = PackageType::from_str("32g").unwrap();
        assert_eq!(package, PackageType::Fcp32G);
        assert_eq!(package.to_string(), "32g");
        assert_eq!(package.required_size(), 33822867456);
        assert!(PackageType::from_str("64g").is_err());
        assert_eq!(
            ConvertConfig::default().with_package(package).max_car_size,
            Some(33822867456)
        );
    }

    #[test]
    fn load_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fan_out = 2\n").unwrap();
        let config = ConvertConfig::load(file.path()).unwrap();
        assert_eq!(config.fan_out, 2);
        assert!(matches!(
            ConvertConfig::load(Path::new("/nonexistent/fcp.toml")),
            Err(Error::Io { .. })
        ));
    }
}
