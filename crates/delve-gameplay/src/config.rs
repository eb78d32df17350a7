//! Physics configuration.
//!
//! Tunables for the movement core, stored as TOML. Every field has a default,
//! so a partial file only overrides what it names.

use std::fs;
use std::io;
use std::path::Path;

use delve_common::DEFAULT_CHUNK_SIZE;
use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::collision::CollisionTolerances;
use crate::tile_map::{SurfaceTable, TileMapBuilder};

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the file.
    #[error("Failed to access config file: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is outside its valid range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Movement core configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Chunk size in tiles
    pub chunk_size: IVec2,
    /// Collision pull-back and culling distances
    pub collision: CollisionTolerances,
    /// Friction and acceleration per tile type
    pub surfaces: SurfaceTable,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            collision: CollisionTolerances::default(),
            surfaces: SurfaceTable::default(),
        }
    }
}

impl PhysicsConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        info!("Loaded physics config from {}", path.display());
        Ok(config)
    }

    /// Loads a configuration file, falling back to defaults on any error.
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("Physics config not found, using defaults");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load physics config: {e}");
                Self::default()
            },
        }
    }

    /// Saves the configuration as pretty TOML, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        info!("Saved physics config to {}", path.display());
        Ok(())
    }

    /// Room builder for maps using the configured chunk size.
    #[must_use]
    pub const fn map_builder(&self) -> TileMapBuilder {
        TileMapBuilder::new(self.chunk_size)
    }

    /// Checks that every value is usable by the movement core.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size.x <= 0 || self.chunk_size.y <= 0 {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be positive, got {}",
                self.chunk_size
            )));
        }

        let collision = &self.collision;
        let distances = [
            ("terrain_epsilon", collision.terrain_epsilon),
            ("entity_epsilon", collision.entity_epsilon),
            ("entity_cull_radius", collision.entity_cull_radius),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        let surfaces = &self.surfaces;
        let factors = [
            ("friction", surfaces.friction),
            ("ice_friction", surfaces.ice_friction),
            ("speed_acceleration", surfaces.speed_acceleration),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PhysicsConfig::default();
        assert_eq!(config.chunk_size, IVec2::new(16, 16));
        assert_eq!(config.collision.terrain_epsilon, 0.01);
        assert_eq!(config.collision.entity_epsilon, 0.1);
        assert_eq!(config.collision.entity_cull_radius, 4.0);
        assert_eq!(config.surfaces.ice_friction, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PhysicsConfig::from_toml(
            r"
            [surfaces]
            ice_friction = 0.05
            ",
        )
        .expect("valid config");

        assert_eq!(config.surfaces.ice_friction, 0.05);
        assert_eq!(config.surfaces.friction, 2.0);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_invalid_chunk_size_rejected() {
        let result = PhysicsConfig::from_toml("chunk_size = [0, 16]");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_negative_epsilon_rejected() {
        let mut config = PhysicsConfig::default();
        config.collision.entity_epsilon = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_map_builder_uses_chunk_size() {
        let mut config = PhysicsConfig::default();
        config.chunk_size = IVec2::new(8, 4);
        let map = config
            .map_builder()
            .room(delve_common::WorldPosition::default(), IVec2::new(10, 6));
        assert_eq!(crate::tile_map::TileLookup::chunk_size(&map), IVec2::new(8, 4));
        assert_eq!(map.chunk_count(), 4);
    }

    #[test]
    fn test_malformed_toml() {
        let result = PhysicsConfig::from_toml("chunk_size = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("physics.toml");

        let mut config = PhysicsConfig::default();
        config.chunk_size = IVec2::new(32, 8);
        config.collision.entity_cull_radius = 6.0;
        config.save_to(&path).expect("save");

        let loaded = PhysicsConfig::load_from(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = PhysicsConfig::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(config, PhysicsConfig::default());
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = PhysicsConfig::load_from(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
