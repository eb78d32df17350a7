//! Error types for Delve.

use thiserror::Error;

use crate::config::ConfigError;
use crate::entity::EntityError;

/// Top-level error type for Delve operations.
#[derive(Debug, Error)]
pub enum DelveError {
    /// Entity lookup and spawn errors
    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Delve operations.
pub type DelveResult<T> = Result<T, DelveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityArena;
    use delve_common::EntityHandle;

    #[test]
    fn test_error_conversion() {
        fn lookup() -> DelveResult<()> {
            EntityArena::new().try_get(EntityHandle::new(2, 5))?;
            Ok(())
        }

        let err = lookup().expect_err("lookup fails");
        assert!(matches!(err, DelveError::Entity(EntityError::NotFound(_))));
        assert_eq!(err.to_string(), "Entity error: Entity not found: 2v5");
    }

    #[test]
    fn test_config_error_display() {
        let err = DelveError::from(ConfigError::Invalid("chunk_size".to_string()));
        assert_eq!(err.to_string(), "Config error: Invalid config: chunk_size");
    }
}
