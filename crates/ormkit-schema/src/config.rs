//! Schema finalization configuration.

/// Engine default length for bounded strings without an explicit length.
pub const DEFAULT_STRING_LENGTH: usize = 255;

/// Name given to synthesized primary keys.
pub const DEFAULT_PRIMARY_KEY_NAME: &str = "id";

/// Suffix appended to defaulted foreign key names.
pub const DEFAULT_FOREIGN_KEY_SUFFIX: &str = "Id";

/// Conventions applied while finalizing a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Name of the primary key synthesized for entities that declare none.
    pub primary_key_name: String,

    /// Suffix of defaulted foreign key names (`managerId`, `userId`).
    pub foreign_key_suffix: String,

    /// Storage length used for fixed-length strings with no explicit or a
    /// non-finite length.
    pub string_storage_length: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            primary_key_name: DEFAULT_PRIMARY_KEY_NAME.to_string(),
            foreign_key_suffix: DEFAULT_FOREIGN_KEY_SUFFIX.to_string(),
            string_storage_length: DEFAULT_STRING_LENGTH,
        }
    }
}

impl SchemaConfig {
    /// Create a configuration with the default conventions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the synthesized primary key name.
    pub fn with_primary_key_name(mut self, name: impl Into<String>) -> Self {
        self.primary_key_name = name.into();
        self
    }

    /// Set the foreign key suffix.
    pub fn with_foreign_key_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.foreign_key_suffix = suffix.into();
        self
    }

    /// Set the default string storage length.
    pub fn with_string_storage_length(mut self, length: usize) -> Self {
        self.string_storage_length = length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert_eq!(config.primary_key_name, "id");
        assert_eq!(config.foreign_key_suffix, "Id");
        assert_eq!(config.string_storage_length, 255);
    }

    #[test]
    fn test_config_builder() {
        let config = SchemaConfig::new()
            .with_primary_key_name("uid")
            .with_foreign_key_suffix("Uid")
            .with_string_storage_length(64);

        assert_eq!(config.primary_key_name, "uid");
        assert_eq!(config.foreign_key_suffix, "Uid");
        assert_eq!(config.string_storage_length, 64);
    }
}
