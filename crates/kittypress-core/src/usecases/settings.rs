//! Settings shared by the compress and decompress pipelines

use std::path::PathBuf;

use crate::config::Config;

/// Pipeline settings derived from [`Config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Directory holding staging areas, archives and extraction output
    pub cache_dir: PathBuf,
    /// Archive extension, without the dot
    pub extension: String,
    /// MIME type for files created in destination folders
    pub mime_type: String,
    /// Authority whose `primary:` identifiers allow parent inference
    pub primary_authority: String,
}

impl PipelineSettings {
    /// Extracts the pipeline settings from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_dir: Config::expand_path(&config.staging.cache_dir),
            extension: config.archive.extension.clone(),
            mime_type: config.archive.mime_type.clone(),
            primary_authority: config.destination.primary_authority.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn settings_follow_config() {
        let config = ConfigBuilder::new()
            .staging_cache_dir(PathBuf::from("/tmp/kp"))
            .archive_extension("kpz")
            .destination_primary_authority("local")
            .build();
        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/kp"));
        assert_eq!(settings.extension, "kpz");
        assert_eq!(settings.mime_type, "application/octet-stream");
        assert_eq!(settings.primary_authority, "local");
    }
}
