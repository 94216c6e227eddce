//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file_extractor.extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "FileExtractor.extensions must not be empty".into(),
            ));
        }
        if self
            .file_extractor
            .extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.').is_empty())
        {
            return Err(ConfigError::ValidationError(
                "FileExtractor.extensions contains an empty extension".into(),
            ));
        }
        if self.analyzer.workers == 0 {
            return Err(ConfigError::ValidationError(
                "AnalyzerSettings.workers must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.analyzer.score_threshold) {
            return Err(ConfigError::ValidationError(
                "AnalyzerSettings.score_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.analyzer.nms_threshold) {
            return Err(ConfigError::ValidationError(
                "AnalyzerSettings.nms_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.logging.format != "pretty" && self.logging.format != "json" {
            return Err(ConfigError::ValidationError(format!(
                "Logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.analyzer.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_validate_rejects_empty_extensions() {
        let mut config = Config::default();
        config.file_extractor.extensions.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("extensions"));

        config.file_extractor.extensions = vec![".".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("empty extension"));
    }

    #[test]
    fn test_validate_rejects_thresholds_out_of_range() {
        let mut config = Config::default();
        config.analyzer.score_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("score_threshold"));

        config.analyzer.score_threshold = 0.9;
        config.analyzer.nms_threshold = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nms_threshold"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
