//! Loading and validating [`AnalyticsConfig`] from TOML.

use std::path::Path;

use campus_fares_analytics_models::{AnalyticsConfig, SmoothingConfig};

use crate::AnalyticsError;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "CAMPUS_FARES_CONFIG";

/// Parses and validates a TOML configuration document.
///
/// # Errors
///
/// Returns [`AnalyticsError::Config`] if the document is malformed or any
/// value is out of range.
pub fn parse_config(toml_str: &str) -> Result<AnalyticsConfig, AnalyticsError> {
    let config: AnalyticsConfig = toml::from_str(toml_str).map_err(|e| AnalyticsError::Config {
        message: e.to_string(),
    })?;
    validate(&config)?;
    Ok(config)
}

/// Loads the configuration from `path`, or the defaults when `path` is
/// `None`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Config`] if the file cannot be read, parsed,
/// or validated.
pub fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig, AnalyticsError> {
    let Some(path) = path else {
        return Ok(AnalyticsConfig::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|e| AnalyticsError::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;

    let config = parse_config(&contents).map_err(|e| AnalyticsError::Config {
        message: format!("{}: {e}", path.display()),
    })?;
    log::info!("Loaded analytics config from {}", path.display());

    Ok(config)
}

/// Loads the configuration named by [`CONFIG_PATH_ENV`], falling back to
/// the defaults when the variable is unset.
///
/// # Errors
///
/// Returns [`AnalyticsError::Config`] if the named file is invalid.
pub fn load_config_from_env() -> Result<AnalyticsConfig, AnalyticsError> {
    let path = std::env::var_os(CONFIG_PATH_ENV).filter(|v| !v.is_empty());
    load_config(path.as_deref().map(Path::new))
}

/// Checks that every knob is in range.
///
/// # Errors
///
/// Returns [`AnalyticsError::Config`] naming the first offending field.
pub fn validate(config: &AnalyticsConfig) -> Result<(), AnalyticsError> {
    let fail = |message: String| Err(AnalyticsError::Config { message });

    let granularity = config.bucket.granularity;
    if !(granularity.is_finite() && granularity > 0.0) {
        return fail(format!(
            "bucket.granularity must be positive, got {granularity}"
        ));
    }

    let samples = config.smoothing.sample_count;
    if !(SmoothingConfig::MIN_SAMPLES..=SmoothingConfig::MAX_SAMPLES).contains(&samples) {
        return fail(format!(
            "smoothing.sample_count must be between {} and {}, got {samples}",
            SmoothingConfig::MIN_SAMPLES,
            SmoothingConfig::MAX_SAMPLES,
        ));
    }

    let bandwidth = config.smoothing.bandwidth;
    if !(bandwidth.is_finite() && bandwidth > 0.0) {
        return fail(format!(
            "smoothing.bandwidth must be positive, got {bandwidth}"
        ));
    }

    let consensus = &config.insight.consensus;
    if !(consensus.high_ratio >= 0.0 && consensus.high_ratio <= consensus.medium_ratio) {
        return fail(format!(
            "insight.consensus ratios must satisfy 0 <= high_ratio <= medium_ratio, got {} and {}",
            consensus.high_ratio, consensus.medium_ratio
        ));
    }

    let reliability = &config.insight.reliability;
    if reliability.medium_count > reliability.high_count {
        return fail(format!(
            "insight.reliability counts must satisfy medium_count <= high_count, got {} and {}",
            reliability.medium_count, reliability.high_count
        ));
    }

    let verdict = &config.insight.verdict;
    if !(verdict.below_z.is_finite()
        && verdict.above_z.is_finite()
        && verdict.below_z <= verdict.above_z)
    {
        return fail(format!(
            "insight.verdict must satisfy below_z <= above_z, got {} and {}",
            verdict.below_z, verdict.above_z
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&AnalyticsConfig::default()).is_ok());
        assert_eq!(parse_config("").unwrap(), AnalyticsConfig::default());
    }

    #[test]
    fn rejects_zero_granularity() {
        let err = parse_config("[bucket]\ngranularity = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("bucket.granularity"));
    }

    #[test]
    fn rejects_out_of_range_sample_count() {
        assert!(parse_config("[smoothing]\nsample_count = 5\n").is_err());
        assert!(parse_config("[smoothing]\nsample_count = 500\n").is_err());
        assert!(parse_config("[smoothing]\nsample_count = 100\n").is_ok());
    }

    #[test]
    fn rejects_non_positive_bandwidth() {
        assert!(parse_config("[smoothing]\nbandwidth = -1.0\n").is_err());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        assert!(
            parse_config("[insight.consensus]\nhigh_ratio = 0.6\nmedium_ratio = 0.5\n").is_err()
        );
        assert!(
            parse_config("[insight.reliability]\nhigh_count = 2\nmedium_count = 3\n").is_err()
        );
        assert!(parse_config("[insight.verdict]\nbelow_z = 1.0\nabove_z = -1.0\n").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = parse_config("[bucket\n").unwrap_err();
        assert!(matches!(err, AnalyticsError::Config { .. }));
    }

    #[test]
    fn missing_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), AnalyticsConfig::default());
    }

    #[test]
    fn loads_config_file() {
        let dir = std::env::temp_dir().join("campus_fares_analytics_config");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fares.toml");
        std::fs::write(&path, "[smoothing]\nsample_count = 30\nbandwidth = 2.0\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.smoothing.sample_count, 30);

        let missing = load_config(Some(&dir.join("missing.toml"))).unwrap_err();
        assert!(missing.to_string().contains("Failed to read"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
