use std::path::{Path, PathBuf};

use nnjudge_core::config::DEFAULT_CONFIG;

use crate::error::HarnessError;

/// Log output format for [`crate::logging::init`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Harness settings loaded from environment variables.
///
/// All fields have defaults suitable for running a single test case locally.
/// CI overrides them via environment variables or a `.env` file.
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    /// Base configuration file. `None` uses the built-in [`DEFAULT_CONFIG`].
    pub base_config: Option<PathBuf>,
    /// Only run these targets. `None` runs every target in the case matrix.
    pub target_filter: Option<Vec<String>>,
    /// Directory that per-case JSON reports are written under.
    pub output_dir: PathBuf,
    pub log_format: LogFormat,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            base_config: None,
            target_filter: None,
            output_dir: PathBuf::from("tests_output"),
            log_format: LogFormat::Text,
        }
    }
}

impl HarnessSettings {
    /// Load settings from the process environment (after reading `.env`).
    ///
    /// | Env Var              | Default        |
    /// |----------------------|----------------|
    /// | `NNJUDGE_CONFIG`     | built-in       |
    /// | `NNJUDGE_TARGETS`    | all targets    |
    /// | `NNJUDGE_OUTPUT`     | `tests_output` |
    /// | `NNJUDGE_LOG_FORMAT` | `text`         |
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`HarnessSettings::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_config = lookup("NNJUDGE_CONFIG")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let target_filter = lookup("NNJUDGE_TARGETS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|targets| !targets.is_empty());

        let output_dir = lookup("NNJUDGE_OUTPUT")
            .filter(|s| !s.trim().is_empty())
            .map_or(defaults.output_dir, PathBuf::from);

        let log_format = match lookup("NNJUDGE_LOG_FORMAT").as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            base_config,
            target_filter,
            output_dir,
            log_format,
        }
    }

    /// Text of the base configuration the per-test overwrite is merged onto.
    pub fn base_config_text(&self) -> Result<String, HarnessError> {
        match &self.base_config {
            Some(path) => read_config(path),
            None => Ok(DEFAULT_CONFIG.to_string()),
        }
    }
}

fn read_config(path: &Path) -> Result<String, HarnessError> {
    std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    fn settings_from(pairs: &[(&str, &str)]) -> HarnessSettings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HarnessSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let settings = settings_from(&[]);
        assert!(settings.base_config.is_none());
        assert!(settings.target_filter.is_none());
        assert_eq!(settings.output_dir, PathBuf::from("tests_output"));
        assert_eq!(settings.log_format, LogFormat::Text);
    }

    #[test]
    fn parses_target_filter() {
        let settings = settings_from(&[("NNJUDGE_TARGETS", " cpu, k510 ,,")]);
        assert_eq!(
            settings.target_filter,
            Some(vec!["cpu".to_string(), "k510".to_string()])
        );
    }

    #[test]
    fn blank_target_filter_means_all_targets() {
        let settings = settings_from(&[("NNJUDGE_TARGETS", " , ")]);
        assert!(settings.target_filter.is_none());
    }

    #[test]
    fn reads_paths_and_log_format() {
        let settings = settings_from(&[
            ("NNJUDGE_CONFIG", "/etc/nnjudge/config.yml"),
            ("NNJUDGE_OUTPUT", "/tmp/judge"),
            ("NNJUDGE_LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(
            settings.base_config,
            Some(PathBuf::from("/etc/nnjudge/config.yml"))
        );
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/judge"));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn base_config_defaults_to_builtin() {
        let text = HarnessSettings::default().base_config_text().unwrap();
        assert_eq!(text, DEFAULT_CONFIG);
    }

    #[test]
    fn base_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "judge:\n  specifics: []\n").unwrap();
        let settings = HarnessSettings {
            base_config: Some(file.path().to_path_buf()),
            ..HarnessSettings::default()
        };
        assert_eq!(
            settings.base_config_text().unwrap(),
            "judge:\n  specifics: []\n"
        );
    }

    #[test]
    fn missing_base_config_is_io_error() {
        let settings = HarnessSettings {
            base_config: Some(PathBuf::from("/nonexistent/nnjudge/config.yml")),
            ..HarnessSettings::default()
        };
        assert_matches!(settings.base_config_text(), Err(HarnessError::Io { .. }));
    }
}
