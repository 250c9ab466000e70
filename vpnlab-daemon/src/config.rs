//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use serde::Deserialize;
use vpnlab_fixture::config::FixtureConfig;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database_path: String,
    pub netns_prefix: String,
    pub fixture: FixtureConfig,
    pub logging: Logging,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub journald: LoggingJournald,
    pub file: LoggingFile,
    pub stderr: LoggingStderr,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingJournald {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFile {
    pub enabled: bool,
    pub dir: String,
    pub name: String,
    pub rotation: LoggingFileRotation,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

// Logs go to stderr so that stdout only carries command results.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStderr {
    pub enabled: bool,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFmt {
    pub style: LoggingFmtStyle,
    pub colors: bool,
    pub show_thread_id: bool,
    pub show_source: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFileRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

// ===== impl Config =====

impl Config {
    const DFLT_FILEPATH: &'static str = "/etc/vpnlab.toml";

    pub(crate) fn load(config_file: Option<&str>) -> Config {
        let config_file = config_file.unwrap_or(Config::DFLT_FILEPATH);

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => Config::parse(&config_str).unwrap_or_else(|err| {
                eprintln!("Failed to parse configuration file: {err}");
                std::process::exit(1);
            }),
            Err(err) => {
                eprintln!("Failed to load configuration file: {err}");
                eprintln!("Falling back to default configuration...");
                Config::default()
            }
        }
    }

    fn parse(config_str: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(config_str)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            database_path: "/var/run/vpnlab/vpnlab.db".to_owned(),
            netns_prefix: String::new(),
            fixture: Default::default(),
            logging: Default::default(),
        }
    }
}

// ===== impl LoggingJournald =====

impl Default for LoggingJournald {
    fn default() -> LoggingJournald {
        LoggingJournald { enabled: false }
    }
}

// ===== impl LoggingFile =====

impl Default for LoggingFile {
    fn default() -> LoggingFile {
        LoggingFile {
            enabled: false,
            dir: "/var/log".to_owned(),
            name: "vpnlab.log".to_owned(),
            rotation: Default::default(),
            fmt: Default::default(),
        }
    }
}

// ===== impl LoggingStderr =====

impl Default for LoggingStderr {
    fn default() -> LoggingStderr {
        LoggingStderr {
            enabled: true,
            fmt: LoggingFmt {
                style: LoggingFmtStyle::Compact,
                ..Default::default()
            },
        }
    }
}

// ===== impl LoggingFmt =====

impl Default for LoggingFmt {
    fn default() -> LoggingFmt {
        LoggingFmt {
            style: LoggingFmtStyle::Full,
            colors: false,
            show_thread_id: false,
            show_source: false,
        }
    }
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use vpnlab_fixture::vrf::VrfMode;

    use super::*;

    #[test]
    fn defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.database_path, "/var/run/vpnlab/vpnlab.db");
        assert_eq!(config.netns_prefix, "");
        assert_eq!(config.fixture, FixtureConfig::default());
        assert!(config.logging.stderr.enabled);
        assert!(!config.logging.file.enabled);
    }

    #[test]
    fn fixture_section() {
        let config = Config::parse(
            r#"
            netns_prefix = "lab-"

            [fixture]
            vrf_mode = "vrf-lite"
            min_kernel = "5.4"

            [logging.file]
            enabled = true
            rotation = "daily"
            style = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.netns_prefix, "lab-");
        assert_eq!(config.fixture.vrf_mode, VrfMode::VrfLite);
        assert_eq!(config.fixture.min_kernel.as_deref(), Some("5.4"));
        assert!(config.logging.file.enabled);
        assert!(matches!(
            config.logging.file.rotation,
            LoggingFileRotation::Daily
        ));
        assert!(matches!(
            config.logging.file.fmt.style,
            LoggingFmtStyle::Json
        ));
    }

    #[test]
    fn kernel_check_off() {
        let config = Config::parse("[fixture]\nmin_kernel = \"\"").unwrap();
        assert_eq!(config.fixture.min_kernel, None);
        assert_eq!(config.fixture.vrf_mode, VrfMode::Netns);

        let config = Config::parse("[fixture]\nvrf_mode = \"netns\"").unwrap();
        assert_eq!(config.fixture.min_kernel.as_deref(), Some("4.9"));
    }

    #[test]
    fn unknown_fields() {
        assert!(Config::parse("user = \"vpnlab\"").is_err());
        assert!(Config::parse("[fixture]\nvrf_mode = \"bridge\"").is_err());
    }
}
