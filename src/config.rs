use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const STORE_ENV: &str = "PERSONAL_OS_STORE";
const CONFIG_ENV: &str = "PERSONAL_OS_CONFIG";
const STATE_DIR_ENV: &str = "PERSONAL_OS_STATE_DIR";
const STORE_FILE: &str = "store.json";
const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "personal_os";

const WORK_MINUTES: std::ops::RangeInclusive<u32> = 1..=60;
const BREAK_MINUTES: std::ops::RangeInclusive<u32> = 1..=30;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read settings file {path}: {source}")]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("failed to parse settings file {path}: {source}")]
	Decode {
		path: PathBuf,
		source: toml::de::Error,
	},
	#[error("invalid {field}: {reason}")]
	InvalidInput { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub log_level: String,
	pub pomodoro: PomodoroSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			log_level: "warn".to_string(),
			pomodoro: PomodoroSettings::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PomodoroSettings {
	pub work_minutes: u32,
	pub break_minutes: u32,
}

impl Default for PomodoroSettings {
	fn default() -> Self {
		Self {
			work_minutes: 25,
			break_minutes: 5,
		}
	}
}

impl PomodoroSettings {
	pub fn validate(&self) -> Result<(), ConfigError> {
		for (field, minutes, range) in [
			("pomodoro.work_minutes", self.work_minutes, WORK_MINUTES),
			("pomodoro.break_minutes", self.break_minutes, BREAK_MINUTES),
		] {
			if !range.contains(&minutes) {
				return Err(ConfigError::InvalidInput {
					field,
					reason: format!(
						"{minutes} is outside {}..={} minutes",
						range.start(),
						range.end()
					),
				});
			}
		}
		Ok(())
	}
}

pub fn resolve_store_path(cli_path: Option<PathBuf>) -> PathBuf {
	pick_path(cli_path, env::var_os(STORE_ENV), || state_dir().join(STORE_FILE))
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
	pick_path(cli_path, env::var_os(CONFIG_ENV), || state_dir().join(CONFIG_FILE))
}

/// Reads the settings file. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
		Err(source) => {
			return Err(ConfigError::Io {
				path: path.to_path_buf(),
				source,
			});
		}
	};

	parse_settings(&raw).map_err(|err| match err {
		ConfigError::Decode { source, .. } => ConfigError::Decode {
			path: path.to_path_buf(),
			source,
		},
		other => other,
	})
}

pub fn parse_settings(raw: &str) -> Result<Settings, ConfigError> {
	let settings: Settings = toml::from_str(raw).map_err(|source| ConfigError::Decode {
		path: PathBuf::new(),
		source,
	})?;
	settings.pomodoro.validate()?;
	Ok(settings)
}

fn pick_path(
	cli_path: Option<PathBuf>,
	env_path: Option<OsString>,
	fallback: impl FnOnce() -> PathBuf,
) -> PathBuf {
	if let Some(path) = cli_path {
		return absolutize(path);
	}

	if let Some(path) = env_path {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return absolutize(path);
		}
	}

	fallback()
}

fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os(STATE_DIR_ENV) {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(".personal_os")
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}
