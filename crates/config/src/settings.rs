// User settings
// Loaded from ~/.config/mailmatch/settings.json (or $MAILMATCH_CONFIG)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use mailmatch_engine::{KeyTransform, DEFAULT_NULL_TOKENS};
use mailmatch_io::LoadOptions;

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV: &str = "MAILMATCH_CONFIG";

/// Key normalization as spelled in the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyTransformSetting {
    #[default]
    None,
    Trim,
}

impl From<KeyTransformSetting> for KeyTransform {
    fn from(s: KeyTransformSetting) -> Self {
        match s {
            KeyTransformSetting::None => KeyTransform::None,
            KeyTransformSetting::Trim => KeyTransform::Trim,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Input
    #[serde(rename = "csv.delimiter")]
    pub delimiter: char,

    #[serde(rename = "input.nullValues")]
    pub null_values: Vec<String>,

    #[serde(rename = "input.inferNumbers")]
    pub infer_numbers: bool,

    // Matching
    #[serde(rename = "match.keyTransform")]
    pub key_transform: KeyTransformSetting,

    // Output
    #[serde(rename = "output.fileName")]
    pub output_file: String,

    #[serde(rename = "output.previewRows")]
    pub preview_rows: usize,

    #[serde(rename = "output.previewWidth")]
    pub preview_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delimiter: ',',
            null_values: DEFAULT_NULL_TOKENS.iter().map(|s| s.to_string()).collect(),
            infer_numbers: true,
            key_transform: KeyTransformSetting::None,
            output_file: "matched_output.csv".to_string(),
            preview_rows: 10,
            preview_width: 24,
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    Invalid(String),
    Write { path: PathBuf, message: String },
    AlreadyExists(PathBuf),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path, message } => write!(f, "cannot parse {}: {message}", path.display()),
            Self::Invalid(msg) => write!(f, "invalid settings: {msg}"),
            Self::Write { path, message } => write!(f, "cannot write {}: {message}", path.display()),
            Self::AlreadyExists(path) => write!(f, "{} already exists", path.display()),
        }
    }
}

impl std::error::Error for SettingsError {}

impl Settings {
    /// Default settings file path
    pub fn config_path() -> PathBuf {
        if let Some(p) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(p);
        }
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailmatch");
        config_dir.join("settings.json")
    }

    /// Load settings from the default path. A missing file means defaults.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::config_path();
        if !path.exists() {
            log::debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load settings from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings = Self::from_json(&contents).map_err(|e| match e {
            SettingsError::Invalid(msg) => SettingsError::Invalid(format!("{}: {msg}", path.display())),
            SettingsError::Parse { message, .. } => SettingsError::Parse { path: path.to_path_buf(), message },
            other => other,
        })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn from_json(contents: &str) -> Result<Self, SettingsError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Settings = serde_json::from_str(&cleaned).map_err(|e| SettingsError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.delimiter.is_ascii() || self.delimiter == '"' || self.delimiter == '\n' {
            return Err(SettingsError::Invalid(format!(
                "csv.delimiter must be a single ASCII character other than quote or newline, got {:?}",
                self.delimiter
            )));
        }
        if self.output_file.trim().is_empty() {
            return Err(SettingsError::Invalid("output.fileName must not be empty".into()));
        }
        if self.preview_width < 4 {
            return Err(SettingsError::Invalid("output.previewWidth must be at least 4".into()));
        }
        Ok(())
    }

    /// Loader options derived from these settings.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.delimiter as u8,
            null_tokens: self.null_values.clone(),
            infer_numbers: self.infer_numbers,
        }
    }

    /// Write the commented default settings file. Refuses to overwrite unless `force`.
    pub fn write_default_file(path: &Path, force: bool) -> Result<(), SettingsError> {
        if path.exists() && !force {
            return Err(SettingsError::AlreadyExists(path.to_path_buf()));
        }

        let write_err = |e: std::io::Error| SettingsError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        fs::write(path, DEFAULT_FILE).map_err(write_err)
    }
}

const DEFAULT_FILE: &str = r##"{
    // Input parsing
    "csv.delimiter": ",",
    // Fields equal to one of these are treated as missing and never match
    "input.nullValues": ["", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan",
        "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null"],
    "input.inferNumbers": true,

    // Matching: "none" compares exactly, "trim" ignores surrounding whitespace
    "match.keyTransform": "none",

    // Output
    "output.fileName": "matched_output.csv",
    "output.previewRows": 10,
    "output.previewWidth": 24
}
"##;
