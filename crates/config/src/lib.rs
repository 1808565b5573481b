// Configuration loading

pub mod settings;

pub use settings::{KeyTransformSetting, Settings, SettingsError, CONFIG_ENV};
