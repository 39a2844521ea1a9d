//! Application-wide constants.

/// The display name of the application.
pub const APP_NAME: &str = "OKeyboard";

/// Directory name under the platform config directory.
pub const APP_DATA_DIR: &str = "okeyboard";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "OKEYBOARD_CONFIG_DIR";
