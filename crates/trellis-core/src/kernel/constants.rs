/// Application name
pub const APP_NAME: &str = "Trellis";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config files looked up in the working directory when none is given, in order
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["trellis.toml", "trellis.yaml", "trellis.json"];

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "TRELLIS_CONFIG";
