use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Port for the API HTTP server.
    pub api_port: u16,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// TOML course catalog loaded into the database at startup
    pub course_catalog: Option<PathBuf>,

    // logging
    /// Default filter directive, overridden by RUST_LOG
    pub log_level: String,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_port: 5001,
            sqlite_path: None,
            course_catalog: None,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}
