use std::env;
use std::path::PathBuf;

/// Runtime configuration, two environment variables with workable local
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base address of the study API, without a trailing slash.
    pub api_base: String,
    /// Where the signed-in participant record is kept between runs.
    pub session_file: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self {
            api_base: var_or("API_BASE", "http://localhost:8000/api")
                .trim_end_matches('/')
                .to_string(),
            session_file: PathBuf::from(var_or("SESSION_FILE", ".personamirror_session.json")),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        tracing::info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
