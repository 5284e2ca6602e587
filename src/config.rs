// Configuration module for cslens
// Reads from environment variables with sensible defaults

use std::env;
use std::sync::OnceLock;
use tracing::warn;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path segments whose files are never indexed, compared case-insensitively
    /// (CSLENS_EXCLUDE_SEGMENTS, comma separated)
    pub exclude_segments: Vec<String>,

    /// Worker threads for per-project indexing, 0 lets rayon decide (CSLENS_THREADS)
    pub threads: usize,

    /// Source files larger than this are skipped (CSLENS_MAX_FILE_BYTES)
    pub max_file_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_segments: vec!["obj".to_string(), "platforms".to_string()],
            threads: 0,
            max_file_bytes: 4 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(val) = env::var("CSLENS_EXCLUDE_SEGMENTS") {
            config.exclude_segments = parse_segments(&val);
        }

        if let Ok(val) = env::var("CSLENS_THREADS") {
            if let Ok(parsed) = val.parse() {
                config.threads = parsed;
            } else {
                warn!(
                    "invalid CSLENS_THREADS value: {}, using default: {}",
                    val, config.threads
                );
            }
        }

        if let Ok(val) = env::var("CSLENS_MAX_FILE_BYTES") {
            if let Ok(parsed) = val.parse() {
                config.max_file_bytes = parsed;
            } else {
                warn!(
                    "invalid CSLENS_MAX_FILE_BYTES value: {}, using default: {}",
                    val, config.max_file_bytes
                );
            }
        }

        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

fn parse_segments(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|segment| segment.trim().trim_matches(|ch| ch == '/' || ch == '\\'))
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .collect()
}
