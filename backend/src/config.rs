use crate::analytics::MAX_GROUP_DIMENSIONS;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// JSON snapshot of papers and responses; `None` keeps everything in memory only.
    pub local_state_path: Option<String>,
    pub max_group_dimensions: usize,
    pub weak_area_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            local_state_path: None,
            max_group_dimensions: MAX_GROUP_DIMENSIONS,
            weak_area_threshold: 60.0,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = non_empty("BACKEND_HOST").unwrap_or(defaults.host);
        let port = non_empty("BACKEND_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let max_group_dimensions = non_empty("ANALYTICS_MAX_GROUP_DIMENSIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_group_dimensions);
        let weak_area_threshold = non_empty("WEAK_AREA_THRESHOLD")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| (0.0..=100.0).contains(v))
            .unwrap_or(defaults.weak_area_threshold);

        Self {
            host,
            port,
            local_state_path: non_empty("LOCAL_STATE_PATH"),
            max_group_dimensions,
            weak_area_threshold,
        }
    }
}
