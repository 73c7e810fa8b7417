use std::env;

/// TargetConfig holds the router connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub device_type: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    /// Write the committed config to the boot config after each set
    pub save: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            device_type: "vyos".to_string(),
            host: "192.168.56.1".to_string(),
            port: 22,
            username: "vyos".to_string(),
            password: "vyos".to_string(),
            timeout_secs: 30,
            save: false,
        }
    }
}

impl TargetConfig {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            device_type: get("VYOS_DEVICE_TYPE", &defaults.device_type),
            host: get("VYOS_HOST", &defaults.host),
            port: get("VYOS_PORT", "22").parse().unwrap_or(defaults.port),
            username: get("VYOS_USERNAME", &defaults.username),
            password: get("VYOS_PASSWORD", &defaults.password),
            timeout_secs: get("VYOS_TIMEOUT_SECS", "30")
                .parse()
                .unwrap_or(defaults.timeout_secs),
            save: matches!(
                get("VYOS_SAVE", "false").to_lowercase().as_str(),
                "1" | "true" | "yes"
            ),
        }
    }

    /// host:port string for TCP connect
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
