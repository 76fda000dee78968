use super::*;

impl Default for OpenEiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openei.org/utility_rates".to_string(),
            timeout_seconds: 15,
            max_attempts: 3,
            backoff_base_seconds: 2,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            update_interval_seconds: 60,
            fetch_interval_hours: 24,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: String::new(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openei: OpenEiConfig::default(),
            plan: PlanConfig::default(),
            refresh: RefreshConfig::default(),
            gas: None,
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            timezone: "UTC".to_string(),
            validate_on_startup: true,
        }
    }
}
