use std::env;

/// Distinguishes runtime behavior for different stages of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for a wizard host.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub environment: AppEnvironment,
    /// Which configured wizard to load steps for.
    pub wizard_api_name: String,
    /// Relaxed mode for manual testing: validation and persistence failures
    /// no longer block navigation, and `jump` is enabled.
    pub debug_mode: bool,
    pub telemetry: TelemetryConfig,
}

impl WizardConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let wizard_api_name =
            env::var("WIZARD_API_NAME").unwrap_or_else(|_| "DAO_Business_InBranch".to_string());

        let debug_mode = match env::var("WIZARD_DEBUG_MODE") {
            Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidDebugFlag { value })?,
            Err(_) => false,
        };

        let log_level = env::var("WIZARD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            wizard_api_name,
            debug_mode,
            telemetry: TelemetryConfig { log_level },
        })
    }

    /// Default configuration for the standard in-branch business wizard.
    pub fn standard() -> Self {
        Self {
            environment: AppEnvironment::Development,
            wizard_api_name: "DAO_Business_InBranch".to_string(),
            debug_mode: false,
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
        }
    }

    /// Standard configuration with debug mode switched on.
    pub fn debug() -> Self {
        Self {
            debug_mode: true,
            ..Self::standard()
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("WIZARD_DEBUG_MODE has unrecognized value '{value}'")]
    InvalidDebugFlag { value: String },
}
