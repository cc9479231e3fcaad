use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::wizard::services::StepLoadError;
use std::fmt;

/// Top-level error for wizard hosts wiring configuration, telemetry, and
/// the orchestration core together.
#[derive(Debug)]
pub enum WizardAppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    StepLoad(StepLoadError),
}

impl fmt::Display for WizardAppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardAppError::Config(err) => write!(f, "configuration error: {}", err),
            WizardAppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            WizardAppError::StepLoad(err) => write!(f, "step load error: {}", err),
        }
    }
}

impl std::error::Error for WizardAppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WizardAppError::Config(err) => Some(err),
            WizardAppError::Telemetry(err) => Some(err),
            WizardAppError::StepLoad(err) => Some(err),
        }
    }
}

impl From<ConfigError> for WizardAppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for WizardAppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<StepLoadError> for WizardAppError {
    fn from(value: StepLoadError) -> Self {
        Self::StepLoad(value)
    }
}
