use thiserror::Error;

#[derive(Error, Debug)]
pub enum UninstallError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unable to find token: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid name pattern '{pattern}': {source}")]
    PatternError {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Inventory error: {message}")]
    InventoryError { message: String },

    #[error("Process error: {message}")]
    ProcessError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Inventory,
    Process,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UninstallError {
    pub fn process(message: impl Into<String>) -> Self {
        Self::ProcessError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. }
            | Self::PatternError { .. } => ErrorCategory::Configuration,
            Self::InventoryError { .. } => ErrorCategory::Inventory,
            Self::ProcessError { .. } => ErrorCategory::Process,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Process => ErrorSeverity::Medium,
            ErrorCategory::Inventory | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MissingConfigError { .. } => {
                "Add the missing field to the [uninstall] table or pass it on the command line"
            }
            Self::PatternError { .. } => {
                "Check the name patterns; only % and _ are wildcards, everything else is literal"
            }
            Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Fix the configuration value and retry",
            Self::InventoryError { .. } => {
                "Make sure the Windows Installer service is reachable and run as administrator"
            }
            Self::ProcessError { .. } => "Check that the uninstaller executable exists and is runnable",
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) => "Report this as a bug",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Inventory => {
                format!("Could not read the list of installed products: {}", self)
            }
            ErrorCategory::Process => format!("Could not run the uninstaller: {}", self),
            ErrorCategory::System => format!("Unexpected system error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, UninstallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_high_severity() {
        let err = UninstallError::MissingConfigError {
            field: "ApplicationName".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.to_string(), "Unable to find token: ApplicationName");
    }

    #[test]
    fn test_inventory_errors_are_critical() {
        let err = UninstallError::InventoryError {
            message: "boom".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("boom"));
    }
}
