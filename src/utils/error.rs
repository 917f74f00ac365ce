use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Required input not found: {path}")]
    MissingInputError { path: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Consistency check failed: {failed} of {total} checks did not pass")]
    ConsistencyError { failed: usize, total: usize },
}

/// 錯誤分類，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Config,
    Data,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 各執行檔共用的結束碼；錯誤一律非 0
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ZipError(_) | EtlError::IoError(_) | EtlError::MissingInputError { .. } => {
                ErrorCategory::Io
            }
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorCategory::Config
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::ConsistencyError { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 一致性檢查失敗代表報表數字可疑，但產出仍在
            EtlError::ConsistencyError { .. } | EtlError::MissingInputError { .. } => {
                ErrorSeverity::Medium
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorSeverity::High
            }
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the data directory exists and is writable",
            ErrorCategory::Config => {
                "Fix the configuration file; run `validate-config` for a full report"
            }
            ErrorCategory::Data => "Inspect the input CSV files for malformed columns",
            ErrorCategory::Validation => {
                "Re-run the full pipeline so all artifacts come from the same configuration"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::MissingInputError { path } => {
                format!("Input file '{}' could not be found", path)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            EtlError::ConsistencyError { failed, total } => format!(
                "{} of {} consistency checks failed; see consistency_report.json",
                failed, total
            ),
            other => other.to_string(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        EtlError::ProcessingError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_and_severity() {
        let err = EtlError::MissingInputError {
            path: "raw/orders.csv".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Io);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("raw/orders.csv"));

        let err = EtlError::ConsistencyError {
            failed: 2,
            total: 8,
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.to_string().contains("2 of 8"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: EtlError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_exit_code_follows_severity() {
        let missing = EtlError::MissingInputError {
            path: "analysis/zone_analysis.csv".to_string(),
        };
        assert_eq!(missing.severity().exit_code(), 2);

        let mismatch = EtlError::ConsistencyError {
            failed: 1,
            total: 8,
        };
        assert_eq!(mismatch.severity().exit_code(), 2);

        assert_eq!(EtlError::processing("boom").severity().exit_code(), 1);
        let io: EtlError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(io.severity().exit_code(), 3);
        assert_ne!(ErrorSeverity::Low.exit_code(), 0);
    }
}
