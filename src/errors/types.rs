//! # Error Types
//!
//! Error type for failures the harness cannot normalise into an outcome.
//!
//! Connectivity problems, query errors, HTTP transport failures and 4xx
//! responses are *not* errors here; they surface as typed outcomes
//! (`QueryFailure`, `ImportResponseDescriptor`, `ValidationOutcome`). What
//! remains is misconfiguration and HTTP client construction failures, which
//! must abort loudly.

/// Custom result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Main error type for the import harness
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors on settings or identifiers
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// HTTP client construction errors
    #[error("HTTP client error: {context}")]
    Http {
        #[source]
        source: reqwest::Error,
        context: String,
    },
}

impl HarnessError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }
}

impl From<reqwest::Error> for HarnessError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http { source: error, context: "HTTP client operation failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for HarnessError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut failures = Vec::new();
        collect_validation_failures("", &errors, &mut failures);
        failures.sort();

        let message = failures
            .iter()
            .map(|(path, reason)| format!("{}: {}", path, reason))
            .collect::<Vec<_>>()
            .join("; ");
        let field = match failures.as_slice() {
            [(path, _)] => Some(path.clone()),
            _ => None,
        };

        Self::Validation { message: format!("Validation failed: {}", message), field }
    }
}

/// Flatten nested and list validation errors into `(path, reason)` pairs.
fn collect_validation_failures(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<(String, String)>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let reasons: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or_else(|| e.code.to_string(), |m| m.to_string())
                    })
                    .collect();
                out.push((path, reasons.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_failures(&path, nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_failures(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}
