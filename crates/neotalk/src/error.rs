//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use neotalk_config::ConfigError;
use neotalk_core::{CoreError, StorageError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to NeoTalk at {url}")]
    #[diagnostic(
        code(neotalk::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("No server configured")]
    #[diagnostic(
        code(neotalk::no_server),
        help(
            "This command talks to the backend. Pass --server, set NEOTALK_SERVER,\n\
             or create a profile with: neotalk config init\n\
             Config expected at: {path}"
        )
    )]
    NoServer { path: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(neotalk::auth_failed),
        help("Check the token with --token, NEOTALK_TOKEN, or the profile's token_env.")
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(neotalk::not_found),
        help("Run: neotalk {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API / storage ────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(neotalk::api_error))]
    ApiError { code: String, message: String },

    #[error("Dashboard storage failed: {message}")]
    #[diagnostic(
        code(neotalk::storage),
        help("Try --storage local to work from the local copy only.")
    )]
    Storage { message: String },

    #[error("Widget failed to load: {message}")]
    #[diagnostic(code(neotalk::load))]
    Load { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(neotalk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(neotalk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: neotalk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(neotalk::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(neotalk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(neotalk::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::NoServer { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn dashboard_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "dashboard".into(),
            identifier: id.into(),
            list_command: "dashboards list".into(),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },

            CoreError::Timeout => Self::Timeout,

            CoreError::DashboardNotFound { id } => Self::dashboard_not_found(id),

            CoreError::ComponentNotFound { component_type } => Self::NotFound {
                resource_type: "component".into(),
                identifier: component_type,
                list_command: "components list".into(),
            },

            CoreError::ExtensionNotFound { extension_id } => Self::NotFound {
                resource_type: "extension".into(),
                identifier: extension_id,
                list_command: "extensions sync".into(),
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: format!("{entity_type}s list"),
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Load(e) => Self::Load {
                message: e.to_string(),
            },

            CoreError::Storage { message, .. } => Self::Storage { message },

            CoreError::Api {
                message,
                code,
                status,
            } => Self::ApiError {
                code: code
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        CoreError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::Timeout.exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            CliError::dashboard_not_found("d1").exit_code(),
            exit_code::NOT_FOUND
        );
        let auth: CliError = CoreError::AuthenticationFailed {
            message: "bad token".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn api_status_fills_missing_code() {
        let err: CliError = CoreError::Api {
            message: "boom".into(),
            code: None,
            status: Some(502),
        }
        .into();
        assert_eq!(err.to_string(), "API error (502): boom");
    }
}
