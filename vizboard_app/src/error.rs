// vizboard_app/src/error.rs

use thiserror::Error;
use vizboard_core::error::CoreError;

/// Failures of the dashboard runtime. None of these are fatal to the whole
/// dashboard; they are logged or surfaced to the user and the loop goes on.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("topic '{topic}' carries {actual}, not {expected}")]
    TopicTypeMismatch {
        topic: String,
        expected: String,
        actual: String,
    },

    #[error("service '{0}' is not available")]
    ServiceUnavailable(String),

    #[error("service '{service}' failed: {message}")]
    ServiceFailed { service: String, message: String },

    #[error("unknown widget '{0}'")]
    UnknownWidget(String),

    #[error("widget '{widget}' is not a {expected} widget")]
    WrongWidgetKind { widget: String, expected: &'static str },

    #[error("widget '{widget}' rejected {setting} value")]
    InvalidSetting { widget: String, setting: &'static str },

    #[error("widget '{0}' has no topic")]
    NoTopic(String),

    #[error("settings store error: {0}")]
    Settings(#[source] std::io::Error),

    #[error("malformed settings entry for '{widget}': {source}")]
    SettingsEntry {
        widget: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("replay input line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for DashboardError {
    fn from(e: figment::Error) -> Self {
        DashboardError::Config(Box::new(e))
    }
}

/// A message meant for the operator, shown in a blocking notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub message: String,
}

impl UserNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
