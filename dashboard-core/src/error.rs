//! Error taxonomy of the refresh pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// Empty or unusable user input; no provider was contacted.
    #[error("Input error: {0}")]
    Input(String),

    #[error("Location not found: {0}")]
    NotFound(String),

    /// Network failure, timeout or unexpected HTTP status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered, but not with what we expected.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DashboardError {
    pub fn empty_city() -> Self {
        Self::Input("Please enter a city name.".to_string())
    }

    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(msg) => msg.clone(),
            Self::NotFound(what) => format!("Could not find '{what}'. Check the city name."),
            Self::Transport(msg) => {
                format!("Failed to retrieve data. Check your connection.\n{msg}")
            }
            Self::Parse(msg) => format!("Failed to retrieve data.\nUnexpected response: {msg}"),
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
