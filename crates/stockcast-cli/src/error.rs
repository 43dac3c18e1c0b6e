use thiserror::Error;

use crate::output::RenderError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] stockcast_core::ValidationError),

    #[error(transparent)]
    Config(#[from] stockcast_core::ConfigError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Serialization(_) => 4,
            Self::Render(RenderError::Serialization(_)) => 4,
            Self::Render(RenderError::Io(_)) => 10,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::ValidationError;

    #[test]
    fn input_errors_exit_with_usage_code() {
        let error = CliError::from(ValidationError::EmptySymbol);
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.to_string(), "symbol cannot be empty");
    }

    #[test]
    fn io_errors_have_their_own_code() {
        let error = CliError::from(std::io::Error::other("tty gone"));
        assert_eq!(error.exit_code(), 10);
    }

    #[test]
    fn render_errors_follow_their_cause() {
        let io = CliError::from(RenderError::from(std::io::Error::other("closed")));
        assert_eq!(io.exit_code(), 10);

        let json = serde_json::from_str::<serde_json::Value>("{").expect_err("truncated");
        let serialization = CliError::from(RenderError::from(json));
        assert_eq!(serialization.exit_code(), 4);
    }
}
