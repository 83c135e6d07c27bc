use std::fmt;

#[derive(Debug, Clone)]
pub enum VpnMetricsError {
    FileOperation(String),
    CommandFailed(String),
    Parse(String),
    DateParse(String),
    Config(String),
    Validation(String),
    Encode(String),
}

impl VpnMetricsError {
    /// Stable error code, used in log output.
    pub fn code(&self) -> &'static str {
        match self {
            VpnMetricsError::FileOperation(_) => "E001",
            VpnMetricsError::CommandFailed(_) => "E002",
            VpnMetricsError::Parse(_) => "E003",
            VpnMetricsError::DateParse(_) => "E004",
            VpnMetricsError::Config(_) => "E005",
            VpnMetricsError::Validation(_) => "E006",
            VpnMetricsError::Encode(_) => "E007",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            VpnMetricsError::FileOperation(_) => "File Operation Error",
            VpnMetricsError::CommandFailed(_) => "Command Failed",
            VpnMetricsError::Parse(_) => "Parse Error",
            VpnMetricsError::DateParse(_) => "Date Parse Error",
            VpnMetricsError::Config(_) => "Configuration Error",
            VpnMetricsError::Validation(_) => "Validation Error",
            VpnMetricsError::Encode(_) => "Metrics Encoding Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            VpnMetricsError::FileOperation(msg)
            | VpnMetricsError::CommandFailed(msg)
            | VpnMetricsError::Parse(msg)
            | VpnMetricsError::DateParse(msg)
            | VpnMetricsError::Config(msg)
            | VpnMetricsError::Validation(msg)
            | VpnMetricsError::Encode(msg) => msg,
        }
    }
}

impl fmt::Display for VpnMetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for VpnMetricsError {}

// Convenience constructors
impl VpnMetricsError {
    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        VpnMetricsError::FileOperation(msg.into())
    }

    pub fn command_failed<T: Into<String>>(msg: T) -> Self {
        VpnMetricsError::CommandFailed(msg.into())
    }

    pub fn parse<T: Into<String>>(msg: T) -> Self {
        VpnMetricsError::Parse(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        VpnMetricsError::DateParse(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        VpnMetricsError::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        VpnMetricsError::Validation(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        VpnMetricsError::Encode(msg.into())
    }
}

impl From<std::io::Error> for VpnMetricsError {
    fn from(err: std::io::Error) -> Self {
        VpnMetricsError::FileOperation(err.to_string())
    }
}

impl From<chrono::ParseError> for VpnMetricsError {
    fn from(err: chrono::ParseError) -> Self {
        VpnMetricsError::DateParse(err.to_string())
    }
}

impl From<config::ConfigError> for VpnMetricsError {
    fn from(err: config::ConfigError) -> Self {
        VpnMetricsError::Config(err.to_string())
    }
}

impl From<prometheus::Error> for VpnMetricsError {
    fn from(err: prometheus::Error) -> Self {
        VpnMetricsError::Encode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VpnMetricsError>;
