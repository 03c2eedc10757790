use thiserror::Error;

/// The single user-visible message for every failed login.
/// Authentication and authorization failures both render it.
pub const LOGIN_FAILED_MESSAGE: &str =
    "Invalid email or password, or this account is not authorized.";

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Access denied: dashboard requires an authenticated, allowlisted user")]
    AccessDenied,

    #[error("Unknown metric field '{field}'")]
    UnknownField { field: String },

    #[error("Unknown price tier '{tier}'")]
    UnknownTier { tier: String },

    #[error("Invalid value for '{field}': {value} is not a finite number")]
    NonFiniteValue { field: String, value: f64 },

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DashResult<T> = Result<T, DashError>;

/// Failures raised by the access gate and its authentication providers.
///
/// `InvalidCredentials` and `Unauthorized` render the same text.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("{}", LOGIN_FAILED_MESSAGE)]
    InvalidCredentials,

    #[error("{}", LOGIN_FAILED_MESSAGE)]
    Unauthorized { email: String },

    #[error("Authentication request timed out")]
    Timeout,

    #[error("Authentication transport error: {0}")]
    Transport(String),

    #[error("Authentication provider returned status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Malformed authentication response: {0}")]
    MalformedResponse(String),
}

impl GateError {
    /// The message the presentation layer should show for this failure.
    /// Every login failure collapses to the same wording.
    pub fn user_message(&self) -> &'static str {
        LOGIN_FAILED_MESSAGE
    }

    /// True for failures that mean "the credentials did not check out",
    /// including timeouts and transport failures, which count as failed logins.
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, GateError::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for GateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GateError::Timeout
        } else if e.is_decode() {
            GateError::MalformedResponse(e.to_string())
        } else {
            GateError::Transport(e.to_string())
        }
    }
}

pub type GateResult<T> = Result<T, GateError>;
