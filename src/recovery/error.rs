use thiserror::Error;

/// Failure raised by a handler or middleware.
///
/// `Client` carries the HTTP status intrinsic to the failure (404, 400, 403,
/// ...). Everything else is `Internal` and is only described to the client
/// when error exposure is enabled.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{message}")]
    Client { status: u16, message: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn client(status: u16, message: impl Into<String>) -> Self {
        DispatchError::Client {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::client(404, "Not Found")
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::client(400, message)
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::client(403, "Forbidden")
    }

    pub fn internal<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        DispatchError::Internal(error.into())
    }

    /// Status code for client-caused failures, `None` for internal ones.
    #[must_use]
    pub fn client_status(&self) -> Option<u16> {
        match self {
            DispatchError::Client { status, .. } => Some(*status),
            DispatchError::Internal(_) => None,
        }
    }

    #[must_use]
    pub fn is_client(&self) -> bool {
        self.client_status().is_some()
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(e: std::io::Error) -> Self {
        DispatchError::Internal(e.into())
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        DispatchError::Internal(e.into())
    }
}

/// Failure while assembling or booting a dispatcher.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("endpoint registry is frozen; cannot register `{path}` after start")]
    Frozen { path: String },
    #[error("unknown handler `{0}`")]
    UnknownHandler(String),
    #[error("unknown middleware `{0}`")]
    UnknownMiddleware(String),
    #[error("unknown router class `{0}`")]
    UnknownRouter(String),
    #[error("failed to construct fallback router")]
    Router(#[source] anyhow::Error),
    #[error("failed to load error templates")]
    Templates(#[source] anyhow::Error),
}
