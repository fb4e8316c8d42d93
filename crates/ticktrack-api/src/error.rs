use thiserror::Error;

/// Which REST resource a request targeted.  Used to phrase not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Task,
    User,
}

impl Resource {
    fn not_found_message(self) -> &'static str {
        match self {
            Resource::Task => "task not found",
            Resource::User => "user not found",
        }
    }
}

/// Errors that can be returned by ticktrack-api operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, TLS, ...).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.  `message` is already
    /// human-readable.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A form failed the client-side rules before anything was sent.
    #[error("invalid data: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// The configured base URL cannot be used to build endpoint URLs.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Map a backend status code and raw response body to an [`ApiError::Status`].
    ///
    /// The backend message is taken from the JSON body's `message` field,
    /// falling back to `error`.
    pub fn from_status(resource: Resource, status: u16, body: &str) -> Self {
        let backend_message = backend_message(body);

        let message = match status {
            404 => resource.not_found_message().to_owned(),
            409 if resource == Resource::User => "email already in use".to_owned(),
            400 => backend_message.unwrap_or_else(|| "invalid data".to_owned()),
            500 => format!(
                "server error: {}",
                backend_message.as_deref().unwrap_or("try again later")
            ),
            other => backend_message.unwrap_or_else(|| format!("error {other}")),
        };

        ApiError::Status { status, message }
    }

    /// HTTP status reported by the backend, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}
