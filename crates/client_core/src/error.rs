use shared::domain::LineId;
use thiserror::Error;

pub const GENERIC_SERVER_ERROR: &str = "Server error. Please try again later.";
pub const GENERIC_CONNECTIVITY_ERROR: &str =
    "Could not reach the server. Check your connection and try again.";
pub const BREED_NOT_DETECTED: &str = "Could not detect the breed.";
pub const CART_UPDATE_FAILED: &str = "Failed to update the cart.";
pub const CART_CONNECTIVITY_ERROR: &str = "Lost connection to the server. Reloading the page...";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("unsupported media type '{media_type}'")]
    WrongType { media_type: String },
}

impl ValidationError {
    /// Text shown next to the drop area.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::TooLarge { limit, .. } => {
                format!("File is too large! Maximum {}.", size_label(*limit))
            }
            ValidationError::WrongType { .. } => {
                "Unsupported file format. Please choose an image.".to_string()
            }
        }
    }
}

/// Largest whole unit that does not round the limit up.
fn size_label(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Outcome buckets for a failed request. Success is the `Ok` side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No response was obtained.
    #[error("transport failure: {reason}")]
    Transport { reason: String, timed_out: bool },
    /// A response arrived but signals failure.
    #[error("application failure (status {status}): {}", message.as_deref().unwrap_or("no message"))]
    Application {
        status: u16,
        message: Option<String>,
    },
}

impl RequestError {
    pub fn transport(err: &reqwest::Error) -> Self {
        RequestError::Transport {
            reason: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RequestError::Transport { .. })
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            RequestError::Application {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart line {0} is not registered")]
    UnknownLine(LineId),
}
