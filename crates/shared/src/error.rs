use serde::{Deserialize, Serialize};

/// Error body returned by storefront endpoints alongside a non-success status.
///
/// Every field is optional: the client decodes whatever is present and falls
/// back to a generic message otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Returns the server message if it carries any visible text.
    pub fn visible_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }
}
