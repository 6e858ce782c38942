use serde::{Deserialize, Serialize};

/// Error body returned by the transfer endpoint. Servers that only send a
/// `detail` string are accepted as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(alias = "detail")]
    pub message: String,
}
