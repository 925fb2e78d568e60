//! Small response wrappers shared by several Grafana endpoints.

use serde::{Deserialize, Serialize};

/// `{"id": …}` body returned by creation endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse<T> {
    /// Identifier of the created resource.
    pub id: T,
}

/// `{"message": …}` body returned by mutation and deletion endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome reported by the server.
    #[serde(default)]
    pub message: String,
}
