use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a data channel as seen from this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sendonly,
    Recvonly,
    Sendrecv,
}

impl Direction {
    pub fn can_send(self) -> bool {
        matches!(self, Self::Sendonly | Self::Sendrecv)
    }

    pub fn can_receive(self) -> bool {
        matches!(self, Self::Recvonly | Self::Sendrecv)
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::Sendrecv
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sendonly => "sendonly",
            Self::Recvonly => "recvonly",
            Self::Sendrecv => "sendrecv",
        };
        f.write_str(name)
    }
}

/// A labeled data channel declared when the session is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataChannelSpec {
    pub label: String,
    #[serde(default)]
    pub direction: Direction,
}

impl DataChannelSpec {
    pub fn new(label: impl Into<String>, direction: Direction) -> Self {
        Self {
            label: label.into(),
            direction,
        }
    }

    /// Parses the JSON list form, e.g. `[{"label": "#foo", "direction": "sendrecv"}]`.
    pub fn parse_list(json: &str) -> Result<Vec<Self>, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Invalid {
            field: "data_channels",
            reason: e.to_string(),
        })
    }
}
