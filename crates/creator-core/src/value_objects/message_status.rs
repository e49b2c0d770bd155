//! Message delivery status and its forward-only ordering

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery status of a message as seen by its recipients
///
/// Variants are declared in progress order, so the derived `Ord` is the
/// single source of truth for "forward".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    /// Whether moving from `self` to `next` is progress
    ///
    /// Every call site that mutates a status goes through this check.
    #[inline]
    pub fn is_forward(self, next: Self) -> bool {
        next > self
    }

    /// Resulting status after requesting `next`; unchanged when `next` is not forward
    #[inline]
    pub fn advanced(self, next: Self) -> Self {
        if self.is_forward(next) {
            next
        } else {
            self
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            _ => Err(format!("Invalid message status: {s}")),
        }
    }
}
