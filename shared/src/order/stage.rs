//! Canonical kitchen stage and status normalization
//!
//! Two stored vocabularies coexist in the feed:
//!
//! | Field           | Values                                                   |
//! |-----------------|----------------------------------------------------------|
//! | `kitchenStatus` | `queued`, `preparing`, `ready`, `delivered`              |
//! | `status`        | `pending`, `paid`, `PENDING`, `PREPARING`, `READY`, `DELIVERED` |
//!
//! [`KitchenStage::resolve`] is the single place that turns them into a stage.
//! Unknown tokens resolve to [`KitchenStage::Queued`] so an order is never
//! hidden because of a value this build does not know about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kitchen progress of an order
///
/// Only moves forward: `Queued → Preparing → Ready → Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KitchenStage {
    #[default]
    Queued,
    Preparing,
    Ready,
    Delivered,
}

impl KitchenStage {
    /// Resolve the stage of a record
    ///
    /// A present `kitchenStatus` wins outright; `status` is only consulted for
    /// records written before the dedicated field existed.
    pub fn resolve(kitchen_status: Option<&str>, legacy_status: Option<&str>) -> Self {
        match kitchen_status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(token) => Self::from_kitchen_status(token),
            None => legacy_status.map_or(Self::Queued, Self::from_legacy_status),
        }
    }

    /// Map a `kitchenStatus` token
    pub fn from_kitchen_status(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "preparing" => Self::Preparing,
            "ready" => Self::Ready,
            "delivered" => Self::Delivered,
            other => {
                tracing::debug!(token = %other, "Unknown kitchenStatus, treating as queued");
                Self::Queued
            }
        }
    }

    /// Map a legacy `status` token (case-insensitive)
    pub fn from_legacy_status(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PAID" => Self::Queued,
            "PREPARING" => Self::Preparing,
            "READY" => Self::Ready,
            "DELIVERED" => Self::Delivered,
            other => {
                tracing::debug!(token = %other, "Unknown legacy status, treating as queued");
                Self::Queued
            }
        }
    }

    /// The stage one tap moves to, `None` once delivered
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Queued => Some(Self::Preparing),
            Self::Preparing => Some(Self::Ready),
            Self::Ready => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Whether an order in this stage belongs on the board
    pub fn is_visible(self) -> bool {
        self != Self::Delivered
    }

    /// Token used in the `kitchenStatus` field
    pub fn kitchen_token(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
        }
    }

    /// Token used in the legacy `status` field
    pub fn legacy_token(self) -> &'static str {
        match self {
            Self::Queued => "PENDING",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for KitchenStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kitchen_token())
    }
}

/// Stored field that stage writes go to
///
/// One deployment writes one field; both are never written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusField {
    /// Dedicated `kitchenStatus` field (lowercase tokens)
    #[default]
    KitchenStatus,
    /// Legacy `status` field (uppercase tokens)
    Status,
}

impl StatusField {
    /// Stored field name
    pub fn field_name(self) -> &'static str {
        match self {
            Self::KitchenStatus => "kitchenStatus",
            Self::Status => "status",
        }
    }

    /// Token written for `stage`
    pub fn token(self, stage: KitchenStage) -> &'static str {
        match self {
            Self::KitchenStatus => stage.kitchen_token(),
            Self::Status => stage.legacy_token(),
        }
    }

    /// Parse a field name (`kitchenStatus` / `status`)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "kitchenStatus" | "kitchen_status" => Some(Self::KitchenStatus),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}
