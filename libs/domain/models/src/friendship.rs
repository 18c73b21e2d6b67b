// [libs/domain/models/src/friendship.rs]
//! Grafo de amistad: base para la visibilidad `friends_only` y para el
//! consentimiento por-defecto cuando una politica explicita no cubre
//! al solicitante.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Declined,
    Blocked,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Active,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FriendsWith {
    pub friendship_id: String,
    pub user_a_id: String,
    pub user_b_id: String,
    pub status: FriendshipStatus,
    pub since: DateTime<Utc>,
}
