use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Keyset;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

impl Message {
    pub fn keyset(&self) -> Keyset {
        Keyset {
            created_at: self.created_at,
            id: self.id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewMessage {
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
