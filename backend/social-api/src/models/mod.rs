//! Domain models shared by the repositories, the broker and the schema

pub mod message;
pub mod post;
pub mod user;

pub use message::{Message, NewMessage};
pub use post::{LanType, Language, NewPost, Post, PostText};
pub use user::{NewUser, Role, User};

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

/// Position of a row in creation order. `id` breaks ties between rows
/// created in the same microsecond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Keyset {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Keyset {
    /// Sorts after every row created at `created_at`
    pub fn after_instant(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            id: Uuid::max(),
        }
    }
}

/// Current time at the precision PostgreSQL stores (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
