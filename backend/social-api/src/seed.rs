//! Demo data for local development

use chrono::Duration;
use tracing::info;

use crate::context::AppState;
use crate::error::Result;
use crate::models::{self, NewMessage, NewPost, NewUser, PostText, Role, User};
use crate::security::hash_password;

struct SeedUser {
    username: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
    posts: &'static [&'static str],
    messages: &'static [&'static str],
}

static SEED_USERS: [SeedUser; 2] = [
    SeedUser {
        username: "dillas",
        email: "hello@robin.com",
        password: "huikt0uznaet",
        role: Role::Admin,
        posts: &[
            "POST 1 \"dillas\" Published the Road to learn React",
            "POST 2 \"dillas\" Published the Road to learn React",
            "POST 3 \"dillas\" Published the Road to learn React",
            "POST 4 \"dillas\" Published the Road to learn React",
            "POST 5 \"dillas\" Published the Road to learn React",
        ],
        messages: &["Published the Road to learn React"],
    },
    SeedUser {
        username: "jonohn",
        email: "hello@david.com",
        password: "349761",
        role: Role::User,
        posts: &[
            "POST \"jonohn\" Published the Road to learn React",
            "POST \"jonohn\" Published the Road to learn React",
            "POST \"jonohn\" Published the Road to learn React",
        ],
        messages: &["Happy to release ...", "Published a complete ..."],
    },
];

/// Insert the demo users with their posts and messages. Every row gets a
/// creation time one second after the previous one, so pagination over the
/// seeded data is deterministic.
pub async fn seed(state: &AppState) -> Result<Vec<User>> {
    let mut clock = models::now();
    let mut tick = move || {
        clock += Duration::seconds(1);
        clock
    };

    let mut users = Vec::with_capacity(SEED_USERS.len());
    for seed_user in &SEED_USERS {
        let user = state
            .users
            .create_user(NewUser {
                username: seed_user.username.to_string(),
                email: seed_user.email.to_string(),
                password_hash: hash_password(seed_user.password)?,
                role: seed_user.role,
            })
            .await?;

        for text in seed_user.posts {
            state
                .posts
                .create_post(NewPost {
                    user_id: user.id,
                    text: PostText::Plain(text.to_string()),
                    created_at: tick(),
                })
                .await?;
        }

        for text in seed_user.messages {
            state
                .messages
                .create_message(NewMessage {
                    user_id: user.id,
                    text: text.to_string(),
                    created_at: tick(),
                })
                .await?;
        }

        info!(
            user_id = %user.id,
            username = %user.username,
            posts = seed_user.posts.len(),
            messages = seed_user.messages.len(),
            "Seeded user"
        );
        users.push(user);
    }

    Ok(users)
}
