use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Keyset;
use crate::error::{ApiError, Result};

/// Localized post text
#[derive(SimpleObject, InputObject, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(input_name = "LanTypeInput")]
pub struct LanType {
    pub ru: String,
    pub en: String,
}

#[derive(Enum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    En,
    Ru,
}

/// Post body as stored in the `text` JSONB column: either a bare string or a
/// `{ "ru": .., "en": .. }` object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostText {
    Localized(LanType),
    Plain(String),
}

impl PostText {
    /// Text must be non-empty once surrounding whitespace is removed. Every
    /// translation of a localized text is checked.
    pub fn validate(&self) -> Result<()> {
        let empty = match self {
            PostText::Plain(text) => text.trim().is_empty(),
            PostText::Localized(lan) => lan.ru.trim().is_empty() || lan.en.trim().is_empty(),
        };

        if empty {
            return Err(ApiError::validation("Post text cannot be empty"));
        }
        Ok(())
    }

    pub fn in_language(&self, language: Language) -> &str {
        match (self, language) {
            (PostText::Plain(text), _) => text,
            (PostText::Localized(lan), Language::En) => &lan.en,
            (PostText::Localized(lan), Language::Ru) => &lan.ru,
        }
    }

    pub fn translations(&self) -> Option<&LanType> {
        match self {
            PostText::Localized(lan) => Some(lan),
            PostText::Plain(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub text: PostText,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

impl Post {
    pub fn keyset(&self) -> Keyset {
        Keyset {
            created_at: self.created_at,
            id: self.id,
        }
    }
}

/// Insert payload; `created_at` is assigned by the caller so repositories
/// keep the same microsecond precision as PostgreSQL.
#[derive(Clone, Debug)]
pub struct NewPost {
    pub user_id: Uuid,
    pub text: PostText,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lan(ru: &str, en: &str) -> LanType {
        LanType {
            ru: ru.to_string(),
            en: en.to_string(),
        }
    }

    #[test]
    fn test_blank_text_is_rejected() {
        assert!(PostText::Plain("   ".into()).validate().is_err());
        assert!(PostText::Plain(String::new()).validate().is_err());
        assert!(PostText::Plain("hello".into()).validate().is_ok());
    }

    #[test]
    fn test_localized_text_requires_every_translation() {
        assert!(PostText::Localized(lan("привет", "")).validate().is_err());
        assert!(PostText::Localized(lan("привет", "hello")).validate().is_ok());
    }

    #[test]
    fn test_text_column_accepts_both_shapes() {
        let plain: PostText = serde_json::from_value(serde_json::json!("hello")).unwrap();
        assert_eq!(plain, PostText::Plain("hello".into()));

        let localized: PostText =
            serde_json::from_value(serde_json::json!({ "ru": "привет", "en": "hello" })).unwrap();
        assert_eq!(localized.in_language(Language::Ru), "привет");
        assert_eq!(localized.in_language(Language::En), "hello");
        assert!(plain.translations().is_none());
    }
}
