//! Cursor-based pagination over rows ordered by creation time, ties broken by id

use async_graphql::{OutputType, SimpleObject};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::error::{ApiError, Result};
use crate::models::{Keyset, Message, Post};

/// Page info for cursor pagination
#[derive(SimpleObject, Clone, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// Whether there are more items after the current page
    pub has_next_page: bool,
    /// Cursor of the last returned item; `null` on an empty page
    pub end_cursor: Option<String>,
}

/// One page of rows
#[derive(SimpleObject, Clone, Debug)]
#[graphql(concrete(name = "PostConnection", params(Post)))]
#[graphql(concrete(name = "MessageConnection", params(Message)))]
pub struct Connection<T: OutputType> {
    pub edges: Vec<T>,
    pub page_info: PageInfo,
}

/// Opaque cursor encoding. Standard base64 of the UTF-8 bytes; it hides
/// the value from casual inspection but is not tamper-proof.
pub struct CursorCodec;

impl CursorCodec {
    pub fn encode(value: &str) -> String {
        general_purpose::STANDARD.encode(value)
    }

    /// Never fails: a token that is not base64 decodes to an empty string,
    /// and invalid UTF-8 is replaced lossily.
    pub fn decode(token: &str) -> String {
        general_purpose::STANDARD
            .decode(token)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }

    /// Format: base64("2024-01-01T00:00:00.000001Z,id:<uuid>")
    pub fn encode_keyset(keyset: Keyset) -> String {
        Self::encode(&format!(
            "{},id:{}",
            keyset.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            keyset.id
        ))
    }

    /// A cursor holding only a timestamp resumes after every row created
    /// at that instant.
    pub fn decode_keyset(token: &str) -> Result<Keyset> {
        let invalid = || ApiError::validation("Invalid cursor");
        let decoded = Self::decode(token);

        let (timestamp, id) = match decoded.split_once(',') {
            Some((timestamp, id)) => {
                let id = id.strip_prefix("id:").ok_or_else(invalid)?;
                (timestamp, Some(Uuid::parse_str(id).map_err(|_| invalid())?))
            }
            None => (decoded.as_str(), None),
        };

        let created_at = DateTime::parse_from_rfc3339(timestamp)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| invalid())?;

        Ok(match id {
            Some(id) => Keyset { created_at, id },
            None => Keyset::after_instant(created_at),
        })
    }

    /// Creation time a cursor points at
    pub fn decode_timestamp(token: &str) -> Result<DateTime<Utc>> {
        Self::decode_keyset(token).map(|keyset| keyset.created_at)
    }
}

/// Validated `(cursor, limit)` arguments of a connection field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub after: Option<Keyset>,
    pub limit: i32,
}

impl PageRequest {
    /// An empty cursor string is treated like a missing one.
    pub fn parse(
        cursor: Option<&str>,
        limit: Option<i32>,
        config: PaginationConfig,
    ) -> Result<Self> {
        let limit = limit.unwrap_or(config.default_limit);
        if limit < 1 || limit > config.max_limit {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {}",
                config.max_limit
            )));
        }

        let after = match cursor {
            Some(token) if !token.is_empty() => Some(CursorCodec::decode_keyset(token)?),
            _ => None,
        };

        Ok(Self { after, limit })
    }

    /// Rows to request: one more than the page so the next page can be detected
    pub fn fetch_limit(&self) -> i64 {
        i64::from(self.limit) + 1
    }

    /// Trim the look-ahead row and compute page info
    pub fn into_page<T, F>(self, mut rows: Vec<T>, keyset: F) -> Connection<T>
    where
        T: OutputType,
        F: Fn(&T) -> Keyset,
    {
        let limit = usize::try_from(self.limit).unwrap_or(0);
        let has_next_page = rows.len() > limit;
        rows.truncate(limit);

        let end_cursor = rows
            .last()
            .map(|row| CursorCodec::encode_keyset(keyset(row)));

        Connection {
            edges: rows,
            page_info: PageInfo {
                has_next_page,
                end_cursor,
            },
        }
    }
}
