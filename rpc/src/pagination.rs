//! Cursor-based pagination for list endpoints.
//!
//! A cursor is the base64 encoding of the decimal id of the last record on
//! the previous page; the next page starts after it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::RpcError;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Common pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Opaque cursor from a previous response.
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// The id the page starts after, `None` without a cursor.
    pub fn after(&self) -> Result<Option<u64>, RpcError> {
        match self.cursor.as_deref() {
            None => Ok(None),
            Some(c) => decode_cursor(c)
                .map(Some)
                .ok_or_else(|| RpcError::InvalidRequest(format!("invalid cursor {c:?}"))),
        }
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Cursor to pass for the next page, or `None` if this is the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

pub fn encode_cursor(last_id: u64) -> String {
    B64.encode(last_id.to_string())
}

pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let bytes = B64.decode(cursor).ok()?;
    std::str::from_utf8(&bytes).ok()?.parse::<u64>().ok()
}

/// Cursor for the page after one ending at `last_id`. A short page is the
/// last one and gets no cursor.
pub fn next_cursor(last_id: Option<u64>, returned: usize, page_size: u32) -> Option<String> {
    if (returned as u32) < page_size {
        None
    } else {
        last_id.map(encode_cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_roundtrip() {
        for id in [0u64, 1, 42, 100, 999, 123456789] {
            assert_eq!(decode_cursor(&encode_cursor(id)), Some(id), "roundtrip failed for {id}");
        }
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        let p = PaginationParams {
            cursor: Some("!!".into()),
            count: None,
        };
        assert!(p.after().is_err());
        assert_eq!(decode_cursor(&B64.encode("abc")), None);
    }

    #[test]
    fn next_cursor_returns_none_at_end() {
        assert!(next_cursor(Some(50), 50, 100).is_none());
    }

    #[test]
    fn next_cursor_returns_some_when_full_page() {
        let c = next_cursor(Some(100), 100, 100);
        assert_eq!(decode_cursor(c.as_deref().unwrap()), Some(100));
    }

    #[test]
    fn effective_count_defaults_and_clamps() {
        assert_eq!(PaginationParams::default().effective_count(), 100);
        let p = PaginationParams {
            cursor: None,
            count: Some(5000),
        };
        assert_eq!(p.effective_count(), 1000);
        let p = PaginationParams {
            cursor: None,
            count: Some(0),
        };
        assert_eq!(p.effective_count(), 1);
    }
}
