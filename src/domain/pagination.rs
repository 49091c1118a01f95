//! Cursor pagination shared by every list operation.
//!
//! Stores are asked for `limit + 1` rows past the cursor; the extra row only
//! tells us whether another page exists and is never returned.

use super::RowId;
use super::cursor::CursorCodec;
use crate::error::{MatchError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Next,
    Prev,
}

impl FromStr for Direction {
    type Err = MatchError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "" | "next" => Ok(Direction::Next),
            "prev" => Ok(Direction::Prev),
            other => Err(MatchError::ValidationError(format!(
                "direction: {other} does not validate as in(next|prev)"
            ))),
        }
    }
}

/// Implemented by rows that can be paginated.
pub trait Keyed {
    fn row_id(&self) -> RowId;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    /// Free-text filter.
    pub keywords: String,
    pub cursor: Option<String>,
    pub direction: Direction,
    pub limit: usize,
    /// Public mask id of the caller.
    pub caller: String,
}

/// The decoded, store-facing form of a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub keywords: String,
    pub cursor: Option<RowId>,
    pub direction: Direction,
    /// Rows to fetch: the page size plus one look-ahead row.
    pub fetch_limit: usize,
}

impl PageWindow {
    /// Whether the store should walk ascending ids away from the cursor.
    pub fn walks_backward(&self) -> bool {
        self.cursor.is_some() && self.direction == Direction::Prev
    }

    /// Whether a row lies past the cursor in this window's direction.
    pub fn admits(&self, id: RowId) -> bool {
        match (self.cursor, self.direction) {
            (None, _) => true,
            (Some(cursor), Direction::Next) => id < cursor,
            (Some(cursor), Direction::Prev) => id > cursor,
        }
    }

    /// Case-insensitive keyword match against any of `fields`.
    pub fn matches_keywords(&self, fields: &[&str]) -> bool {
        let needle = self.keywords.trim().to_lowercase();
        needle.is_empty()
            || fields
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl PageRequest {
    /// Validates the request and returns the store window with the
    /// effective page size.
    ///
    /// A missing cursor always means "start at the head", so `prev` without
    /// a cursor is treated as `next`.
    pub fn window(&self, codec: &CursorCodec, max_page_size: usize) -> Result<(PageWindow, usize)> {
        if self.limit == 0 {
            return Err(MatchError::ValidationError(
                "limit: non zero value required".to_string(),
            ));
        }
        let limit = self.limit.min(max_page_size.max(1));

        let cursor = match self.cursor.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(token) => Some(codec.decode(token)?),
        };
        let direction = if cursor.is_some() {
            self.direction
        } else {
            Direction::Next
        };

        Ok((
            PageWindow {
                keywords: self.keywords.trim().to_string(),
                cursor,
                direction,
                fetch_limit: limit + 1,
            },
            limit,
        ))
    }
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Page<T> {
    #[serde(rename = "data")]
    pub items: Vec<T>,
    pub load_more: bool,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
    pub limit: usize,
    #[serde(rename = "q")]
    pub keywords: String,
}

impl<T> Page<T> {
    pub fn empty(window: &PageWindow, limit: usize) -> Self {
        Self {
            items: Vec::new(),
            load_more: false,
            next_cursor: None,
            prev_cursor: None,
            limit,
            keywords: window.keywords.clone(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            load_more: self.load_more,
            next_cursor: self.next_cursor,
            prev_cursor: self.prev_cursor,
            limit: self.limit,
            keywords: self.keywords,
        }
    }
}

/// Turns a raw store window of at most `limit + 1` rows into a page.
///
/// Rows arrive newest-first, or oldest-first when the window walks backward;
/// the returned items are always newest-first.
pub fn paginate<T: Keyed>(
    mut rows: Vec<T>,
    window: &PageWindow,
    limit: usize,
    codec: &CursorCodec,
) -> Page<T> {
    let mut page = Page::empty(window, limit);
    if rows.is_empty() {
        return page;
    }

    let load_more = rows.len() > limit;
    rows.truncate(limit);
    if window.walks_backward() {
        rows.reverse();
    }

    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return page;
    };
    let (first, last) = (first.row_id(), last.row_id());

    let backward = window.direction == Direction::Prev;
    page.next_cursor = (load_more || backward).then(|| codec.encode(last));
    page.prev_cursor =
        (window.cursor.is_some() && (load_more || !backward)).then(|| codec.encode(first));
    page.load_more = load_more;
    page.items = rows;
    page
}
