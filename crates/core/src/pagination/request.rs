//! Page request construction.

use serde::{Deserialize, Serialize};

use crate::error::{PaginationError, PaginationResult};

use super::cursor::Cursor;

/// Upper bound on the number of items in one window.
pub const MAX_LIMIT: u32 = 1000;

/// Window size used when the caller asks for zero or fewer items.
pub const DEFAULT_LIMIT: u32 = 20;

/// Traversal orientation of a page request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageDirection {
    /// Walk forward from a lower bound (`first` / `after`).
    #[default]
    Next,
    /// Walk backward from an upper bound (`last` / `before`).
    Prev,
}

impl PageDirection {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
        }
    }
}

/// Raw pagination arguments as received from a caller.
///
/// Supports forward pagination (`first`/`after`) and backward
/// pagination (`last`/`before`). Exactly one of `first` and `last`
/// must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageArgs {
    /// Number of items to fetch (forward pagination).
    pub first: Option<i32>,
    /// Cursor to start after (forward pagination).
    pub after: Option<String>,
    /// Number of items to fetch (backward pagination).
    pub last: Option<i32>,
    /// Cursor to end before (backward pagination).
    pub before: Option<String>,
}

impl PageArgs {
    /// Forward arguments.
    pub fn forward(first: i32, after: Option<String>) -> Self {
        Self {
            first: Some(first),
            after,
            ..Default::default()
        }
    }

    /// Backward arguments.
    pub fn backward(last: i32, before: Option<String>) -> Self {
        Self {
            last: Some(last),
            before,
            ..Default::default()
        }
    }

    /// Validate the arguments and decode the cursor that goes with the
    /// chosen direction. The cursor of the other direction is ignored.
    pub fn into_request(self) -> PaginationResult<PageRequest> {
        match (self.first, self.last) {
            (Some(first), None) => {
                let cursor = Cursor::decode(self.after.as_deref())?;
                Ok(PageRequest::new(cursor, first, PageDirection::Next))
            }
            (None, Some(last)) => {
                let cursor = Cursor::decode(self.before.as_deref())?;
                Ok(PageRequest::new(cursor, last, PageDirection::Prev))
            }
            (Some(_), Some(_)) => Err(PaginationError::InvalidPageArguments(
                "'first' and 'last' cannot be combined".to_string(),
            )),
            (None, None) => Err(PaginationError::InvalidPageArguments(
                "one of 'first' or 'last' is required".to_string(),
            )),
        }
    }
}

/// Validated, clamped pagination parameters.
///
/// Callers must have chosen exactly one direction before building one
/// (see [`PageArgs::into_request`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    cursor: Option<Cursor>,
    size: u32,
    direction: PageDirection,
}

impl PageRequest {
    /// Build a request, clamping the size.
    ///
    /// A size of zero or less falls back to [`DEFAULT_LIMIT`]; anything
    /// above [`MAX_LIMIT`] is silently reduced to it.
    pub fn new(cursor: Option<Cursor>, requested_size: i32, direction: PageDirection) -> Self {
        let size = match u32::try_from(requested_size) {
            Ok(0) | Err(_) => DEFAULT_LIMIT,
            Ok(n) => n.min(MAX_LIMIT),
        };

        Self {
            cursor,
            size,
            direction,
        }
    }

    /// First page from the open start of the collection.
    pub fn first_page(size: i32) -> Self {
        Self::new(None, size, PageDirection::Next)
    }

    /// Boundary to resume from, or `None` for the open end.
    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    /// Number of items the caller will receive at most.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn direction(&self) -> PageDirection {
        self.direction
    }

    /// Rows to ask the store for: one more than the page size, so that the
    /// presence of the extra row proves more data exists.
    pub fn query_limit(&self) -> u32 {
        self.size + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_clamping() {
        assert_eq!(PageRequest::first_page(0).size(), DEFAULT_LIMIT);
        assert_eq!(PageRequest::first_page(-5).size(), DEFAULT_LIMIT);
        assert_eq!(PageRequest::first_page(i32::MIN).size(), DEFAULT_LIMIT);
        assert_eq!(PageRequest::first_page(1).size(), 1);
        assert_eq!(PageRequest::first_page(MAX_LIMIT as i32).size(), MAX_LIMIT);
        assert_eq!(PageRequest::first_page(MAX_LIMIT as i32 + 1).size(), MAX_LIMIT);
        assert_eq!(PageRequest::first_page(i32::MAX).size(), MAX_LIMIT);
    }

    #[test]
    fn test_query_limit_overfetches_by_one() {
        assert_eq!(PageRequest::first_page(20).query_limit(), 21);
        assert_eq!(PageRequest::first_page(100_000).query_limit(), MAX_LIMIT + 1);
    }

    #[test]
    fn test_forward_args() {
        let req = PageArgs::forward(10, Some("1000".into())).into_request().unwrap();
        assert_eq!(req.direction(), PageDirection::Next);
        assert_eq!(req.size(), 10);
        assert_eq!(req.cursor().map(|c| c.millis()), Some(1000));
    }

    #[test]
    fn test_backward_args() {
        let req = PageArgs::backward(5, Some("2000".into())).into_request().unwrap();
        assert_eq!(req.direction(), PageDirection::Prev);
        assert_eq!(req.size(), 5);
        assert_eq!(req.cursor().map(|c| c.millis()), Some(2000));
    }

    // Le curseur de l'autre direction est ignoré, même s'il est invalide
    #[test]
    fn test_other_direction_cursor_is_ignored() {
        let args = PageArgs {
            first: Some(3),
            before: Some("garbage".into()),
            ..Default::default()
        };
        let req = args.into_request().unwrap();
        assert_eq!(req.cursor(), None);
    }

    #[test]
    fn test_exactly_one_size_required() {
        let both = PageArgs {
            first: Some(1),
            last: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            both.into_request(),
            Err(PaginationError::InvalidPageArguments(_))
        ));
        assert!(matches!(
            PageArgs::default().into_request(),
            Err(PaginationError::InvalidPageArguments(_))
        ));
    }

    #[test]
    fn test_malformed_cursor_fails_request() {
        let err = PageArgs::forward(10, Some("not-a-number".into()))
            .into_request()
            .unwrap_err();
        assert!(matches!(err, PaginationError::InvalidCursor(_)));
    }

    #[test]
    fn test_empty_cursor_is_first_page() {
        let req = PageArgs::forward(10, Some(String::new())).into_request().unwrap();
        assert_eq!(req, PageRequest::first_page(10));
    }
}
