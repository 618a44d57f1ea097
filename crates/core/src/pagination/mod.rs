//! Keyset pagination engine.
//!
//! Lists are windows over a collection ordered by creation time. Callers
//! move through them with opaque cursors instead of page numbers, forward
//! (`first`/`after`) or backward (`last`/`before`), in the Relay
//! connection style commonly used with GraphQL.
//!
//! # Flow
//!
//! 1. [`PageArgs::into_request`] validates caller input into a [`PageRequest`]
//! 2. A window fetcher returns up to [`PageRequest::query_limit`] rows
//! 3. [`Pager::paginate`] trims the extra row and builds the [`Connection`]
//! 4. Services enrich nodes with [`Connection::try_map_nodes`]

mod cursor;
mod pager;
mod request;

use chrono::{DateTime, Utc};

pub use cursor::Cursor;
pub use pager::Pager;
pub use request::{DEFAULT_LIMIT, MAX_LIMIT, PageArgs, PageDirection, PageRequest};

/// An entity that can be paginated.
///
/// The sort key orders the collection; the cursor is derived from it.
pub trait Node {
    /// Sort key of this item (its creation instant).
    fn sort_key(&self) -> DateTime<Utc>;

    /// Cursor pointing at this item.
    fn cursor(&self) -> Cursor {
        Cursor::from_timestamp(self.sort_key())
    }
}

/// Paginated result set with edges and page info.
#[derive(Debug, Clone)]
pub struct Connection<T> {
    /// List of edges (node + cursor pairs), ascending by sort key.
    pub edges: Vec<Edge<T>>,
    /// Information about the current page.
    pub page_info: PageInfo,
}

/// A single item in a paginated result.
#[derive(Debug, Clone)]
pub struct Edge<T> {
    /// The actual item.
    pub node: T,
    /// Cursor for this item.
    pub cursor: Cursor,
}

/// Information about the current page in a paginated result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Whether there are items before this page.
    pub has_previous_page: bool,
    /// Cursor of the first item in this page.
    pub start_cursor: Option<Cursor>,
    /// Cursor of the last item in this page.
    pub end_cursor: Option<Cursor>,
}

impl<T> Connection<T> {
    /// A connection with no items.
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterate over the nodes in display order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|e| &e.node)
    }

    /// Consume the connection, keeping only the nodes.
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }

    /// Replace every node, keeping cursors and page info untouched.
    ///
    /// Enrichment goes through this (or [`Connection::try_map_nodes`]) so a
    /// finalized window keeps its pagination.
    pub fn map_nodes<U>(self, mut f: impl FnMut(T) -> U) -> Connection<U> {
        Connection {
            edges: self
                .edges
                .into_iter()
                .map(|e| Edge {
                    node: f(e.node),
                    cursor: e.cursor,
                })
                .collect(),
            page_info: self.page_info,
        }
    }

    /// Fallible [`Connection::map_nodes`]: the first error aborts the whole
    /// connection, so no partially enriched window is ever returned.
    pub fn try_map_nodes<U, E>(
        self,
        mut f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<Connection<U>, E> {
        let edges = self
            .edges
            .into_iter()
            .map(|e| {
                Ok(Edge {
                    node: f(e.node)?,
                    cursor: e.cursor,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;

        Ok(Connection {
            edges,
            page_info: self.page_info,
        })
    }
}
