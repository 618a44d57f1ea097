//! Window trimming and connection assembly.

use super::request::{PageDirection, PageRequest};
use super::{Connection, Edge, Node, PageInfo};

/// Turns a raw over-fetched batch into a [`Connection`].
///
/// The batch must come from a window fetcher that honoured the request:
/// at most `query_limit()` rows, ascending for [`PageDirection::Next`],
/// descending (closest to the boundary first) for [`PageDirection::Prev`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Pager;

impl Pager {
    /// Trim the sentinel row, restore ascending order, and compute page info.
    ///
    /// Only the flag of the traversed direction is computed; the opposite
    /// flag is always `false`.
    pub fn paginate<T, I>(batch: I, request: &PageRequest) -> Connection<T>
    where
        T: Node,
        I: IntoIterator<Item = T>,
    {
        let size = request.size() as usize;
        let mut batch = batch.into_iter();

        let window: Vec<T> = batch.by_ref().take(size).collect();
        let has_extra = batch.next().is_some();

        let ordered: Vec<T> = match request.direction() {
            PageDirection::Next => window,
            PageDirection::Prev => window.into_iter().rev().collect(),
        };

        let edges: Vec<Edge<T>> = ordered
            .into_iter()
            .map(|node| Edge {
                cursor: node.cursor(),
                node,
            })
            .collect();

        let (has_next_page, has_previous_page) = match request.direction() {
            PageDirection::Next => (has_extra, false),
            PageDirection::Prev => (false, has_extra),
        };

        let page_info = PageInfo {
            has_next_page,
            has_previous_page,
            start_cursor: edges.first().map(|e| e.cursor),
            end_cursor: edges.last().map(|e| e.cursor),
        };

        Connection { edges, page_info }
    }

    /// Cut a raw window out of a slice sorted ascending by sort key, the
    /// way a store query would: keyset bound, direction-dependent order,
    /// `query_limit()` rows. Feed the result to [`Pager::paginate`].
    pub fn window<'a, T>(items: &'a [T], request: &PageRequest) -> Vec<&'a T>
    where
        T: Node,
    {
        let limit = request.query_limit() as usize;
        let bound = request.cursor();
        let after = |node: &&T| bound.is_none_or(|b| node.cursor() > b);
        let before = |node: &&T| bound.is_none_or(|b| node.cursor() < b);

        match request.direction() {
            PageDirection::Next => items.iter().filter(after).take(limit).collect(),
            PageDirection::Prev => items.iter().rev().filter(before).take(limit).collect(),
        }
    }
}

impl<T: Node> Node for &T {
    fn sort_key(&self) -> chrono::DateTime<chrono::Utc> {
        (*self).sort_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Cursor;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone, PartialEq)]
    struct Item(i64);

    impl Node for Item {
        fn sort_key(&self) -> DateTime<Utc> {
            DateTime::from_timestamp_millis(self.0).unwrap()
        }
    }

    fn items(range: std::ops::RangeInclusive<i64>) -> Vec<Item> {
        range.map(Item).collect()
    }

    fn keys(conn: &Connection<Item>) -> Vec<i64> {
        conn.nodes().map(|i| i.0).collect()
    }

    fn request(size: i32, direction: PageDirection) -> PageRequest {
        PageRequest::new(None, size, direction)
    }

    // Scenario A: forward, more data
    #[test]
    fn test_forward_with_sentinel() {
        let conn = Pager::paginate(items(1..=21), &request(20, PageDirection::Next));

        assert_eq!(conn.len(), 20);
        assert!(conn.page_info.has_next_page);
        assert!(!conn.page_info.has_previous_page);
        assert_eq!(conn.page_info.start_cursor.map(|c| c.millis()), Some(1));
        assert_eq!(conn.page_info.end_cursor.map(|c| c.millis()), Some(20));
    }

    // Scenario B: forward, exact
    #[test]
    fn test_forward_exact() {
        let conn = Pager::paginate(items(1..=20), &request(20, PageDirection::Next));

        assert_eq!(conn.len(), 20);
        assert!(!conn.page_info.has_next_page);
        assert!(!conn.page_info.has_previous_page);
    }

    #[test]
    fn test_forward_short_batch_keeps_everything() {
        let conn = Pager::paginate(items(1..=3), &request(20, PageDirection::Next));
        assert_eq!(keys(&conn), vec![1, 2, 3]);
        assert!(!conn.page_info.has_next_page);
    }

    // Scenario C: backward, more data. Le lot arrive en ordre inverse.
    #[test]
    fn test_backward_with_sentinel_is_reversed() {
        let batch: Vec<Item> = items(1..=21).into_iter().rev().collect();
        let conn = Pager::paginate(batch, &request(20, PageDirection::Prev));

        assert_eq!(conn.len(), 20);
        // The sentinel (farthest row, key 1) is dropped and order is ascending.
        assert_eq!(keys(&conn), (2..=21).collect::<Vec<_>>());
        assert!(conn.page_info.has_previous_page);
        assert!(!conn.page_info.has_next_page);
        assert_eq!(conn.page_info.start_cursor.map(|c| c.millis()), Some(2));
        assert_eq!(conn.page_info.end_cursor.map(|c| c.millis()), Some(21));
    }

    #[test]
    fn test_backward_without_more() {
        let batch = vec![Item(3), Item(2), Item(1)];
        let conn = Pager::paginate(batch, &request(5, PageDirection::Prev));
        assert_eq!(keys(&conn), vec![1, 2, 3]);
        assert!(!conn.page_info.has_previous_page);
    }

    #[test]
    fn test_empty_batch() {
        for direction in [PageDirection::Next, PageDirection::Prev] {
            let conn = Pager::paginate(Vec::<Item>::new(), &request(20, direction));
            assert!(conn.is_empty());
            assert!(!conn.page_info.has_next_page);
            assert!(!conn.page_info.has_previous_page);
            assert_eq!(conn.page_info.start_cursor, None);
            assert_eq!(conn.page_info.end_cursor, None);
        }
    }

    #[test]
    fn test_edge_cursors_match_nodes() {
        let conn = Pager::paginate(items(5..=7), &request(10, PageDirection::Next));
        for edge in &conn.edges {
            assert_eq!(edge.cursor.millis(), edge.node.0);
        }
    }

    #[test]
    fn test_window_applies_keyset_bound() {
        let all = items(1..=10);

        let req = PageRequest::new(Cursor::from_millis(4), 3, PageDirection::Next);
        let window: Vec<i64> = Pager::window(&all, &req).iter().map(|i| i.0).collect();
        assert_eq!(window, vec![5, 6, 7, 8]);

        let req = PageRequest::new(Cursor::from_millis(4), 3, PageDirection::Prev);
        let window: Vec<i64> = Pager::window(&all, &req).iter().map(|i| i.0).collect();
        assert_eq!(window, vec![3, 2, 1]);
    }

    // Test critique: parcours complet aller puis retour sans doublon ni trou
    #[test]
    fn test_walk_forward_then_backward() {
        let all = items(1..=7);

        let mut seen = Vec::new();
        let mut req = request(3, PageDirection::Next);
        loop {
            let conn = Pager::paginate(Pager::window(&all, &req), &req);
            seen.extend(conn.nodes().map(|i| i.0));
            if !conn.page_info.has_next_page {
                break;
            }
            req = PageRequest::new(conn.page_info.end_cursor, 3, PageDirection::Next);
        }
        assert_eq!(seen, (1..=7).collect::<Vec<_>>());

        let req = PageRequest::new(Cursor::from_millis(5), 3, PageDirection::Prev);
        let conn = Pager::paginate(Pager::window(&all, &req), &req);
        assert_eq!(conn.nodes().map(|i| i.0).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert!(conn.page_info.has_previous_page);
    }
}
