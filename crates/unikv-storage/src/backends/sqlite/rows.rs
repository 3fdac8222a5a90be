//! Paged row streaming.
//!
//! A [`SqliteRows`] never holds a live statement between calls. It keeps
//! one page of rows and the key the next page resumes after; when the page
//! runs dry it issues the next bounded query. Every page is read through the
//! same [`SqliteSnapshot`], so writes committed between pages are invisible
//! and the pages join into one consistent view of the range.

use std::collections::VecDeque;
use std::sync::Arc;

use rusqlite::params_from_iter;

use crate::backends::emulated::RowCursor;
use crate::engine::{EngineResult, ErrorContext, KeyRange, KeyValue, Order};

use super::{SqliteSnapshot, SqliteStore};

/// A forward-only, paged stream over one range of the `kv` table.
pub struct SqliteRows<'a> {
    store: &'a SqliteStore,
    snapshot: Arc<SqliteSnapshot>,
    range: KeyRange,
    order: Order,
    page: VecDeque<KeyValue>,
    resume_after: Option<Vec<u8>>,
    exhausted: bool,
}

impl<'a> SqliteRows<'a> {
    pub(super) fn new(
        store: &'a SqliteStore,
        snapshot: Arc<SqliteSnapshot>,
        range: KeyRange,
        order: Order,
    ) -> Self {
        let exhausted = range.is_empty();
        Self { store, snapshot, range, order, page: VecDeque::new(), resume_after: None, exhausted }
    }

    /// Build the statement for the next page and the keys bound to it.
    fn page_query(&self, page_size: usize) -> (String, Vec<&[u8]>) {
        let mut clauses = Vec::with_capacity(3);
        let mut bound: Vec<&[u8]> = Vec::with_capacity(3);

        if let Some(start) = self.range.start() {
            clauses.push("key >= ?");
            bound.push(start);
        }
        if let Some(end) = self.range.end() {
            clauses.push("key < ?");
            bound.push(end);
        }
        if let Some(resume) = self.resume_after.as_deref() {
            clauses.push(match self.order {
                Order::Ascending => "key > ?",
                Order::Descending => "key < ?",
            });
            bound.push(resume);
        }

        let mut sql = String::from("SELECT key, value FROM kv");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        let order = match self.order {
            Order::Ascending => "ASC",
            Order::Descending => "DESC",
        };
        sql.push_str(&format!(" ORDER BY key {order} LIMIT {page_size}"));

        (sql, bound)
    }

    fn fetch_page(&mut self) -> EngineResult<()> {
        let page_size = self.store.config().page_size.max(1);
        let (sql, bound) = self.page_query(page_size);

        let rows = self.snapshot.run(ErrorContext::new("query"), |conn| {
            let mut statement = conn.prepare_cached(&sql)?;
            let mut rows = statement.query(params_from_iter(bound))?;
            let mut page: Vec<KeyValue> = Vec::with_capacity(page_size);
            while let Some(row) = rows.next()? {
                page.push((row.get(0)?, row.get(1)?));
            }
            Ok(page)
        })?;

        self.exhausted = rows.len() < page_size;
        self.resume_after = rows.last().map(|(key, _)| key.clone());
        self.page.extend(rows);
        Ok(())
    }
}

impl RowCursor for SqliteRows<'_> {
    fn next_row(&mut self) -> EngineResult<Option<KeyValue>> {
        if self.page.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Err(e);
            }
        }
        Ok(self.page.pop_front())
    }
}
