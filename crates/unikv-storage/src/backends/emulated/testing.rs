//! An in-memory `RowStore` for exercising the emulation layer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::{
    Durability, EngineError, EngineResult, ErrorContext, KeyRange, KeyValue, Operation, Order,
};

use super::{RowCursor, RowStore};

/// A sorted map whose snapshots are copies of the map.
pub(crate) struct MemoryRows {
    descending: bool,
    fail_after: Option<usize>,
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    queries: AtomicUsize,
}

impl MemoryRows {
    pub(crate) fn new(descending: bool) -> Self {
        Self {
            descending,
            fail_after: None,
            entries: Mutex::new(BTreeMap::new()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Make every query fail after producing `rows` rows.
    pub(crate) const fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }

    pub(crate) fn with_keys(self, keys: &[&[u8]]) -> Self {
        {
            let mut entries = self.entries.lock().expect("lock poisoned");
            for key in keys {
                entries.insert(key.to_vec(), key.to_vec());
            }
        }
        self
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

pub(crate) struct MemoryCursor {
    rows: std::vec::IntoIter<KeyValue>,
    remaining: Option<usize>,
}

impl RowCursor for MemoryCursor {
    fn next_row(&mut self) -> EngineResult<Option<KeyValue>> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(EngineError::backend(ErrorContext::new("next_row"), "injected failure"));
            }
            *remaining -= 1;
        }
        Ok(self.rows.next())
    }
}

impl RowStore for MemoryRows {
    type Snapshot<'a> = Arc<BTreeMap<Vec<u8>, Vec<u8>>>;
    type Rows<'a> = MemoryCursor;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn select(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().expect("lock poisoned").get(key).cloned())
    }

    fn upsert(&self, key: &[u8], value: &[u8], _durability: Durability) -> EngineResult<()> {
        self.entries.lock().expect("lock poisoned").insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &[u8], _durability: Durability) -> EngineResult<()> {
        self.entries.lock().expect("lock poisoned").remove(key);
        Ok(())
    }

    fn snapshot(&self) -> EngineResult<Self::Snapshot<'_>> {
        Ok(Arc::new(self.entries.lock().expect("lock poisoned").clone()))
    }

    fn query<'a>(
        &'a self,
        snapshot: &Self::Snapshot<'a>,
        range: &KeyRange,
        order: Order,
    ) -> EngineResult<Self::Rows<'a>> {
        assert!(
            self.descending || order == Order::Ascending,
            "descending query issued against a store without descending support"
        );
        self.queries.fetch_add(1, Ordering::SeqCst);

        let mut rows: Vec<KeyValue> = snapshot
            .iter()
            .filter(|(key, _)| range.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if order == Order::Descending {
            rows.reverse();
        }

        Ok(MemoryCursor { rows: rows.into_iter(), remaining: self.fail_after })
    }

    fn supports_descending(&self) -> bool {
        self.descending
    }

    fn apply(&self, operations: &[Operation], _durability: Durability) -> EngineResult<()> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        for operation in operations {
            match operation {
                Operation::Set { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                Operation::Delete { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}
