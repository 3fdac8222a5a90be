//! Redb table definitions.

use redb::{ReadOnlyTable, TableDefinition};

/// The physical table holding every entry of the store.
pub const DATA_TABLE: TableDefinition<'static, &[u8], &[u8]> = TableDefinition::new("unikv_data");

/// A read-only handle on [`DATA_TABLE`], pinned to the snapshot it was opened in.
pub type DataTable = ReadOnlyTable<&'static [u8], &'static [u8]>;
