//! Backend selection.
//!
//! Every store runs over exactly one of two adapter shapes: a native ordered
//! engine (Redb) or a cursor-emulated relational engine (SQLite). [`Backend`]
//! is the closed set of both, so a host can pick one at runtime and still
//! get a single concrete [`Store`](crate::Store) type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unikv_storage::backends::{
    EmulatedWriteGroup, RedbCursor, RedbEngine, RedbWriteGroup, SqliteStore,
};
use unikv_storage::{
    Capabilities, CursorEmulated, Direction, Durability, EmulatedCursor, EngineCursor, EngineError,
    EngineResult, EngineStats, KeyRange, KvEngine, WriteGroup,
};

use crate::error::Error;

/// The backends a store can be opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Redb, through the native ordered adapter.
    Redb,
    /// SQLite, through the cursor-emulated adapter.
    Sqlite,
}

impl BackendKind {
    /// Every available backend.
    pub const ALL: [Self; 2] = [Self::Redb, Self::Sqlite];

    /// The backend's registered name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Sqlite => "sqlite",
        }
    }

    /// The file extension of the backend's database file.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(Error::UnknownBackend(s.to_string())),
        }
    }
}

/// An opened engine of either adapter shape.
pub enum Backend {
    /// A Redb database.
    NativeOrdered(RedbEngine),
    /// A SQLite database behind cursor emulation.
    CursorEmulated(CursorEmulated<SqliteStore>),
}

impl Backend {
    /// Which backend this is.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::NativeOrdered(_) => BackendKind::Redb,
            Self::CursorEmulated(_) => BackendKind::Sqlite,
        }
    }
}

/// Forward a call to whichever engine, cursor or write group is inside.
macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Self::NativeOrdered($inner) => $body,
            Self::CursorEmulated($inner) => $body,
        }
    };
}

impl KvEngine for Backend {
    type Cursor<'a> = BackendCursor<'a>;
    type WriteGroup<'a> = BackendWriteGroup<'a>;

    fn name(&self) -> &'static str {
        dispatch!(self, engine => engine.name())
    }

    fn capabilities(&self) -> Capabilities {
        dispatch!(self, engine => engine.capabilities())
    }

    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        dispatch!(self, engine => engine.get(key))
    }

    fn put(&self, key: &[u8], value: &[u8], durability: Durability) -> EngineResult<()> {
        dispatch!(self, engine => engine.put(key, value, durability))
    }

    fn delete(&self, key: &[u8], durability: Durability) -> EngineResult<()> {
        dispatch!(self, engine => engine.delete(key, durability))
    }

    fn cursor(&self, range: &KeyRange, direction: Direction) -> EngineResult<Self::Cursor<'_>> {
        Ok(match self {
            Self::NativeOrdered(engine) => BackendCursor::NativeOrdered(engine.cursor(range, direction)?),
            Self::CursorEmulated(engine) => {
                BackendCursor::CursorEmulated(engine.cursor(range, direction)?)
            }
        })
    }

    fn begin_write_group(&self) -> EngineResult<Self::WriteGroup<'_>> {
        Ok(match self {
            Self::NativeOrdered(engine) => BackendWriteGroup::NativeOrdered(engine.begin_write_group()?),
            Self::CursorEmulated(engine) => {
                BackendWriteGroup::CursorEmulated(engine.begin_write_group()?)
            }
        })
    }

    fn stats(&self) -> EngineResult<EngineStats> {
        dispatch!(self, engine => engine.stats())
    }

    fn compact(&self, range: &KeyRange) -> EngineResult<()> {
        dispatch!(self, engine => engine.compact(range))
    }

    fn flush(&self) -> EngineResult<()> {
        dispatch!(self, engine => engine.flush())
    }
}

/// A cursor over either backend.
pub enum BackendCursor<'a> {
    /// A native Redb cursor.
    NativeOrdered(RedbCursor),
    /// An emulated cursor over SQLite.
    CursorEmulated(EmulatedCursor<'a, SqliteStore>),
}

impl EngineCursor for BackendCursor<'_> {
    fn seek_first(&mut self) {
        dispatch!(self, cursor => cursor.seek_first());
    }

    fn seek_last(&mut self) {
        dispatch!(self, cursor => cursor.seek_last());
    }

    fn seek_to(&mut self, key: &[u8]) {
        dispatch!(self, cursor => cursor.seek_to(key));
    }

    fn step_forward(&mut self) {
        dispatch!(self, cursor => cursor.step_forward());
    }

    fn step_backward(&mut self) {
        dispatch!(self, cursor => cursor.step_backward());
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        dispatch!(self, cursor => cursor.current())
    }

    fn error(&self) -> Option<&EngineError> {
        dispatch!(self, cursor => cursor.error())
    }
}

/// A write group on either backend.
pub enum BackendWriteGroup<'a> {
    /// A Redb write transaction.
    NativeOrdered(RedbWriteGroup),
    /// Buffered operations for one SQLite transaction.
    CursorEmulated(EmulatedWriteGroup<'a, SqliteStore>),
}

impl WriteGroup for BackendWriteGroup<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        dispatch!(self, group => group.set(key, value))
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<()> {
        dispatch!(self, group => group.delete(key))
    }

    fn commit(self, durability: Durability) -> EngineResult<()> {
        dispatch!(self, group => group.commit(durability))
    }

    fn abort(self) -> EngineResult<()> {
        dispatch!(self, group => group.abort())
    }
}
