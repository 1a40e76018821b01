//! Paged document iterator.
//!
//! Each page is one bounded query taken under the engine lock; the lock is
//! never held between calls to `next`.

use crate::codec::RawRow;
use crate::engine::Engine;
use sealdb_store::{DocumentIterator, IterOptions, StoreResult};
use sealdb_types::{Document, Path};
use std::collections::VecDeque;

/// Where the next page starts.
#[derive(Debug, Clone)]
pub(crate) enum Position {
    /// Keys `>= key` (or `> key` when exclusive), ascending.
    From { key: String, exclusive: bool },
    /// Keys `< key`, descending.
    Before(String),
}

pub(crate) struct EngineIterator<'a> {
    engine: &'a Engine,
    position: Position,
    reverse: bool,
    prefix: String,
    no_data: bool,
    remaining: Option<usize>,
    page: VecDeque<RawRow>,
    exhausted: bool,
    done: bool,
}

impl<'a> EngineIterator<'a> {
    pub(crate) fn new(engine: &'a Engine, collection: &Path, opts: IterOptions) -> Self {
        let base = collection.key_prefix();
        let position = if opts.reverse {
            Position::Before(format!("{}0", &base[..base.len() - 1]))
        } else {
            let (key, exclusive) = opts.scan_start(&base);
            Position::From { key, exclusive }
        };
        Self {
            engine,
            position,
            reverse: opts.reverse,
            prefix: opts.scan_prefix(&base),
            no_data: opts.no_data,
            remaining: opts.limit,
            page: VecDeque::new(),
            exhausted: false,
            done: false,
        }
    }

    fn fetch(&mut self) -> StoreResult<()> {
        let page_size = self.engine.page_size();
        let limit = self.remaining.map_or(page_size, |r| r.min(page_size));
        let rows = self.engine.fetch_page(&self.position, self.no_data, limit)?;
        if rows.len() < limit {
            self.exhausted = true;
        }
        if let Some(last) = rows.last() {
            self.position = if self.reverse {
                Position::Before(last.path.clone())
            } else {
                Position::From {
                    key: last.path.clone(),
                    exclusive: true,
                }
            };
        }
        self.page.extend(rows);
        Ok(())
    }
}

impl DocumentIterator for EngineIterator<'_> {
    fn next(&mut self) -> StoreResult<Option<Document>> {
        if self.done {
            return Ok(None);
        }
        if self.remaining == Some(0) {
            self.release();
            return Ok(None);
        }
        if self.page.is_empty() && !self.exhausted {
            self.fetch()?;
        }
        let Some(row) = self.page.pop_front() else {
            self.release();
            return Ok(None);
        };
        if !row.path.starts_with(&self.prefix) {
            self.release();
            return Ok(None);
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        row.open(self.engine.key()).map(Some)
    }

    fn release(&mut self) {
        self.page.clear();
        self.exhausted = true;
        self.done = true;
    }
}

impl Drop for EngineIterator<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
