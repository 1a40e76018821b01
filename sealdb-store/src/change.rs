//! Change feed: an append-only log of records stored as ordinary documents.
//!
//! Each record lives at `<collection>/<index:015>`; its timestamp is the
//! document's `created_at`. Stamps come from the store clock under the store
//! lock, so within one collection they are unique and grow with the index.
//! That lets a timestamp serve as an exclusive cursor in both directions.

use crate::error::{StoreError, StoreResult};
use crate::iterator::DocumentIterator;
use crate::options::Direction;
use sealdb_types::{Document, HybridTimestamp, Path};

/// One change-feed record.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: Path,
    /// Position in the collection's log, from 1.
    pub index: u64,
    pub data: Vec<u8>,
    pub timestamp: HybridTimestamp,
}

impl Change {
    /// Reads a change record back from its document.
    pub fn from_document(doc: Document) -> StoreResult<Self> {
        let index = doc
            .path
            .last()
            .and_then(|key| key.parse::<u64>().ok())
            .ok_or_else(|| {
                StoreError::corrupted(doc.path.as_str(), "change key is not an index")
            })?;
        Ok(Self {
            index,
            data: doc.data,
            timestamp: doc.created_at,
            path: doc.path,
        })
    }

    /// Payload as text, replacing invalid UTF-8.
    pub fn data_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Cursor-filtered view over a collection's change records.
///
/// Ascending yields records with a timestamp after `since`, oldest first.
/// Descending yields records before `since` (or from the newest when `since`
/// is zero), newest first.
pub struct ChangeIterator<'a> {
    docs: Box<dyn DocumentIterator + 'a>,
    since: HybridTimestamp,
    direction: Direction,
    limit: Option<usize>,
    returned: usize,
    done: bool,
}

impl<'a> ChangeIterator<'a> {
    /// Wraps a document iterator already ordered for `direction`.
    ///
    /// A `limit` of zero means no cap.
    pub fn new(
        docs: Box<dyn DocumentIterator + 'a>,
        since: HybridTimestamp,
        limit: usize,
        direction: Direction,
    ) -> Self {
        Self {
            docs,
            since,
            direction,
            limit: (limit > 0).then_some(limit),
            returned: 0,
            done: false,
        }
    }

    /// Next record, or `None` at the end.
    pub fn next(&mut self) -> StoreResult<Option<Change>> {
        if self.done {
            return Ok(None);
        }
        if self.limit.is_some_and(|limit| self.returned >= limit) {
            self.release();
            return Ok(None);
        }
        loop {
            let Some(doc) = self.docs.next()? else {
                self.release();
                return Ok(None);
            };
            let change = Change::from_document(doc)?;
            let wanted = match self.direction {
                Direction::Ascending => change.timestamp > self.since,
                Direction::Descending => self.since.is_zero() || change.timestamp < self.since,
            };
            if wanted {
                self.returned += 1;
                return Ok(Some(change));
            }
        }
    }

    /// Releases the underlying document iterator.
    pub fn release(&mut self) {
        if !self.done {
            self.docs.release();
            self.done = true;
        }
    }
}

impl Drop for ChangeIterator<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Drains `iter`, returning the records and the cursor to resume from.
///
/// The cursor is the timestamp of the last record returned, or `since`
/// unchanged when there were none.
pub fn changes_from_iterator(
    iter: &mut ChangeIterator<'_>,
    since: HybridTimestamp,
) -> StoreResult<(Vec<Change>, HybridTimestamp)> {
    let mut changes = Vec::new();
    while let Some(change) = iter.next()? {
        changes.push(change);
    }
    iter.release();
    let cursor = changes.last().map_or(since, |c| c.timestamp);
    Ok((changes, cursor))
}
