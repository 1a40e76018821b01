//! Plain-text dump of an iterator: one `<path> <payload>\n` line per document.

use crate::error::StoreResult;
use crate::iterator::DocumentIterator;
use std::io::Write;

/// Writes the dump of `iter` to `out` and releases the iterator.
pub fn spew_out(iter: &mut dyn DocumentIterator, out: &mut dyn Write) -> StoreResult<()> {
    let result = (|| -> StoreResult<()> {
        while let Some(doc) = iter.next()? {
            writeln!(out, "{} {}", doc.path, doc.data_lossy())?;
        }
        Ok(())
    })();
    iter.release();
    result
}

/// Returns the dump of `iter` as a string.
pub fn spew(iter: &mut dyn DocumentIterator) -> StoreResult<String> {
    let mut buf = Vec::new();
    spew_out(iter, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
