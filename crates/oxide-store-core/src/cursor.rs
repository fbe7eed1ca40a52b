//! Typed, forward-only cursors.

use std::fmt;

use tracing::warn;

use crate::error::{Error, Result};
use crate::row::Rows;
use crate::scanner::SharedScanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    OnRow,
    Exhausted,
    Closed,
}

/// A single-pass sequence of scanned values over a live result set.
///
/// ```rust,ignore
/// let mut cursor = store.query::<String>("list", names::STRING, &[])?;
/// while cursor.has_next()? {
///     let value = cursor.entry()?;
/// }
/// cursor.close()?;
/// ```
///
/// The result set is released on `close`, on exhaustion through the
/// iterator, or when the cursor is dropped.
pub struct Cursor<T> {
    rows: Box<dyn Rows>,
    scanner: SharedScanner<T>,
    state: State,
}

impl<T> Cursor<T> {
    /// Binds `scanner` to `rows`.
    #[must_use]
    pub fn new(rows: Box<dyn Rows>, scanner: SharedScanner<T>) -> Self {
        Self {
            rows,
            scanner,
            state: State::Fresh,
        }
    }

    /// Moves to the next row.
    ///
    /// Once this returns `false` every later call returns `false` without
    /// touching the result set.
    ///
    /// # Errors
    ///
    /// Returns the driver error if fetching the row fails.
    pub fn has_next(&mut self) -> Result<bool> {
        match self.state {
            State::Exhausted | State::Closed => Ok(false),
            State::Fresh | State::OnRow => {
                if self.rows.advance()? {
                    self.state = State::OnRow;
                    Ok(true)
                } else {
                    self.state = State::Exhausted;
                    Ok(false)
                }
            }
        }
    }

    /// Scans the current row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] when `has_next` has not returned
    /// `true` for a row, or the scanner's error.
    pub fn entry(&self) -> Result<T> {
        if self.state != State::OnRow {
            return Err(Error::EntryNotFound);
        }
        let row = self.rows.current().ok_or(Error::EntryNotFound)?;
        self.scanner.scan(row)
    }

    /// Scans the first row and closes the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] for an empty result set, or the
    /// driver or scanner error.
    pub fn first(mut self) -> Result<T> {
        if !self.has_next()? {
            self.release()?;
            return Err(Error::EntryNotFound);
        }
        let entry = self.entry();
        self.release()?;
        entry
    }

    /// Returns `true` once the result set has been fully read or closed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Exhausted | State::Closed)
    }

    /// Releases the result set.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the result set cannot be released.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        self.state = State::Closed;
        self.rows.close()
    }
}

impl<T> Iterator for Cursor<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.entry()),
            Ok(false) => {
                if let Err(err) = self.release() {
                    return Some(Err(err));
                }
                None
            }
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T> Drop for Cursor<T> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!(error = %err, "failed to close cursor");
        }
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("state", &self.state).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::row::{Row, VecRows};
    use crate::scanner::ScannerRegistry;
    use crate::scanner::names;
    use crate::value::SqlValue;

    struct CountingRows {
        inner: VecRows,
        advances: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    impl Rows for CountingRows {
        fn advance(&mut self) -> Result<bool> {
            self.advances.fetch_add(1, Ordering::SeqCst);
            self.inner.advance()
        }

        fn current(&self) -> Option<&Row> {
            self.inner.current()
        }

        fn close(&mut self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.inner.close()
        }
    }

    fn cursor(values: &[i64]) -> (Cursor<i64>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let advances = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        let rows = CountingRows {
            inner: VecRows::from_values(
                &["value"],
                values.iter().map(|v| vec![SqlValue::Int(*v)]).collect(),
            ),
            advances: Arc::clone(&advances),
            closes: Arc::clone(&closes),
        };
        let scanner = ScannerRegistry::with_defaults()
            .get::<i64>(names::INT)
            .unwrap();
        (Cursor::new(Box::new(rows), scanner), advances, closes)
    }

    #[test]
    fn test_exhaustion_latches() {
        let (mut c, advances, _) = cursor(&[1]);
        assert!(c.has_next().unwrap());
        assert_eq!(c.entry().unwrap(), 1);
        assert!(!c.has_next().unwrap());
        assert!(!c.has_next().unwrap());
        assert!(!c.has_next().unwrap());
        assert_eq!(advances.load(Ordering::SeqCst), 2);
        assert!(c.is_done());
    }

    #[test]
    fn test_entry_without_row() {
        let (mut c, _, _) = cursor(&[]);
        assert!(matches!(c.entry(), Err(Error::EntryNotFound)));
        assert!(!c.has_next().unwrap());
        assert!(matches!(c.entry(), Err(Error::EntryNotFound)));
    }

    #[test]
    fn test_iterator_collects_and_closes() {
        let (c, _, closes) = cursor(&[1, 2, 3]);
        let values: Result<Vec<i64>> = c.collect();
        assert_eq!(values.unwrap(), vec![1, 2, 3]);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first() {
        let (c, _, closes) = cursor(&[4, 5]);
        assert_eq!(c.first().unwrap(), 4);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let (c, _, _) = cursor(&[]);
        assert!(matches!(c.first(), Err(Error::EntryNotFound)));
    }

    #[test]
    fn test_drop_closes_once() {
        let (mut c, _, closes) = cursor(&[1, 2]);
        assert!(c.has_next().unwrap());
        drop(c);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let (c, _, closes) = cursor(&[1]);
        c.close().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
