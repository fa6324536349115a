use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A log sink shared by every clone of a logger.
///
/// One mutex guards the underlying writer. Callers hand over a fully encoded
/// record, which is written with a single `write_all` under the lock, so
/// records from concurrent callers never interleave.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write one complete record.
    pub fn write_record(&self, record: &[u8]) -> io::Result<()> {
        self.lock().write_all(record)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    // A panic while holding the lock leaves the writer usable, so the
    // poison flag is ignored.
    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
