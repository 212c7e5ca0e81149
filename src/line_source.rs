//! The transport boundary: anything that yields text lines, one at a time.

use crate::sample_parser::decode_line;
use std::io::{self, BufRead};

/// A blocking, line-oriented byte stream.
pub trait LineSource: Send {
    /// Block until the next complete line is available.
    ///
    /// Returns `Ok(None)` at end of stream. Errors are transient from the
    /// caller's point of view; reading may be retried after one.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }
}

/// Adapts any `BufRead` (serial port, replay file, in-memory cursor) into a
/// `LineSource`.
///
/// Bytes of a line that straddles a read timeout are kept, so a slow device
/// never produces a split line. Any other read error discards them.
pub struct ReaderLines<R> {
    reader: R,
    pending: Vec<u8>,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::with_capacity(64),
        }
    }

    fn take_pending(&mut self) -> String {
        let line = decode_line(&self.pending);
        self.pending.clear();
        line
    }
}

impl<R: BufRead + Send> LineSource for ReaderLines<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            // On error, read_until leaves whatever it consumed in `pending`;
            // only a timeout keeps it.
            match self.reader.read_until(b'\n', &mut self.pending) {
                Ok(0) if self.pending.is_empty() => return Ok(None),
                // EOF in the middle of a line still yields that line.
                Ok(0) => return Ok(Some(self.take_pending())),
                Ok(_) if self.pending.last() == Some(&b'\n') => {
                    return Ok(Some(self.take_pending()));
                }
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Err(e),
                // Anything after a hard fault starts a fresh line.
                Err(e) => {
                    self.pending.clear();
                    return Err(e);
                }
            }
        }
    }
}
