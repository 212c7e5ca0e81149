use crate::context::ScopeContext;
use crate::line_source::LineSource;
use crate::sample_parser::parse_line;
use log::{debug, info, trace, warn};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Back-off after a transport fault before the next read.
const FAULT_BACKOFF: Duration = Duration::from_millis(100);
/// Poll interval once the source has reported end of stream.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Reads lines from the transport, validates them and appends accepted
/// samples to the shared buffers.
///
/// Nothing a single line or read can do stops this loop. It exits only when
/// the context is shut down, which it checks between reads.
pub struct IngestionWorker<S: LineSource> {
    source: S,
    ctx: Arc<ScopeContext>,
}

impl<S: LineSource> IngestionWorker<S> {
    pub fn new(source: S, ctx: Arc<ScopeContext>) -> Self {
        Self { source, ctx }
    }

    /// Run the ingestion loop. Blocks the calling thread until shutdown and
    /// returns the number of samples appended.
    pub fn run(mut self) -> u64 {
        info!("Ingestion running");
        let mut sample_count: u64 = 0;
        let mut fault_count: u64 = 0;
        let mut at_eof = false;

        while self.ctx.is_running() {
            match self.source.read_line() {
                Ok(Some(line)) => {
                    at_eof = false;
                    match parse_line(&line) {
                        Some(sample) => {
                            self.ctx.buffers.append(sample);
                            sample_count += 1;
                            if sample_count.is_multiple_of(5000) {
                                debug!(
                                    "Ingestion: {} samples, {} transport faults",
                                    sample_count, fault_count
                                );
                            }
                        }
                        None => trace!("Dropped line {:?}", line.trim_end()),
                    }
                }
                Ok(None) => {
                    if !at_eof {
                        info!("Transport reached end of stream after {} samples", sample_count);
                        at_eof = true;
                    }
                    thread::sleep(IDLE_POLL);
                }
                // Read timeouts just mean the device is quiet.
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(e) => {
                    fault_count += 1;
                    warn!("Transport read error: {}", e);
                    thread::sleep(FAULT_BACKOFF);
                }
            }
        }

        info!("Ingestion shutting down after {} samples", sample_count);
        sample_count
    }

    /// Run the loop on a named background thread.
    pub fn spawn(self) -> io::Result<thread::JoinHandle<u64>>
    where
        S: 'static,
    {
        thread::Builder::new()
            .name("ingestion".into())
            .spawn(move || self.run())
    }
}
