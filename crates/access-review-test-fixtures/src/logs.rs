//! In-memory log capture
//!
//! [`CapturedLogs::install`] sets a thread-local subscriber, so it sees events
//! from tasks polled on the test's own thread. Use it with the default
//! current-thread `#[tokio::test]` runtime.

use std::{
    io,
    sync::{Arc, Mutex},
};

use tracing::{Level, subscriber::DefaultGuard};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route this thread's events into the buffer until the guard drops
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Number of captured lines containing `needle`
    pub fn count(&self, needle: &str) -> usize {
        self.contents().lines().filter(|line| line.contains(needle)).count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_events() {
        let logs = CapturedLogs::new();
        {
            let _guard = logs.install();
            tracing::warn!(key = "k", "Something happened");
            tracing::trace!("Below the captured level");
        }
        tracing::warn!("After the guard dropped");

        assert_eq!(logs.count("Something happened"), 1);
        assert_eq!(logs.count("Below the captured level"), 0);
        assert_eq!(logs.count("After the guard dropped"), 0);
    }
}
