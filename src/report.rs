//! report.rs — line-oriented latency report written to an owned stream.
//!
//! One line per insertion call:
//!
//! ```text
//! add key latency: 0.012345678
//! ```
//!
//! The trailing space is part of the format.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::errors::Result;

/// Prefix of every latency line.
pub const LATENCY_PREFIX: &str = "add key latency: ";

/// Writable sink for latency lines. Flushed by [`Reporter::finish`], or on
/// drop if `finish` was never reached.
pub struct Reporter<W: Write> {
    out: Option<W>,
    lines: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Some(out),
            lines: 0,
        }
    }

    /// Write one `add key latency` line.
    pub fn latency(&mut self, elapsed: Duration) -> Result<()> {
        if let Some(out) = self.out.as_mut() {
            writeln!(out, "{}{} ", LATENCY_PREFIX, elapsed.as_secs_f64())?;
            self.lines += 1;
        }
        Ok(())
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let mut out = self
            .out
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "reporter already finished"))?;
        out.flush()?;
        Ok(out)
    }
}

impl Reporter<Box<dyn Write>> {
    /// Open `path` for writing (truncating), or stdout when `path` is `-`.
    pub fn open(path: &Path) -> Result<Self> {
        let out: Box<dyn Write> = if path == Path::new("-") {
            Box::new(BufWriter::new(io::stdout()))
        } else {
            Box::new(BufWriter::new(File::create(path)?))
        };
        Ok(Self::new(out))
    }
}

impl<W: Write> Drop for Reporter<W> {
    fn drop(&mut self) {
        if let Some(out) = self.out.as_mut() {
            let _ = out.flush();
        }
    }
}

/// Parse the seconds value back out of a latency line.
pub fn parse_latency(line: &str) -> Option<f64> {
    line.strip_prefix(LATENCY_PREFIX)?.trim_end().parse().ok()
}
