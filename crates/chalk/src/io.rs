use std::io::{self, Write as _};

use crate::error::{RunError, RunResult};

/// Trait for handling output from the `print()` builtin.
///
/// Implement this to capture or redirect print output from scripted code.
/// The interface is byte-oriented because Chalk strings are 8-bit byte
/// sequences, not text. The default implementation [`StdPrint`] writes to
/// the process's stdout.
pub trait PrintWriter {
    /// Writes one rendered chunk. The printer renders a whole `print()` call
    /// into a single chunk, so output is atomic per call.
    fn write_all(&mut self, output: &[u8]) -> RunResult<()>;

    /// Writes a single byte, used for separators and terminators.
    fn write_byte(&mut self, byte: u8) -> RunResult<()> {
        self.write_all(&[byte])
    }
}

/// Default `PrintWriter` that writes to stdout.
///
/// Output is line-buffered: bytes accumulate until a newline is written,
/// and anything still buffered is flushed when the writer is dropped.
#[derive(Debug, Default)]
pub struct StdPrint {
    buffer: Vec<u8>,
}

impl StdPrint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flushes any buffered output to stdout.
    pub fn flush(&mut self) -> RunResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = io::stdout()
            .write_all(&self.buffer)
            .and_then(|()| io::stdout().flush());
        self.buffer.clear();
        result.map_err(io_error)
    }
}

impl PrintWriter for StdPrint {
    fn write_all(&mut self, output: &[u8]) -> RunResult<()> {
        self.buffer.extend_from_slice(output);
        if self.buffer.contains(&b'\n') {
            self.flush()?;
        }
        Ok(())
    }
}

impl Drop for StdPrint {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Maps an I/O failure to a `host-error` carrying the OS status code.
fn io_error(err: io::Error) -> RunError {
    RunError::host(err.raw_os_error().unwrap_or(-1), format!("stdout write failed: {err}"))
}

/// A `PrintWriter` that collects all output into a byte buffer.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectPrint(Vec<u8>);

impl CollectPrint {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected output so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> Vec<u8> {
        self.0
    }
}

impl PrintWriter for CollectPrint {
    fn write_all(&mut self, output: &[u8]) -> RunResult<()> {
        self.0.extend_from_slice(output);
        Ok(())
    }
}

/// A `PrintWriter` that ignores all output.
///
/// Useful for suppressing print output during testing or benchmarking.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write_all(&mut self, _output: &[u8]) -> RunResult<()> {
        Ok(())
    }
}
