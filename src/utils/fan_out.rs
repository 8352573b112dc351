use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// A cloneable handle to one output stream. Clones write to the same stream.
#[derive(Clone)]
pub struct SharedSink {
    name: Arc<str>,
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedSink {
    pub fn new(name: &str, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: Arc::from(name),
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new("stderr", io::stderr())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn same_stream(&self, other: &SharedSink) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl fmt::Debug for SharedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedSink").field(&self.name).finish()
    }
}

/// In-memory sink, used for capturing terminal output.
#[derive(Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes every buffer to all of its sinks, in order.
#[derive(Clone, Debug, Default)]
pub struct FanOutWriter {
    sinks: Vec<SharedSink>,
}

impl FanOutWriter {
    pub fn new(sinks: Vec<SharedSink>) -> Self {
        let mut writer = Self::default();
        for sink in sinks {
            writer.push(sink);
        }
        writer
    }

    /// Add a sink unless it already writes to the same stream.
    pub fn push(&mut self, sink: SharedSink) {
        if !self.contains(&sink) {
            self.sinks.push(sink);
        }
    }

    /// A new writer with everything `self` writes to, plus `sink`.
    pub fn including(&self, sink: SharedSink) -> Self {
        let mut writer = self.clone();
        writer.push(sink);
        writer
    }

    pub fn contains(&self, sink: &SharedSink) -> bool {
        self.sinks.iter().any(|existing| existing.same_stream(sink))
    }

    pub fn sinks(&self) -> &[SharedSink] {
        &self.sinks
    }
}

impl Write for FanOutWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in &mut self.sinks {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
