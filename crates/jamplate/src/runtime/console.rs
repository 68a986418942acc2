use std::{cell::RefCell, io::Write, rc::Rc};

/// An append-only text sink.
pub trait Console {
    fn print(&mut self, text: &str);

    /// What has been printed so far, for consoles that keep it.
    fn read(&self) -> String {
        String::new()
    }

    fn close(&mut self) {}
}

/// Keeps everything printed in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    buffer: Rc<RefCell<String>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for BufferConsole {
    fn print(&mut self, text: &str) {
        self.buffer.borrow_mut().push_str(text);
    }

    fn read(&self) -> String {
        self.buffer.borrow().clone()
    }
}

/// Streams everything printed into a writer.
///
/// Write failures are logged once and further output is dropped.
#[derive(Debug)]
pub struct WriterConsole<W: Write> {
    writer: W,
    failed: bool,
}

impl<W: Write> WriterConsole<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }
}

impl<W: Write> Console for WriterConsole<W> {
    fn print(&mut self, text: &str) {
        if self.failed {
            return;
        }
        if let Err(error) = self.writer.write_all(text.as_bytes()) {
            tracing::warn!(%error, "console output failed");
            self.failed = true;
        }
    }

    fn close(&mut self) {
        if let Err(error) = self.writer.flush() {
            tracing::warn!(%error, "console flush failed");
            self.failed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_clones_share_output() {
        let buffer = BufferConsole::new();
        let mut handle = buffer.clone();
        handle.print("a");
        handle.print("b");
        handle.close();
        assert_eq!(buffer.read(), "ab");
    }

    #[test]
    fn test_writer_console() {
        let mut console = WriterConsole::new(Vec::new());
        console.print("hello");
        console.close();
        assert!(!console.has_failed());
        assert_eq!(console.writer, b"hello");
    }
}
