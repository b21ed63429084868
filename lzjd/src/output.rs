//! Shared line output for parallel workers.
//!
//! Each worker appends whole lines to its own buffer and hands the buffer to the
//! shared writer whenever the writer lock is free. A worker only waits for the lock
//! once its buffer exceeds the flush threshold. Lines of one buffer keep their order,
//! and lines are never interleaved with each other.
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

type Buffer = Arc<Mutex<Vec<u8>>>;

/// Writer shared among workers, with a registry of every worker buffer.
pub struct OutputSink<W> {
    writer: Mutex<W>,
    buffers: Mutex<Vec<Buffer>>,
    flush_threshold: usize,
}

impl<W> OutputSink<W>
where
    W: Write,
{
    /// Creates an instance writing into `writer`.
    pub fn new(writer: W, flush_threshold: usize) -> Self {
        Self {
            writer: Mutex::new(writer),
            buffers: Mutex::new(vec![]),
            flush_threshold,
        }
    }

    /// Registers a new worker buffer.
    pub fn register(&self) -> LineBuffer<'_, W> {
        let buf = Buffer::default();
        self.buffers.lock().push(buf.clone());
        LineBuffer { sink: self, buf }
    }

    /// Writes out whatever every registered buffer still holds, then flushes the writer.
    pub fn finish(&self) -> io::Result<()> {
        let buffers = self.buffers.lock();
        for buf in buffers.iter() {
            let mut buf = buf.lock();
            if !buf.is_empty() {
                write_out(&mut *self.writer.lock(), &mut buf)?;
            }
        }
        self.writer.lock().flush()
    }

    /// Gets the number of registered buffers.
    pub fn num_buffers(&self) -> usize {
        self.buffers.lock().len()
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// Per-worker handle for emitting lines into an [`OutputSink`].
pub struct LineBuffer<'a, W> {
    sink: &'a OutputSink<W>,
    buf: Buffer,
}

impl<'a, W> LineBuffer<'a, W>
where
    W: Write,
{
    /// Appends `line` and a newline, then writes the buffer out if possible.
    pub fn push_line(&mut self, line: &str) -> io::Result<()> {
        let mut buf = self.buf.lock();
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        if let Some(mut writer) = self.sink.writer.try_lock() {
            return write_out(&mut *writer, &mut buf);
        }
        if buf.len() > self.sink.flush_threshold {
            return write_out(&mut *self.sink.writer.lock(), &mut buf);
        }
        Ok(())
    }

    /// Gets the number of bytes waiting in this buffer.
    pub fn pending(&self) -> usize {
        self.buf.lock().len()
    }
}

fn write_out<W>(writer: &mut W, buf: &mut Vec<u8>) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(buf)?;
    buf.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use rayon::prelude::*;

    fn lines_of(bytes: Vec<u8>) -> Vec<String> {
        let mut lines: Vec<_> = String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect();
        lines.sort();
        lines
    }

    #[test]
    fn test_uncontended() {
        let sink = OutputSink::new(vec![], 1 << 20);
        let mut out = sink.register();
        out.push_line("first").unwrap();
        out.push_line("second").unwrap();
        assert_eq!(out.pending(), 0);
        sink.finish().unwrap();
        drop(out);
        assert_eq!(sink.into_inner(), b"first\nsecond\n");
    }

    #[test]
    fn test_buffers_while_locked() {
        let sink = OutputSink::new(vec![], 1 << 20);
        let mut out = sink.register();
        {
            let _guard = sink.writer.lock();
            out.push_line("kept").unwrap();
            out.push_line("back").unwrap();
            assert_eq!(out.pending(), 10);
        }
        out.push_line("now").unwrap();
        assert_eq!(out.pending(), 0);
        sink.finish().unwrap();
        drop(out);
        assert_eq!(sink.into_inner(), b"kept\nback\nnow\n");
    }

    #[test]
    fn test_finish_drains_buffers() {
        let sink = OutputSink::new(vec![], 1 << 20);
        let mut a = sink.register();
        let mut b = sink.register();
        {
            let _guard = sink.writer.lock();
            a.push_line("a").unwrap();
            b.push_line("b").unwrap();
        }
        assert_eq!(sink.num_buffers(), 2);
        sink.finish().unwrap();
        assert_eq!(a.pending() + b.pending(), 0);
        drop((a, b));
        assert_eq!(lines_of(sink.into_inner()), vec!["a", "b"]);
    }

    #[test]
    fn test_blocks_over_threshold() {
        let sink = OutputSink::new(vec![], 8);
        let mut out = sink.register();
        let locked = Barrier::new(2);
        thread::scope(|s| {
            s.spawn(|| {
                let _guard = sink.writer.lock();
                locked.wait();
                thread::sleep(Duration::from_millis(50));
            });
            locked.wait();
            // Waits for the other thread to release the writer.
            out.push_line("longer than eight bytes").unwrap();
            assert_eq!(out.pending(), 0);
        });
        sink.finish().unwrap();
        drop(out);
        assert_eq!(sink.into_inner(), b"longer than eight bytes\n");
    }

    #[test]
    fn test_parallel_lines_stay_whole() {
        let sink = OutputSink::new(vec![], 256);
        (0..10_000).into_par_iter().for_each_init(
            || sink.register(),
            |out, i| out.push_line(&format!("line-{i:05}-{}", "x".repeat(i % 37))).unwrap(),
        );
        sink.finish().unwrap();
        let mut expected: Vec<_> = (0..10_000)
            .map(|i| format!("line-{i:05}-{}", "x".repeat(i % 37)))
            .collect();
        expected.sort();
        assert_eq!(lines_of(sink.into_inner()), expected);
    }
}
