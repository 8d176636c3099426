use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

//===========================================================================//

/// The first line of every trace file, matching the header of reference
/// traces so whole files can be compared ("PC value, register number, value
/// to be written").
pub const TRACE_HEADER: &str = "PC值    寄存器编号  待写入寄存器的值";

//===========================================================================//

/// A committed register write.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TraceEvent {
    /// The address of the instruction that performed the write.
    pub pc: u32,
    /// The register number written.
    pub reg: u8,
    /// The value written.
    pub value: u32,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "{:08x}  {:02}          {:08x}",
            self.pc, self.reg, self.value
        )
    }
}

//===========================================================================//

/// An append-only log of register writes, optionally mirrored line by line
/// to a text sink for comparison against a reference simulator.
pub struct TraceRecorder {
    events: Vec<TraceEvent>,
    sink: Option<Box<dyn Write>>,
}

impl TraceRecorder {
    /// Returns a recorder that only keeps events in memory.
    pub fn new() -> TraceRecorder {
        TraceRecorder { events: Vec::new(), sink: None }
    }

    /// Returns a recorder that also writes every event to `sink`, after
    /// first writing the header line.
    pub fn with_sink<W: Write + 'static>(
        mut sink: W,
    ) -> io::Result<TraceRecorder> {
        writeln!(sink, "{TRACE_HEADER}")?;
        sink.flush()?;
        Ok(TraceRecorder { events: Vec::new(), sink: Some(Box::new(sink)) })
    }

    /// Returns a recorder that writes to a newly created file at `path`.
    pub fn create(path: &Path) -> io::Result<TraceRecorder> {
        TraceRecorder::with_sink(BufWriter::new(File::create(path)?))
    }

    /// Appends an event.  If writing it to the sink fails, the sink is
    /// dropped and the event is kept in memory only.
    pub fn record(&mut self, event: TraceEvent) {
        self.events.push(event);
        if let Some(sink) = self.sink.as_mut() {
            let result = writeln!(sink, "{event}").and_then(|()| sink.flush());
            if let Err(error) = result {
                log::warn!("trace output disabled: {error}");
                self.sink = None;
            }
        }
    }

    /// Returns every event recorded so far, oldest first.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }
}

impl Default for TraceRecorder {
    fn default() -> TraceRecorder {
        TraceRecorder::new()
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{TRACE_HEADER, TraceEvent, TraceRecorder};
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn event_format() {
        let event = TraceEvent { pc: 0x8000_0004, reg: 8, value: 0x1234_5678 };
        assert_eq!(format!("{event}"), "80000004  08          12345678");
        let event = TraceEvent { pc: 0xbfc0_0000, reg: 31, value: 0xff };
        assert_eq!(format!("{event}"), "bfc00000  31          000000ff");
    }

    #[test]
    fn sink_gets_header_and_lines() {
        let buffer = SharedBuffer::default();
        let mut trace = TraceRecorder::with_sink(buffer.clone()).unwrap();
        trace.record(TraceEvent { pc: 0x8000_0000, reg: 9, value: 5 });
        trace.record(TraceEvent { pc: 0x8000_0004, reg: 10, value: 6 });
        let text = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        assert_eq!(
            text,
            format!(
                "{TRACE_HEADER}\n\
                 80000000  09          00000005\n\
                 80000004  10          00000006\n"
            )
        );
        assert_eq!(trace.events().len(), 2);
        assert_eq!(
            text.lines().next(),
            Some("PC值    寄存器编号  待写入寄存器的值")
        );
    }

    #[test]
    fn broken_sink_keeps_events() {
        let mut trace = TraceRecorder {
            events: Vec::new(),
            sink: Some(Box::new(BrokenSink)),
        };
        trace.record(TraceEvent { pc: 0, reg: 1, value: 1 });
        assert!(trace.sink.is_none());
        trace.record(TraceEvent { pc: 4, reg: 2, value: 2 });
        assert_eq!(trace.events().len(), 2);
    }
}

//===========================================================================//
