//! Dual-sink output: deliver the rendered snapshot to every destination.
//!
//! Destinations are an explicit ordered list. Every sink gets a write
//! attempt even when an earlier one fails — a disconnected HTTP peer must
//! not cost us the log line, and a broken log stream must not cost the
//! caller their response. Individual failures are logged and swallowed.

use std::io::Write;

/// Write `rendered` plus a trailing newline to each sink in order.
pub fn emit(rendered: &[u8], sinks: &mut [(&str, &mut dyn Write)]) {
    for (name, sink) in sinks.iter_mut() {
        if let Err(e) = write_rendered(&mut **sink, rendered) {
            tracing::warn!(sink = *name, error = %e, "snapshot write failed");
        }
    }
}

fn write_rendered(sink: &mut dyn Write, rendered: &[u8]) -> std::io::Result<()> {
    sink.write_all(rendered)?;
    sink.write_all(b"\n")?;
    sink.flush()
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_sink_receives_identical_bytes() {
        let mut first = Vec::new();
        let mut second = Vec::new();

        emit(b"snapshot", &mut [("first", &mut first), ("second", &mut second)]);

        assert_eq!(first, b"snapshot\n");
        assert_eq!(first, second);
    }

    #[test]
    fn a_failing_sink_does_not_suppress_the_next() {
        let mut broken = BrokenPipe;
        let mut intact = Vec::new();

        emit(b"snapshot", &mut [("broken", &mut broken), ("intact", &mut intact)]);

        assert_eq!(intact, b"snapshot\n");
    }

    #[test]
    fn a_failing_sink_does_not_suppress_the_previous() {
        let mut intact = Vec::new();
        let mut broken = BrokenPipe;

        emit(b"snapshot", &mut [("intact", &mut intact), ("broken", &mut broken)]);

        assert_eq!(intact, b"snapshot\n");
    }
}
