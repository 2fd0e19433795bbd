//! Data-channel consumption: buffer a whole payload in memory (listings)
//! or stream it chunk by chunk into a sink (downloads).

use std::io::{self, Read, Write};

use crate::error::{FtpError, Result};
use crate::protocol::{DATA_CHUNK_SIZE, PROGRESS_CADENCE};

/// Hooks consulted while a transfer runs. Both default to doing nothing.
pub trait TransferObserver {
    /// Called with the running byte total every [`PROGRESS_CADENCE`] bytes
    /// and once more when a streamed transfer completes.
    fn progress(&mut self, _bytes: u64) {}
    /// Checked once per received chunk.
    fn should_abort(&mut self) -> bool {
        false
    }
}

pub struct Unobserved;
impl TransferObserver for Unobserved {}

/// Read until the peer closes and return everything received.
pub fn drain_buffered<R: Read>(src: &mut R, observer: &mut dyn TransferObserver) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut chunk = vec![0u8; DATA_CHUNK_SIZE];
    loop {
        if observer.should_abort() {
            return Err(FtpError::Aborted {
                bytes: payload.len() as u64,
            });
        }
        match src.read(&mut chunk) {
            Ok(0) => return Ok(payload),
            Ok(n) => payload.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(FtpError::Interrupted {
                    bytes: payload.len() as u64,
                    source: e,
                })
            }
        }
    }
}

/// Copy from `src` into `sink` until the peer closes, returning the byte
/// count. Each chunk is written out before the next read.
pub fn stream_to_sink<R: Read, W: Write + ?Sized>(
    src: &mut R,
    sink: &mut W,
    observer: &mut dyn TransferObserver,
) -> Result<u64> {
    let mut total = 0u64;
    let mut reported = 0u64;
    let mut chunk = vec![0u8; DATA_CHUNK_SIZE];
    loop {
        if observer.should_abort() {
            return Err(FtpError::Aborted { bytes: total });
        }
        let n = match src.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(FtpError::Interrupted {
                    bytes: total,
                    source: e,
                })
            }
        };
        sink.write_all(&chunk[..n]).map_err(FtpError::Sink)?;
        total += n as u64;
        if total / PROGRESS_CADENCE > reported / PROGRESS_CADENCE {
            observer.progress(total);
            reported = total;
        }
    }
    sink.flush().map_err(FtpError::Sink)?;
    observer.progress(total);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        reports: Vec<u64>,
        checks: usize,
        abort_after: Option<usize>,
    }

    impl TransferObserver for Recorder {
        fn progress(&mut self, bytes: u64) {
            self.reports.push(bytes);
        }
        fn should_abort(&mut self) -> bool {
            self.checks += 1;
            matches!(self.abort_after, Some(n) if self.checks > n)
        }
    }

    /// Hands out at most `step` bytes per read, like a socket would.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn buffered_collects_everything() {
        let mut src = Trickle {
            data: b"a\r\nb\r\n".repeat(5000),
            pos: 0,
            step: 1000,
        };
        let payload = drain_buffered(&mut src, &mut Unobserved).unwrap();
        assert_eq!(payload.len(), 30_000);
    }

    #[test]
    fn buffered_empty_channel() {
        let payload = drain_buffered(&mut Cursor::new(Vec::new()), &mut Unobserved).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn streamed_counts_bytes_and_reports_at_cadence() {
        let total = (PROGRESS_CADENCE * 2 + 100) as usize;
        let mut src = Trickle {
            data: vec![7u8; total],
            pos: 0,
            step: 4096,
        };
        let mut sink = Vec::new();
        let mut rec = Recorder::default();
        let n = stream_to_sink(&mut src, &mut sink, &mut rec).unwrap();
        assert_eq!(n, total as u64);
        assert_eq!(sink.len(), total);
        assert_eq!(rec.reports.len(), 3);
        assert!(rec.reports[0] >= PROGRESS_CADENCE && rec.reports[0] < PROGRESS_CADENCE + 4096);
        assert_eq!(*rec.reports.last().unwrap(), total as u64);
    }

    #[test]
    fn abort_is_checked_per_chunk() {
        let mut src = Trickle {
            data: vec![1u8; 10_000],
            pos: 0,
            step: 1000,
        };
        let mut sink = Vec::new();
        let mut rec = Recorder {
            abort_after: Some(3),
            ..Default::default()
        };
        match stream_to_sink(&mut src, &mut sink, &mut rec) {
            Err(FtpError::Aborted { bytes }) => assert_eq!(bytes, 3000),
            other => panic!("expected abort, got {:?}", other),
        }
        assert_eq!(sink.len(), 3000);
    }

    #[test]
    fn broken_channel_keeps_partial_count() {
        struct Reset(usize);
        impl Read for Reset {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0 == 0 {
                    return Err(io::Error::from(io::ErrorKind::ConnectionReset));
                }
                self.0 -= 1;
                let n = buf.len().min(1000);
                buf[..n].fill(9);
                Ok(n)
            }
        }
        let mut sink = Vec::new();
        match stream_to_sink(&mut Reset(4), &mut sink, &mut Unobserved) {
            Err(FtpError::Interrupted { bytes, .. }) => assert_eq!(bytes, 4000),
            other => panic!("expected interrupted transfer, got {:?}", other),
        }
        match drain_buffered(&mut Reset(2), &mut Unobserved) {
            Err(FtpError::Interrupted { bytes, .. }) => assert_eq!(bytes, 2000),
            other => panic!("expected interrupted transfer, got {:?}", other),
        }
    }

    #[test]
    fn sink_failure_is_reported_as_sink_error() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut src = Cursor::new(vec![0u8; 10]);
        assert!(matches!(
            stream_to_sink(&mut src, &mut Full, &mut Unobserved),
            Err(FtpError::Sink(_))
        ));
    }
}
