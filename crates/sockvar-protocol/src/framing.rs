//! Terminator-delimited Base64 framing.
//!
//! A frame is the Base64 encoding of the payload followed by a blank line:
//!
//! ```text
//! +--------------------------+--------------+
//! |  Base64(payload) (ASCII) |  \r\n\r\n    |
//! +--------------------------+--------------+
//! ```
//!
//! There is no length prefix, checksum or version field. Readers find the end
//! of a frame by scanning for the terminator, which [`FrameAccumulator`] does
//! incrementally across reads.

use std::io::Write;

use crate::MAX_FRAME_SIZE;
use crate::base64;
use crate::error::{ProtocolError, ProtocolResult};

/// Bytes marking the end of a frame.
pub const TERMINATOR: &[u8; 4] = b"\r\n\r\n";

/// Encodes a payload into a complete frame.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the frame would exceed
/// [`MAX_FRAME_SIZE`].
///
/// # Example
///
/// ```rust
/// use sockvar_protocol::frame;
///
/// let bytes = frame(b"MessageID=1\r\n").unwrap();
/// assert_eq!(bytes, b"TWVzc2FnZUlEPTENCg==\r\n\r\n");
/// ```
pub fn frame(payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    let size = base64::encoded_len(payload.len()) + TERMINATOR.len();
    if size > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buffer = vec![0u8; size];
    let written = base64::encode_into(payload, &mut buffer);
    buffer.truncate(written.len);
    buffer.extend_from_slice(TERMINATOR);
    Ok(buffer)
}

/// Decodes the raw bytes of a received frame into the response body.
///
/// The terminator and any line breaks are outside the Base64 alphabet and
/// are skipped by the decoder, so `raw` may be passed with or without them.
pub fn deframe(raw: &[u8]) -> Vec<u8> {
    base64::decode(raw)
}

/// Returns the offset of the first terminator in `buf`.
pub fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}

/// Progress reported by [`FrameAccumulator::extend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// No terminator yet and room for more bytes.
    Pending,
    /// The terminator has been seen.
    Terminated,
    /// Capacity reached without a terminator.
    Full,
}

/// Collects bytes from successive reads until a terminator is seen or a
/// fixed capacity is reached.
///
/// Bytes beyond the capacity are dropped, never buffered.
#[derive(Debug)]
pub struct FrameAccumulator {
    buf: Vec<u8>,
    capacity: usize,
    terminator_at: Option<usize>,
}

impl FrameAccumulator {
    /// Creates an accumulator that holds at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.min(MAX_FRAME_SIZE)),
            capacity,
            terminator_at: None,
        }
    }

    /// Appends a chunk of received bytes.
    pub fn extend(&mut self, chunk: &[u8]) -> FrameStatus {
        if self.terminator_at.is_some() {
            return FrameStatus::Terminated;
        }

        let take = chunk.len().min(self.remaining());
        // The terminator may straddle the previous chunk.
        let search_from = self.buf.len().saturating_sub(TERMINATOR.len() - 1);
        self.buf.extend_from_slice(&chunk[..take]);
        self.terminator_at = find_terminator(&self.buf[search_from..]).map(|i| search_from + i);

        self.status()
    }

    /// Returns the current status without consuming input.
    pub fn status(&self) -> FrameStatus {
        if self.terminator_at.is_some() {
            FrameStatus::Terminated
        } else if self.buf.len() >= self.capacity {
            FrameStatus::Full
        } else {
            FrameStatus::Pending
        }
    }

    /// Number of bytes that can still be accepted.
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Returns true once the terminator has been seen.
    pub fn is_terminated(&self) -> bool {
        self.terminator_at.is_some()
    }

    /// Number of bytes collected, terminator included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Every byte collected, including the terminator and anything after it.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The frame body: everything before the terminator, or everything
    /// collected if no terminator was seen.
    pub fn body(&self) -> &[u8] {
        &self.buf[..self.terminator_at.unwrap_or(self.buf.len())]
    }
}

/// Writes frames to a byte stream.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a new FrameWriter wrapping the given writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Frames `payload` and writes the whole frame, looping over short
    /// writes. Returns the number of bytes written.
    pub fn write_frame(&mut self, payload: &[u8]) -> ProtocolResult<usize> {
        let data = frame(payload)?;
        self.writer.write_all(&data)?;
        self.writer.flush()?;
        Ok(data.len())
    }

    /// Unwraps this FrameWriter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn frame_appends_terminator() {
        assert_eq!(frame(b"foo").unwrap(), b"Zm9v\r\n\r\n");
        assert_eq!(frame(b"f").unwrap(), b"Zg==\r\n\r\n");
    }

    #[test]
    fn empty_payload_frames_to_bare_terminator() {
        assert_eq!(frame(b"").unwrap(), TERMINATOR);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![b'x'; MAX_FRAME_SIZE];
        let result = frame(&payload);
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
    }

    #[test]
    fn deframe_ignores_terminator() {
        assert_eq!(deframe(b"Zm9v\r\n\r\n"), b"foo");
        assert_eq!(deframe(b"Zm9v"), b"foo");
        assert_eq!(deframe(b""), b"");
    }

    #[test]
    fn frame_deframe_roundtrip() {
        let payload = b"MessageID=1234\r\nMessageType=CallerIDJob\r\n";
        assert_eq!(deframe(&frame(payload).unwrap()), payload);
    }

    #[test]
    fn find_terminator_positions() {
        assert_eq!(find_terminator(b"abc\r\n\r\n"), Some(3));
        assert_eq!(find_terminator(b"\r\n\r\nrest"), Some(0));
        assert_eq!(find_terminator(b"abc\r\n\r"), None);
        assert_eq!(find_terminator(b""), None);
    }

    #[test]
    fn accumulator_single_chunk() {
        let mut acc = FrameAccumulator::with_capacity(64);
        assert_eq!(acc.extend(b"Zm9v\r\n\r\n"), FrameStatus::Terminated);
        assert_eq!(acc.body(), b"Zm9v");
        assert_eq!(acc.len(), 8);
    }

    #[test]
    fn accumulator_terminator_split_across_chunks() {
        let mut acc = FrameAccumulator::with_capacity(64);
        assert_eq!(acc.extend(b"Zm9v\r"), FrameStatus::Pending);
        assert_eq!(acc.extend(b"\n\r"), FrameStatus::Pending);
        assert_eq!(acc.extend(b"\ntrailing"), FrameStatus::Terminated);
        assert_eq!(acc.body(), b"Zm9v");
        assert!(acc.is_terminated());
    }

    #[test]
    fn accumulator_keeps_bytes_after_terminator_in_same_chunk() {
        let mut acc = FrameAccumulator::with_capacity(64);
        acc.extend(b"Zm9v\r\n\r\nYmFy");
        assert_eq!(acc.body(), b"Zm9v");
        assert_eq!(acc.as_bytes(), b"Zm9v\r\n\r\nYmFy");
    }

    #[test]
    fn accumulator_ignores_input_after_terminator() {
        let mut acc = FrameAccumulator::with_capacity(64);
        acc.extend(b"Zg==\r\n\r\n");
        let len = acc.len();
        assert_eq!(acc.extend(b"more"), FrameStatus::Terminated);
        assert_eq!(acc.len(), len);
    }

    #[test]
    fn accumulator_stops_at_capacity() {
        let mut acc = FrameAccumulator::with_capacity(6);
        assert_eq!(acc.extend(b"Zm9v"), FrameStatus::Pending);
        assert_eq!(acc.remaining(), 2);
        assert_eq!(acc.extend(b"YmFy\r\n\r\n"), FrameStatus::Full);
        assert_eq!(acc.len(), 6);
        assert_eq!(acc.body(), b"Zm9vYm");
        assert!(!acc.is_terminated());
    }

    #[test]
    fn accumulator_empty() {
        let acc = FrameAccumulator::with_capacity(16);
        assert!(acc.is_empty());
        assert_eq!(acc.status(), FrameStatus::Pending);
        assert_eq!(acc.body(), b"");
    }

    #[test]
    fn frame_writer_writes_full_frame() {
        let mut buffer = Vec::new();
        let written = FrameWriter::new(&mut buffer)
            .write_frame(b"Result=OK\r\n")
            .unwrap();

        assert_eq!(written, buffer.len());
        assert!(buffer.ends_with(TERMINATOR));
        assert_eq!(deframe(&buffer), b"Result=OK\r\n");
    }

    /// Writer that accepts at most `step` bytes per call.
    struct Trickle {
        inner: Vec<u8>,
        step: usize,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.step);
            self.inner.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn frame_writer_completes_short_writes() {
        let mut writer = FrameWriter::new(Trickle {
            inner: Vec::new(),
            step: 3,
        });
        writer.write_frame(b"MessageID=1\r\n").unwrap();

        let trickle = writer.into_inner();
        assert_eq!(trickle.inner, b"TWVzc2FnZUlEPTENCg==\r\n\r\n");
    }

    #[test]
    fn frame_writer_propagates_io_errors() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let result = FrameWriter::new(Broken).write_frame(b"x");
        assert!(matches!(result, Err(ProtocolError::Io(_))));
    }
}
