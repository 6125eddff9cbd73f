//! Length-prefixed request/response framing and the serving loop.
//!
//! Every frame is a little-endian `u32` byte count followed by that many
//! payload bytes. Requests carry a JSON layout document; responses carry a
//! PNG (or nothing, when a request is skipped under
//! [`FailurePolicy::EmptyFrame`]).

use std::io::{self, Read, Write};

use log::{debug, info, trace, warn};

use crate::rendering::Renderer;
use crate::{Error, FailurePolicy, RendererConfig, Result};

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Reads request frames from a byte stream.
pub struct FrameReader<R> {
    inner: R,
    max_len: usize,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R, max_len: usize) -> Self {
        Self { inner, max_len }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before a new prefix.
    /// A stream that ends inside a prefix or payload is a framing failure.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let len = match self.read_prefix()? {
            Some(len) => len,
            None => return Ok(None),
        };
        if len > self.max_len {
            return Err(Error::FrameTooLarge {
                len,
                max: self.max_len,
            });
        }

        let mut payload = Vec::with_capacity(len);
        let mut body = (&mut self.inner).take(len as u64);
        body.read_to_end(&mut payload)?;
        if payload.len() < len {
            return Err(Error::TruncatedFrame {
                expected: len,
                received: payload.len(),
            });
        }
        Ok(Some(payload))
    }

    fn read_prefix(&mut self) -> Result<Option<usize>> {
        let mut prefix = [0u8; PREFIX_LEN];
        let mut filled = 0;
        while filled < PREFIX_LEN {
            match self.inner.read(&mut prefix[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => Ok(None),
            PREFIX_LEN => Ok(Some(u32::from_le_bytes(prefix) as usize)),
            received => Err(Error::TruncatedPrefix { received }),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes response frames to a byte stream, flushing after each one.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| Error::FrameTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        self.inner.write_all(&len.to_le_bytes())?;
        self.inner.write_all(payload)?;
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingRequest,
    Rendering,
    Responding,
    Closed,
}

/// Counters reported when a session ends cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Response frames written, including empty ones
    pub frames: u64,
    /// Requests answered with an empty frame
    pub skipped: u64,
}

/// One request/response conversation over a pair of streams.
pub struct Session<R, W> {
    renderer: Renderer,
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    policy: FailurePolicy,
    state: SessionState,
    summary: SessionSummary,
}

impl<R: Read, W: Write> Session<R, W> {
    pub fn new(renderer: Renderer, input: R, output: W) -> Self {
        let config = renderer.config();
        let reader = FrameReader::new(input, config.max_frame_len);
        let policy = config.failure_policy;
        Self {
            renderer,
            reader,
            writer: FrameWriter::new(output),
            policy,
            state: SessionState::AwaitingRequest,
            summary: SessionSummary::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Serve frames until the input ends.
    ///
    /// Any error closes the session. A failed request never produces a
    /// response frame unless the policy is [`FailurePolicy::EmptyFrame`].
    pub fn run(&mut self) -> Result<SessionSummary> {
        if self.state == SessionState::Closed {
            return Ok(self.summary);
        }
        let outcome = self.serve_frames();
        self.transition(SessionState::Closed);
        outcome?;
        info!(
            "session closed after {} frames ({} skipped)",
            self.summary.frames, self.summary.skipped
        );
        Ok(self.summary)
    }

    fn serve_frames(&mut self) -> Result<()> {
        loop {
            self.transition(SessionState::AwaitingRequest);
            let Some(payload) = self.reader.read_frame()? else {
                return Ok(());
            };
            debug!("request {}: {} bytes", self.summary.frames, payload.len());

            self.transition(SessionState::Rendering);
            let response = match self.renderer.render_payload(&payload) {
                Ok(image) => image.png_data,
                Err(e) if e.is_request_failure() && self.policy == FailurePolicy::EmptyFrame => {
                    warn!("skipping request {}: {}", self.summary.frames, e);
                    self.summary.skipped += 1;
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            self.transition(SessionState::Responding);
            self.writer.write_frame(&response)?;
            self.summary.frames += 1;
        }
    }

    fn transition(&mut self, next: SessionState) {
        trace!("session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub fn into_parts(self) -> (Renderer, R, W) {
        (
            self.renderer,
            self.reader.into_inner(),
            self.writer.into_inner(),
        )
    }
}

/// Load the configured font and serve `input` until it ends.
pub fn serve<R: Read, W: Write>(
    config: RendererConfig,
    input: R,
    output: W,
) -> Result<SessionSummary> {
    let renderer = Renderer::new(config)?;
    Session::new(renderer, input, output).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::test_support::fixture_font;
    use std::io::Cursor;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(payload);
        out
    }

    fn session(input: Vec<u8>, policy: FailurePolicy) -> Session<Cursor<Vec<u8>>, Vec<u8>> {
        let config = RendererConfig {
            failure_policy: policy,
            ..Default::default()
        };
        let renderer = Renderer::with_font(config, fixture_font()).unwrap();
        Session::new(renderer, Cursor::new(input), Vec::new())
    }

    /// Hands out one byte per read call.
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(1);
            self.0.read(&mut buf[..n])
        }
    }

    #[test]
    fn reads_consecutive_frames() {
        let mut input = frame(b"first");
        input.extend(frame(b""));
        input.extend(frame(b"third"));
        let mut reader = FrameReader::new(Cursor::new(input), 1024);
        let mut next = || reader.read_frame().unwrap();
        assert_eq!(next().as_deref(), Some(&b"first"[..]));
        assert_eq!(next().as_deref(), Some(&b""[..]));
        assert_eq!(next().as_deref(), Some(&b"third"[..]));
        assert!(next().is_none());
    }

    #[test]
    fn prefix_is_little_endian() {
        let mut input = vec![3, 0, 0, 0];
        input.extend_from_slice(b"abc");
        let mut reader = FrameReader::new(Cursor::new(input), 1024);
        assert_eq!(reader.read_frame().unwrap().unwrap(), b"abc");
    }

    #[test]
    fn assembles_frames_from_short_reads() {
        let input = frame(b"{\"layout\":[]}");
        let mut reader = FrameReader::new(Trickle(Cursor::new(input)), 1024);
        assert_eq!(reader.read_frame().unwrap().unwrap(), b"{\"layout\":[]}");
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn empty_stream_is_a_clean_close() {
        let mut reader = FrameReader::new(Cursor::new(Vec::new()), 1024);
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn partial_prefix_is_a_framing_failure() {
        let mut reader = FrameReader::new(Cursor::new(vec![10, 0]), 1024);
        assert!(matches!(
            reader.read_frame(),
            Err(Error::TruncatedPrefix { received: 2 })
        ));
    }

    #[test]
    fn short_payload_is_a_framing_failure() {
        let mut input = 100u32.to_le_bytes().to_vec();
        input.extend_from_slice(&[b'x'; 10]);
        let mut reader = FrameReader::new(Cursor::new(input), 1024);
        assert!(matches!(
            reader.read_frame(),
            Err(Error::TruncatedFrame {
                expected: 100,
                received: 10
            })
        ));
    }

    #[test]
    fn oversized_prefix_is_rejected_before_reading() {
        let input = frame(&[0u8; 64]);
        let mut reader = FrameReader::new(Cursor::new(input), 16);
        assert!(matches!(
            reader.read_frame(),
            Err(Error::FrameTooLarge { len: 64, max: 16 })
        ));
    }

    #[test]
    fn writer_prefixes_and_flushes() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.write_frame(b"png").unwrap();
        writer.write_frame(b"").unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes, [3, 0, 0, 0, b'p', b'n', b'g', 0, 0, 0, 0]);
    }

    #[test]
    fn session_answers_every_request() {
        let doc = br#"{"layout":[{"type":"progressbar","origin":[60,0],"size":[67,8],"value":"cpuload"}],"values":{"cpuload":0.5}}"#;
        let mut input = frame(doc);
        input.extend(frame(doc));
        let mut s = session(input, FailurePolicy::Terminate);
        let summary = s.run().unwrap();
        assert_eq!((summary.frames, summary.skipped), (2, 0));
        assert_eq!(s.state(), SessionState::Closed);

        let (_, _, output) = s.into_parts();
        let mut reader = FrameReader::new(Cursor::new(output), usize::MAX);
        let first = reader.read_frame().unwrap().unwrap();
        let second = reader.read_frame().unwrap().unwrap();
        assert_eq!(&first[0..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(first, second);
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn empty_input_closes_without_output() {
        let mut s = session(Vec::new(), FailurePolicy::Terminate);
        assert_eq!(s.run().unwrap(), SessionSummary::default());
        let (_, _, output) = s.into_parts();
        assert!(output.is_empty());
    }

    #[test]
    fn request_failure_terminates_without_a_response() {
        let good = br#"{"layout":[]}"#;
        let bad = br#"{"layout":[{"type":"text","origin":[0,10],"value":"missing"}],"values":{}}"#;
        let mut input = frame(good);
        input.extend(frame(bad));
        input.extend(frame(good));
        let mut s = session(input, FailurePolicy::Terminate);
        match s.run().unwrap_err() {
            Error::UnresolvedValue { key, .. } => assert_eq!(key, "missing"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(s.state(), SessionState::Closed);
        assert_eq!(s.summary().frames, 1);

        let (_, _, output) = s.into_parts();
        let mut reader = FrameReader::new(Cursor::new(output), usize::MAX);
        assert!(reader.read_frame().unwrap().is_some());
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn empty_frame_policy_skips_bad_requests() {
        let good = br#"{"layout":[]}"#;
        let mut input = frame(good);
        input.extend(frame(b"not json"));
        let wrong_type = br#"{"layout":[{"type":"progressbar","origin":[0,0],"value":"v"}],"values":{"v":"high"}}"#;
        input.extend(frame(wrong_type));
        input.extend(frame(good));
        let mut s = session(input, FailurePolicy::EmptyFrame);
        let summary = s.run().unwrap();
        assert_eq!((summary.frames, summary.skipped), (4, 2));

        let (_, _, output) = s.into_parts();
        let mut reader = FrameReader::new(Cursor::new(output), usize::MAX);
        let lens: Vec<usize> = std::iter::from_fn(|| reader.read_frame().unwrap())
            .map(|f| f.len())
            .collect();
        assert_eq!(lens.len(), 4);
        assert!(lens[0] > 0 && lens[3] > 0);
        assert_eq!((lens[1], lens[2]), (0, 0));
    }

    #[test]
    fn framing_failures_stay_fatal_under_empty_frame_policy() {
        let mut input = 100u32.to_le_bytes().to_vec();
        input.extend_from_slice(&[b'{'; 10]);
        let mut s = session(input, FailurePolicy::EmptyFrame);
        assert!(matches!(s.run(), Err(Error::TruncatedFrame { .. })));
        let (_, _, output) = s.into_parts();
        assert!(output.is_empty());
    }
}
