//! Minimal server-sent-events framing.
//!
//! Buffers raw response bytes and yields the payload of each `data:` line.
//! Field lines other than `data:` and blank separator lines are skipped.

pub(crate) struct SseLineBuffer {
    buf: Vec<u8>,
}

impl SseLineBuffer {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Returns the next complete `data:` payload, or `None` when the buffer
    /// holds no further complete line. Incomplete trailing bytes stay
    /// buffered until the next `push`.
    pub(crate) fn next_data(&mut self) -> Option<String> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let Some(payload) = line.trim_end().strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            return Some(payload.to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut SseLineBuffer) -> Vec<String> {
        std::iter::from_fn(|| buffer.next_data()).collect()
    }

    #[test]
    fn test_single_event() {
        let mut buffer = SseLineBuffer::new();
        buffer.push(b"data: {\"a\":1}\n\n");
        assert_eq!(drain(&mut buffer), vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_payload_split_across_pushes() {
        let mut buffer = SseLineBuffer::new();
        buffer.push(b"data: {\"par");
        assert_eq!(buffer.next_data(), None);
        buffer.push(b"tial\":true}\n");
        assert_eq!(drain(&mut buffer), vec!["{\"partial\":true}"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut buffer = SseLineBuffer::new();
        buffer.push(b"data: one\r\ndata: two\r\n");
        assert_eq!(drain(&mut buffer), vec!["one", "two"]);
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        let mut buffer = SseLineBuffer::new();
        buffer.push(b"event: message\nretry: 100\n\ndata: payload\n");
        assert_eq!(drain(&mut buffer), vec!["payload"]);
    }

    #[test]
    fn test_empty_data_line_is_skipped() {
        let mut buffer = SseLineBuffer::new();
        buffer.push(b"data:\ndata: real\n");
        assert_eq!(drain(&mut buffer), vec!["real"]);
    }
}
