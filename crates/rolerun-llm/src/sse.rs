/// Incremental parser for server-sent event streams.
///
/// Bytes are buffered until a blank line closes a frame, so payloads and
/// multi-byte characters split across network chunks are reassembled before
/// decoding. Only `data:` lines are kept; comments, `event:` and `id:` lines
/// are ignored.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    /// Feed arbitrary bytes and drain the payloads of every completed frame.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut payloads = Vec::new();
        while let Some(split) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..split + 2).collect();
            if let Some(payload) = extract_data_payload(&frame[..split]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing frame that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let frame = std::mem::take(&mut self.buffer);
        extract_data_payload(&frame)
    }

    #[cfg(test)]
    fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }

    /// Parse a complete SSE body in one shot.
    #[cfg(test)]
    fn parse_frames(input: &str) -> Vec<String> {
        let mut parser = Self::default();
        let mut payloads = parser.feed(input.as_bytes());
        payloads.extend(parser.finish());
        payloads
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn extract_data_payload(frame: &[u8]) -> Option<String> {
    let frame = String::from_utf8_lossy(frame);
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();

    let payload = data_lines.join("\n");
    if payload.trim().is_empty() || payload.trim() == "[DONE]" {
        None
    } else {
        Some(payload)
    }
}
