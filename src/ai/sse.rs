/// One server-sent event: the `event:` name plus the joined `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental parser for a `text/event-stream` body.
///
/// Feed it raw byte chunks as they arrive; it returns every frame completed
/// by that chunk. Frames are delimited by a blank line. Multiple `data:`
/// lines within one frame are joined with newlines, comment lines (leading
/// `:`) and fields other than `event`/`data` are ignored, and an absent
/// `event` field defaults to `message` per the SSE spec.
///
/// The buffer holds raw bytes: a transport chunk may end in the middle of a
/// multi-byte UTF-8 character, so decoding happens per complete line, never
/// per chunk.
#[derive(Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.flush() {
                    frames.push(frame);
                }
            } else {
                self.parse_line(line);
            }
        }
        frames
    }

    fn parse_line(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            _ => {}
        }
    }

    fn flush(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data_lines.is_empty() {
            return None;
        }
        let frame = SseFrame {
            event: self.event.take().unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data_lines).join("\n"),
        };
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_frame() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"event: chunk\ndata: {\"platform\":\"twitter\"}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "chunk".to_string(),
                data: "{\"platform\":\"twitter\"}".to_string(),
            }]
        );
    }

    #[test]
    fn reassembles_frames_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"event: com").is_empty());
        assert!(parser.feed(b"plete\ndata: {}").is_empty());
        let frames = parser.feed(b"\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "complete");
        assert_eq!(frames[0].data, "{}");
    }

    #[test]
    fn multibyte_characters_survive_a_mid_character_chunk_split() {
        let bytes = "data: Café ouvert en été ☀\n\n".as_bytes();
        let mut parser = SseParser::new();

        // Split inside the two-byte "é" of "Café"
        assert!(parser.feed(&bytes[..10]).is_empty());
        let frames = parser.feed(&bytes[10..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "Café ouvert en été ☀");
    }

    #[test]
    fn every_single_byte_chunking_yields_identical_frames() {
        let bytes = "event: chunk\ndata: 🎉 déjà vu\n\n".as_bytes();
        let mut parser = SseParser::new();

        let mut frames = Vec::new();
        for byte in bytes {
            frames.extend(parser.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "chunk");
        assert_eq!(frames[0].data, "🎉 déjà vu");
    }

    #[test]
    fn joins_multiple_data_lines() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"data: first\ndata: second\n\n");
        assert_eq!(frames[0].data, "first\nsecond");
        assert_eq!(frames[0].event, "message");
    }

    #[test]
    fn handles_crlf_delimiters_and_comments() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b": keepalive\r\nevent: done\r\ndata: {}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "done");
    }

    #[test]
    fn multiple_frames_in_one_chunk() {
        let mut parser = SseParser::new();
        let frames =
            parser.feed(b"event: start\ndata: {\"platform\":\"facebook\"}\n\nevent: start\ndata: {\"platform\":\"twitter\"}\n\n");
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn blank_lines_without_fields_emit_nothing() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"\n\n\n").is_empty());
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"id: 7\nretry: 100\nevent: chunk\ndata: x\n\n");
        assert_eq!(frames[0].event, "chunk");
        assert_eq!(frames[0].data, "x");
    }
}
