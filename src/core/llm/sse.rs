//! Server-sent event stream parsing for the predictions API.
//!
//! Network reads arrive in arbitrary byte chunks, so the parser keeps a
//! buffer and only emits events for complete frames (terminated by a
//! blank line).

/// A parsed stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A text fragment of the answer.
    Output(String),
    /// Stream complete.
    Done,
    /// Server-reported stream failure.
    Error(String),
}

/// Buffering SSE parser.
pub struct StreamParser {
    buffer: String,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Feed incoming data, returning all newly completed events.
    pub fn parse(&mut self, data: &str) -> Vec<SseEvent> {
        self.buffer.push_str(data);

        let mut events = Vec::new();
        while let Some(frame_end) = self.buffer.find("\n\n") {
            let frame = self.buffer[..frame_end].to_string();
            self.buffer = self.buffer[frame_end + 2..].to_string();

            if let Some(event) = Self::parse_frame(&frame) {
                events.push(event);
            }
        }
        events
    }

    fn parse_frame(frame: &str) -> Option<SseEvent> {
        let mut event_name = "";
        let mut data_lines: Vec<&str> = Vec::new();

        for line in frame.lines() {
            if let Some(rest) = line.strip_prefix("event:") {
                event_name = rest.strip_prefix(' ').unwrap_or(rest);
            } else if let Some(rest) = line.strip_prefix("data:") {
                data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
            }
            // "id:" and comment lines are ignored
        }

        let data = data_lines.join("\n");
        match event_name {
            "output" => Some(SseEvent::Output(data)),
            "done" => Some(SseEvent::Done),
            "error" => Some(SseEvent::Error(data)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_and_done_events() {
        let mut parser = StreamParser::new();
        let events = parser.parse(
            "event: output\nid: 1\ndata: Hello\n\nevent: output\nid: 2\ndata:  world\n\nevent: done\ndata: {}\n\n",
        );
        assert_eq!(
            events,
            vec![
                SseEvent::Output("Hello".to_string()),
                SseEvent::Output(" world".to_string()),
                SseEvent::Done,
            ]
        );
    }

    #[test]
    fn test_frames_split_across_chunks() {
        let mut parser = StreamParser::new();
        assert!(parser.parse("event: out").is_empty());
        assert!(parser.parse("put\ndata: Hel").is_empty());
        let events = parser.parse("lo\n\n");
        assert_eq!(events, vec![SseEvent::Output("Hello".to_string())]);
    }

    #[test]
    fn test_multiline_data_joined_with_newline() {
        let mut parser = StreamParser::new();
        let events = parser.parse("event: output\ndata: line one\ndata: line two\n\n");
        assert_eq!(
            events,
            vec![SseEvent::Output("line one\nline two".to_string())]
        );
    }

    #[test]
    fn test_error_event() {
        let mut parser = StreamParser::new();
        let events = parser.parse("event: error\ndata: prediction failed\n\n");
        assert_eq!(
            events,
            vec![SseEvent::Error("prediction failed".to_string())]
        );
    }

    #[test]
    fn test_unknown_events_ignored() {
        let mut parser = StreamParser::new();
        let events = parser.parse("event: ping\ndata: {}\n\nevent: output\ndata: x\n\n");
        assert_eq!(events, vec![SseEvent::Output("x".to_string())]);
    }

    #[test]
    fn test_empty_output_fragment_preserved() {
        let mut parser = StreamParser::new();
        let events = parser.parse("event: output\ndata: \n\n");
        assert_eq!(events, vec![SseEvent::Output(String::new())]);
    }
}
