//! STOMP 1.2 frame codec.
//!
//! ```text
//! COMMAND
//! header1:value1
//! header2:value2
//!
//! body^@
//! ```
//!
//! A WebSocket text message carries zero or more frames. A message made only
//! of end-of-line characters is a heartbeat.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Frame commands used by the console, client and server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompCommand {
    Connect,
    Stomp,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl StompCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            StompCommand::Connect => "CONNECT",
            StompCommand::Stomp => "STOMP",
            StompCommand::Connected => "CONNECTED",
            StompCommand::Subscribe => "SUBSCRIBE",
            StompCommand::Unsubscribe => "UNSUBSCRIBE",
            StompCommand::Send => "SEND",
            StompCommand::Message => "MESSAGE",
            StompCommand::Receipt => "RECEIPT",
            StompCommand::Error => "ERROR",
            StompCommand::Disconnect => "DISCONNECT",
        }
    }

    /// CONNECT and CONNECTED headers are never escaped.
    fn escapes_headers(&self) -> bool {
        !matches!(self, StompCommand::Connect | StompCommand::Connected)
    }
}

impl fmt::Display for StompCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StompCommand {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s {
            "CONNECT" => StompCommand::Connect,
            "STOMP" => StompCommand::Stomp,
            "CONNECTED" => StompCommand::Connected,
            "SUBSCRIBE" => StompCommand::Subscribe,
            "UNSUBSCRIBE" => StompCommand::Unsubscribe,
            "SEND" => StompCommand::Send,
            "MESSAGE" => StompCommand::Message,
            "RECEIPT" => StompCommand::Receipt,
            "ERROR" => StompCommand::Error,
            "DISCONNECT" => StompCommand::Disconnect,
            other => return Err(FrameError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Errors decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Malformed header line: {0}")]
    MalformedHeader(String),

    #[error("Invalid escape sequence in header: {0}")]
    InvalidEscape(String),

    #[error("Invalid content-length: {0}")]
    InvalidContentLength(String),

    #[error("Frame is missing its NUL terminator")]
    MissingTerminator,

    #[error("Frame is incomplete")]
    Incomplete,
}

/// One STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: StompCommand,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    pub fn new(command: StompCommand) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// CONNECT frame for the given virtual host.
    pub fn connect(host: &str, authorization: Option<String>, heartbeat_ms: u64) -> Self {
        let frame = StompFrame::new(StompCommand::Connect)
            .with_header("accept-version", "1.2,1.1,1.0")
            .with_header("host", host)
            .with_header("heart-beat", format!("{0},{0}", heartbeat_ms));
        match authorization {
            Some(value) => frame.with_header("Authorization", value),
            None => frame,
        }
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        StompFrame::new(StompCommand::Subscribe)
            .with_header("id", id)
            .with_header("destination", destination)
    }

    pub fn disconnect() -> Self {
        StompFrame::new(StompCommand::Disconnect)
    }

    /// First value of a header. Repeated headers keep the first occurrence.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parsed `heart-beat` header as `(can_send_ms, wants_receive_ms)`.
    pub fn heartbeat(&self) -> Option<(u64, u64)> {
        let (send, receive) = self.header("heart-beat")?.split_once(',')?;
        Some((send.trim().parse().ok()?, receive.trim().parse().ok()?))
    }

    /// Serialises the frame, including the trailing NUL.
    pub fn encode(&self) -> String {
        let escape_headers = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape_headers {
                out.push_str(&escape(name));
                out.push(':');
                out.push_str(&escape(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.header("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }
}

/// Decodes every frame in one transport message.
///
/// Returns an empty list for a heartbeat.
pub fn parse_frames(input: &str) -> Result<Vec<StompFrame>, FrameError> {
    let mut frames = Vec::new();
    let mut rest = input;
    loop {
        rest = rest.trim_start_matches(['\r', '\n']);
        if rest.is_empty() {
            break;
        }
        let (frame, remaining) = parse_one(rest)?;
        frames.push(frame);
        rest = remaining;
    }
    Ok(frames)
}

fn parse_one(input: &str) -> Result<(StompFrame, &str), FrameError> {
    let (command_line, mut cursor) = split_line(input).ok_or(FrameError::Incomplete)?;
    let command: StompCommand = command_line.parse()?;

    let mut headers = Vec::new();
    loop {
        let (line, next) = split_line(cursor).ok_or(FrameError::Incomplete)?;
        cursor = next;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
        if command.escapes_headers() {
            headers.push((unescape(name)?, unescape(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .map(|(_, value)| {
            value
                .trim()
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength(value.clone()))
        })
        .transpose()?;

    let (body, remaining) = match content_length {
        Some(len) => {
            if cursor.len() <= len {
                return Err(FrameError::Incomplete);
            }
            if !cursor.is_char_boundary(len) {
                return Err(FrameError::InvalidContentLength(len.to_string()));
            }
            if cursor.as_bytes()[len] != 0 {
                return Err(FrameError::MissingTerminator);
            }
            (&cursor[..len], &cursor[len + 1..])
        }
        None => {
            let end = cursor.find('\0').ok_or(FrameError::MissingTerminator)?;
            (&cursor[..end], &cursor[end + 1..])
        }
    };

    Ok((
        StompFrame {
            command,
            headers,
            body: body.to_string(),
        },
        remaining,
    ))
}

fn split_line(input: &str) -> Option<(&str, &str)> {
    let idx = input.find('\n')?;
    let line = &input[..idx];
    Some((line.strip_suffix('\r').unwrap_or(line), &input[idx + 1..]))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(value: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(value.to_string())),
        }
    }
    Ok(out)
}

/// Heartbeat intervals agreed between client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heartbeat {
    /// How often we must send something. `None` = never.
    pub outgoing: Option<Duration>,
    /// How often the server promises to send something. `None` = never.
    pub incoming: Option<Duration>,
}

impl Heartbeat {
    /// Negotiates per STOMP: each direction is the larger of the two offers,
    /// or disabled if either side offers 0.
    pub fn negotiate(client: (u64, u64), server: (u64, u64)) -> Self {
        let pick = |ours: u64, theirs: u64| {
            (ours != 0 && theirs != 0).then(|| Duration::from_millis(ours.max(theirs)))
        };
        Self {
            outgoing: pick(client.0, server.1),
            incoming: pick(client.1, server.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn connect_frame_carries_bearer_header_unescaped() {
        let frame = StompFrame::connect("localhost", Some("Bearer a:b".to_string()), 4000);
        let wire = frame.encode();

        assert!(wire.starts_with("CONNECT\n"));
        assert!(wire.contains("accept-version:1.2,1.1,1.0\n"));
        assert!(wire.contains("heart-beat:4000,4000\n"));
        assert!(wire.contains("Authorization:Bearer a:b\n"));
        assert!(wire.ends_with("\n\n\0"));
    }

    #[test]
    fn connect_frame_without_credential_has_no_authorization() {
        let wire = StompFrame::connect("localhost", None, 0).encode();
        assert!(!wire.contains("Authorization"));
    }

    #[test]
    fn subscribe_frame_escapes_colons() {
        let wire = StompFrame::subscribe("sub-0", "/topic/a:b").encode();
        assert!(wire.contains("destination:/topic/a\\cb\n"));
    }

    #[test]
    fn parses_spring_message_frame() {
        let wire = "MESSAGE\ndestination:/topic/students\ncontent-type:application/json\nsubscription:sub-0\nmessage-id:1\ncontent-length:13\n\n{\"type\":\"x\"}\n\0";

        let frames = parse_frames(wire).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, StompCommand::Message);
        assert_eq!(frames[0].header("destination"), Some("/topic/students"));
        assert_eq!(frames[0].body, "{\"type\":\"x\"}\n");
    }

    #[test]
    fn parses_connected_frame_heartbeat() {
        let frames = parse_frames("CONNECTED\nversion:1.2\nheart-beat:10000,10000\n\n\0").unwrap();
        assert_eq!(frames[0].command, StompCommand::Connected);
        assert_eq!(frames[0].heartbeat(), Some((10000, 10000)));
    }

    #[test]
    fn eol_only_message_is_a_heartbeat() {
        assert!(parse_frames("\n").unwrap().is_empty());
        assert!(parse_frames("\r\n").unwrap().is_empty());
    }

    #[test]
    fn parses_multiple_frames_in_one_message() {
        let wire = format!(
            "{}\n{}",
            StompFrame::new(StompCommand::Receipt).with_header("receipt-id", "1").encode(),
            StompFrame::new(StompCommand::Message).with_body("hi").encode()
        );

        let frames = parse_frames(&wire).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].body, "hi");
    }

    #[test]
    fn content_length_allows_nul_in_body() {
        let wire = "MESSAGE\ncontent-length:3\n\na\0b\0";
        let frames = parse_frames(wire).unwrap();
        assert_eq!(frames[0].body, "a\0b");
    }

    #[test]
    fn repeated_headers_keep_first_value() {
        let frames = parse_frames("MESSAGE\nfoo:first\nfoo:second\n\n\0").unwrap();
        assert_eq!(frames[0].header("foo"), Some("first"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert_eq!(
            parse_frames("HELLO\n\n\0"),
            Err(FrameError::UnknownCommand("HELLO".to_string()))
        );
    }

    #[test]
    fn missing_terminator_is_rejected() {
        assert_eq!(
            parse_frames("MESSAGE\n\nbody"),
            Err(FrameError::MissingTerminator)
        );
    }

    #[test]
    fn invalid_escape_is_rejected() {
        assert!(matches!(
            parse_frames("MESSAGE\nfoo:bad\\t\n\n\0"),
            Err(FrameError::InvalidEscape(_))
        ));
    }

    #[test]
    fn error_frame_exposes_message_header() {
        let frames = parse_frames("ERROR\nmessage:Invalid token\n\nDetails\0").unwrap();
        assert_eq!(frames[0].command, StompCommand::Error);
        assert_eq!(frames[0].header("message"), Some("Invalid token"));
    }

    #[test]
    fn heartbeat_negotiation_takes_larger_interval() {
        let hb = Heartbeat::negotiate((4000, 4000), (10000, 10000));
        assert_eq!(hb.outgoing, Some(Duration::from_secs(10)));
        assert_eq!(hb.incoming, Some(Duration::from_secs(10)));
    }

    #[test]
    fn heartbeat_disabled_when_either_side_offers_zero() {
        let hb = Heartbeat::negotiate((4000, 4000), (0, 0));
        assert_eq!(hb, Heartbeat::default());

        let hb = Heartbeat::negotiate((0, 4000), (5000, 5000));
        assert_eq!(hb.outgoing, None);
        assert_eq!(hb.incoming, Some(Duration::from_secs(5)));
    }

    proptest! {
        #[test]
        fn escaped_headers_survive_the_wire(value in "[ -~\r\n\\\\:]{0,40}") {
            let frame = StompFrame::new(StompCommand::Message).with_header("x-test", value.clone());
            let parsed = parse_frames(&frame.encode()).unwrap();
            prop_assert_eq!(parsed[0].header("x-test"), Some(value.as_str()));
        }
    }
}
