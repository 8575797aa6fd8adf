//! The wire format between `arborc` and the window manager.
//!
//! A request is either a command call, `C<argc>\0<arg>\0<arg>\0...`, or an idle subscription,
//! `I\0`. A reply consists of three null terminated fields: `stdout\0stderr\0status\0`.
//! Hooks are sent to idle subscribers as tab separated tokens terminated by a newline.
use std::io::Read;

use crate::ProtocolError;

const CALL: u8 = b'C';
const IDLE: u8 = b'I';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Run the command given by the argument vector
    Call(Vec<String>),
    /// Subscribe to hooks, the connection only receives hooks from now on
    Idle,
}

impl Request {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Request::Idle => vec![IDLE, 0],
            Request::Call(args) => {
                let mut bytes = vec![CALL];
                bytes.extend_from_slice(args.len().to_string().as_bytes());
                bytes.push(0);
                for arg in args {
                    bytes.extend_from_slice(arg.as_bytes());
                    bytes.push(0);
                }
                bytes
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl Reply {
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.stdout.len() + self.stderr.len() + 8);
        bytes.extend_from_slice(self.stdout.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(self.stderr.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(self.status.to_string().as_bytes());
        bytes.push(0);
        bytes
    }
}

/// Render a hook the way idle subscribers receive it
pub fn encode_hook(args: &[String]) -> Vec<u8> {
    let mut line = args.join("\t");
    line.push('\n');
    line.into_bytes()
}

/// Split a received hook line back into its tokens
pub fn decode_hook(line: &str) -> Vec<String> {
    line.trim_end_matches('\n')
        .split('\t')
        .map(String::from)
        .collect()
}

/// Find the end of the null terminated field starting at `start`
fn field_end(buf: &[u8], start: usize) -> Option<usize> {
    buf.get(start..)?
        .iter()
        .position(|b| *b == 0)
        .map(|pos| start + pos)
}

fn field(buf: &[u8], start: usize, end: usize) -> Result<String, ProtocolError> {
    Ok(String::from_utf8(buf[start..end].to_vec())?)
}

/// Collects bytes from a (possibly non-blocking) stream and cuts them into requests
#[derive(Debug, Default)]
pub struct RequestDecoder {
    buf: Vec<u8>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Whether there are bytes of an incomplete request left
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Take the next complete request out of the buffer, if there is one
    pub fn next_request(&mut self) -> Result<Option<Request>, ProtocolError> {
        let kind = match self.buf.first() {
            Some(kind) => *kind,
            None => return Ok(None),
        };
        match kind {
            IDLE => {
                if self.buf.len() < 2 {
                    return Ok(None);
                }
                self.buf.drain(..2);
                Ok(Some(Request::Idle))
            }
            CALL => {
                let count_end = match field_end(&self.buf, 1) {
                    Some(end) => end,
                    None => return Ok(None),
                };
                let count = field(&self.buf, 1, count_end)?;
                let argc = count
                    .parse::<usize>()
                    .map_err(|_| ProtocolError::BadCount(count.clone()))?;
                let mut args = Vec::with_capacity(argc);
                let mut pos = count_end + 1;
                for _ in 0..argc {
                    let end = match field_end(&self.buf, pos) {
                        Some(end) => end,
                        None => return Ok(None),
                    };
                    args.push(field(&self.buf, pos, end)?);
                    pos = end + 1;
                }
                self.buf.drain(..pos);
                Ok(Some(Request::Call(args)))
            }
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

/// The client side counterpart of [`RequestDecoder`]
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    buf: Vec<u8>,
}

impl ReplyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn next_reply(&mut self) -> Result<Option<Reply>, ProtocolError> {
        let out_end = match field_end(&self.buf, 0) {
            Some(end) => end,
            None => return Ok(None),
        };
        let err_end = match field_end(&self.buf, out_end + 1) {
            Some(end) => end,
            None => return Ok(None),
        };
        let status_end = match field_end(&self.buf, err_end + 1) {
            Some(end) => end,
            None => return Ok(None),
        };
        let stdout = field(&self.buf, 0, out_end)?;
        let stderr = field(&self.buf, out_end + 1, err_end)?;
        let status = field(&self.buf, err_end + 1, status_end)?;
        let status = status
            .parse::<i32>()
            .map_err(|_| ProtocolError::BadStatus(status.clone()))?;
        self.buf.drain(..=status_end);
        Ok(Some(Reply {
            stdout,
            stderr,
            status,
        }))
    }
}

/// Block until one full reply was read from `stream`
pub fn read_reply<R: Read>(stream: &mut R) -> Result<Reply, ProtocolError> {
    let mut decoder = ReplyDecoder::new();
    let mut chunk = [0; 4096];
    loop {
        if let Some(reply) = decoder.next_reply()? {
            return Ok(reply);
        }
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            return Err(ProtocolError::UnexpectedEof);
        }
        decoder.feed(&chunk[..read]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(args: &[&str]) -> Request {
        Request::Call(args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn requests_arrive_in_pieces() {
        let mut bytes = call(&["set_attr", "my_v", ""]).encode();
        bytes.extend(Request::Idle.encode());

        let mut decoder = RequestDecoder::new();
        decoder.feed(&bytes[..5]);
        assert_eq!(decoder.next_request().unwrap(), None);
        decoder.feed(&bytes[5..]);
        assert_eq!(
            decoder.next_request().unwrap(),
            Some(call(&["set_attr", "my_v", ""]))
        );
        assert_eq!(decoder.next_request().unwrap(), Some(Request::Idle));
        assert_eq!(decoder.next_request().unwrap(), None);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn empty_call_is_valid() {
        let mut decoder = RequestDecoder::new();
        decoder.feed(&call(&[]).encode());
        assert_eq!(decoder.next_request().unwrap(), Some(call(&[])));
    }

    #[test]
    fn garbage_is_rejected() {
        let mut decoder = RequestDecoder::new();
        decoder.feed(b"X1\0");
        assert!(matches!(
            decoder.next_request(),
            Err(ProtocolError::UnknownKind(b'X'))
        ));

        let mut decoder = RequestDecoder::new();
        decoder.feed(b"Cabc\0");
        assert!(matches!(
            decoder.next_request(),
            Err(ProtocolError::BadCount(_))
        ));
    }

    #[test]
    fn reply_fields_keep_newlines() {
        let reply = Reply {
            stdout: "a\nb\n".to_string(),
            stderr: "use: no such tag\n".to_string(),
            status: 3,
        };
        let bytes = reply.encode();
        let mut stream = &bytes[..];
        assert_eq!(read_reply(&mut stream).unwrap(), reply);
    }

    #[test]
    fn truncated_reply_is_an_error() {
        let mut stream = &b"out\0err\0"[..];
        assert!(matches!(
            read_reply(&mut stream),
            Err(ProtocolError::UnexpectedEof)
        ));
    }

    #[test]
    fn hooks_are_tab_separated() {
        let hook = vec!["tag_renamed".to_string(), "old".to_string(), "new".to_string()];
        let line = String::from_utf8(encode_hook(&hook)).unwrap();
        assert_eq!(line, "tag_renamed\told\tnew\n");
        assert_eq!(decode_hook(&line), hook);
    }
}
