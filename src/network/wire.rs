//! HTTP/1.1 Request Reader
//!
//! Reads exactly one request (request line, headers, length-framed body)
//! off a byte stream. No keep-alive, no pipelining, no chunked encoding:
//! bytes past `Content-Length` are dropped and the connection serves a
//! single request.
//!
//! Parsing is split from I/O. [`RequestParser`] is fed whatever a read
//! returned, so partial reads and arbitrary chunk boundaries go through
//! one code path; [`read_request`] is the thin async loop around it.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Default cap on the header block and on the declared body length.
pub const MAX_REQUEST_BYTES: usize = 1 << 20;

/// Size of a single read.
const READ_CHUNK: usize = 4096;

/// Header/body delimiter.
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Wire-level errors.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Request line or headers could not be parsed.
    #[error("incomplete or malformed request head")]
    Incomplete,

    /// Header block or declared body exceeds the limit.
    #[error("request exceeds {limit} bytes")]
    TooLarge {
        /// The limit that was exceeded.
        limit: usize,
    },

    /// Peer closed the connection before the request was complete.
    #[error("connection closed mid-request")]
    ConnectionClosed,

    /// Socket error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl WireError {
    /// Transport errors abandon the connection without a response.
    /// Everything else is answered with `400`.
    pub fn is_transport(&self) -> bool {
        matches!(self, WireError::ConnectionClosed | WireError::Io(_))
    }
}

/// A fully read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    /// Request method (`POST`).
    pub method: String,
    /// Request target (`/gsi`).
    pub path: String,
    /// Header lines in arrival order, names as sent.
    pub headers: Vec<(String, String)>,
    /// Body, exactly `Content-Length` bytes.
    pub body: Vec<u8>,
}

impl RawRequest {
    /// First header with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
struct Head {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    content_length: usize,
}

/// Incremental request parser.
#[derive(Debug)]
pub struct RequestParser {
    buf: Vec<u8>,
    head: Option<Head>,
    limit: usize,
}

impl RequestParser {
    /// Create a parser with a size limit.
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(READ_CHUNK),
            head: None,
            limit,
        }
    }

    /// Feed the next chunk of bytes.
    ///
    /// Returns `Ok(Some(request))` once the head and the whole declared body
    /// have arrived, `Ok(None)` if more bytes are needed.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<RawRequest>, WireError> {
        let searched = self.buf.len();
        self.buf.extend_from_slice(chunk);

        if self.head.is_none() {
            // the terminator may straddle the previous chunk
            let from = searched.saturating_sub(HEAD_TERMINATOR.len() - 1);
            let Some(pos) = find(&self.buf[from..], HEAD_TERMINATOR).map(|p| p + from) else {
                if self.buf.len() > self.limit {
                    return Err(WireError::TooLarge { limit: self.limit });
                }
                return Ok(None);
            };

            let head = parse_head(&self.buf[..pos])?;
            if head.content_length > self.limit {
                return Err(WireError::TooLarge { limit: self.limit });
            }
            self.buf.drain(..pos + HEAD_TERMINATOR.len());
            self.head = Some(head);
        }

        let content_length = match &self.head {
            Some(head) => head.content_length,
            None => return Ok(None),
        };
        if self.buf.len() < content_length {
            return Ok(None);
        }

        let Some(head) = self.head.take() else {
            return Ok(None);
        };
        let mut body = std::mem::take(&mut self.buf);
        body.truncate(content_length);

        Ok(Some(RawRequest {
            method: head.method,
            path: head.path,
            headers: head.headers,
            body,
        }))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_head(raw: &[u8]) -> Result<Head, WireError> {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.split("\r\n");

    let request_line = lines.next().ok_or(WireError::Incomplete)?;
    let mut parts = request_line.split_whitespace();
    // the HTTP version token is ignored
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Err(WireError::Incomplete);
    };

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    let content_length = match headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
    {
        Some((_, value)) => value.parse::<usize>().map_err(|_| WireError::Incomplete)?,
        None => 0,
    };

    Ok(Head {
        method: method.to_string(),
        path: path.to_string(),
        headers,
        content_length,
    })
}

/// Read one request from a stream.
pub async fn read_request<S>(stream: &mut S, limit: usize) -> Result<RawRequest, WireError>
where
    S: AsyncRead + Unpin,
{
    let mut parser = RequestParser::new(limit);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(WireError::ConnectionClosed);
        }
        if let Some(request) = parser.feed(&chunk[..n])? {
            return Ok(request);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tokio::io::AsyncWriteExt;

    const REQUEST: &[u8] = b"POST /gsi HTTP/1.1\r\n\
Host: 127.0.0.1:31983\r\n\
User-Agent: Valve/Steam HTTP Client 1.0 (730)\r\n\
content-length: 13\r\n\
\r\n\
{\"map\":{}}xyz";

    fn parse_all(bytes: &[u8]) -> Result<Option<RawRequest>, WireError> {
        RequestParser::new(MAX_REQUEST_BYTES).feed(bytes)
    }

    #[test]
    fn test_parse_single_chunk() {
        let req = parse_all(REQUEST).unwrap().unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/gsi");
        assert_eq!(req.header("Content-Length"), Some("13"));
        assert_eq!(req.header("user-agent"), Some("Valve/Steam HTTP Client 1.0 (730)"));
        assert_eq!(req.body, b"{\"map\":{}}xyz");
    }

    #[test]
    fn test_body_truncated_to_content_length() {
        let raw = b"POST /gsi HTTP/1.1\r\nContent-Length: 10\r\n\r\n{\"map\":{}}GET / HTTP/1.1\r\n\r\n";
        let req = parse_all(raw).unwrap().unwrap();
        assert_eq!(req.body, b"{\"map\":{}}");
    }

    #[test]
    fn test_missing_content_length_means_empty_body() {
        let req = parse_all(b"GET /gsi HTTP/1.1\r\nHost: x\r\n\r\nignored").unwrap().unwrap();
        assert_eq!(req.method, "GET");
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_request_line_without_headers() {
        let req = parse_all(b"POST /gsi HTTP/1.1\r\n\r\n").unwrap().unwrap();
        assert_eq!(req.path, "/gsi");
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_waits_for_body() {
        let mut parser = RequestParser::new(MAX_REQUEST_BYTES);
        assert!(parser
            .feed(b"POST /gsi HTTP/1.1\r\nContent-Length: 4\r\n\r\nab")
            .unwrap()
            .is_none());
        let req = parser.feed(b"cd").unwrap().unwrap();
        assert_eq!(req.body, b"abcd");
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let mut parser = RequestParser::new(MAX_REQUEST_BYTES);
        assert!(parser.feed(b"POST /gsi HTTP/1.1\r\n\r").unwrap().is_none());
        let req = parser.feed(b"\n").unwrap().unwrap();
        assert_eq!(req.method, "POST");
    }

    #[test]
    fn test_malformed_request_line() {
        assert!(matches!(parse_all(b"POST\r\n\r\n"), Err(WireError::Incomplete)));
        assert!(matches!(parse_all(b"\r\n\r\n"), Err(WireError::Incomplete)));
    }

    #[test]
    fn test_bad_content_length() {
        let raw = b"POST /gsi HTTP/1.1\r\nContent-Length: lots\r\n\r\n";
        assert!(matches!(parse_all(raw), Err(WireError::Incomplete)));
    }

    #[test]
    fn test_oversized_head() {
        let mut parser = RequestParser::new(64);
        let err = parser.feed(&[b'a'; 65]).unwrap_err();
        assert!(matches!(err, WireError::TooLarge { limit: 64 }));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_oversized_declared_body() {
        let mut parser = RequestParser::new(64);
        let err = parser
            .feed(b"POST /gsi HTTP/1.1\r\nContent-Length: 65\r\n\r\n")
            .unwrap_err();
        assert!(matches!(err, WireError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_read_request_partial_reads() {
        // tiny duplex buffer forces many short reads
        let (mut client, mut server) = tokio::io::duplex(7);

        let writer = tokio::spawn(async move {
            client.write_all(REQUEST).await.unwrap();
            client
        });

        let req = read_request(&mut server, MAX_REQUEST_BYTES).await.unwrap();
        assert_eq!(req.body, b"{\"map\":{}}xyz");
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_read_request_connection_closed() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client
            .write_all(b"POST /gsi HTTP/1.1\r\nContent-Length: 50\r\n\r\n{\"ma")
            .await
            .unwrap();
        drop(client);

        let err = read_request(&mut server, MAX_REQUEST_BYTES).await.unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_read_request_empty_stream() {
        let mut empty: &[u8] = b"";
        let err = read_request(&mut empty, MAX_REQUEST_BYTES).await.unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    proptest! {
        #[test]
        fn test_chunking_does_not_change_result(cuts in proptest::collection::vec(0usize..REQUEST.len(), 0..12)) {
            let mut cuts = cuts;
            cuts.sort_unstable();
            cuts.dedup();

            let mut parser = RequestParser::new(MAX_REQUEST_BYTES);
            let mut result = None;
            let mut start = 0;
            for end in cuts.into_iter().chain(std::iter::once(REQUEST.len())) {
                if let Some(req) = parser.feed(&REQUEST[start..end]).unwrap() {
                    result = Some(req);
                    break;
                }
                start = end;
            }

            let expected = parse_all(REQUEST).unwrap();
            prop_assert_eq!(result, expected);
        }
    }
}
