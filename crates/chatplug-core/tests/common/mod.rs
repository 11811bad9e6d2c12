//! A tiny local HTTP server returning canned feed responses.
//!
//! No mocks of the client itself: the feed client talks real HTTP/1.1 to a
//! loopback listener, and the tests assert on the captured request bodies.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct CannedFeedServer {
    addr: SocketAddr,
    join: JoinHandle<Vec<String>>,
}

impl CannedFeedServer {
    /// Serve the given `(status, body)` responses to sequential connections,
    /// one per request, then shut down.
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind feed server");
        let addr = listener.local_addr().expect("feed server addr");

        let join = thread::spawn(move || {
            let mut bodies = Vec::new();

            for (status, body) in responses {
                let (mut stream, _) = listener.accept().expect("accept");
                let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
                let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));

                let request = read_http_request(&mut stream);
                bodies.push(extract_body(&request));

                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                );
                stream
                    .write_all(response.as_bytes())
                    .expect("write response");
            }

            bodies
        });

        Self { addr, join }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.addr.port())
    }

    /// Wait for all canned responses to be consumed and return the captured
    /// request bodies in arrival order.
    pub fn finish(self) -> Vec<String> {
        self.join.join().expect("feed server thread")
    }
}

fn read_http_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut scratch = [0u8; 4096];

    loop {
        match stream.read(&mut scratch) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&scratch[..n]);
                if let Some(headers_end) = find_double_crlf(&buf) {
                    let body_len = parse_content_length(&buf[..headers_end]).unwrap_or(0);
                    while buf.len() < headers_end + body_len {
                        match stream.read(&mut scratch) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => buf.extend_from_slice(&scratch[..n]),
                        }
                    }
                    break;
                }
            }
        }
    }

    buf
}

fn extract_body(request: &[u8]) -> String {
    let Some(headers_end) = find_double_crlf(request) else {
        return String::new();
    };
    String::from_utf8_lossy(&request[headers_end..]).to_string()
}

fn parse_content_length(headers: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(headers);
    for line in text.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            return value.trim().parse::<usize>().ok();
        }
    }
    None
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}
