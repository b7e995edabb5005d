//! Minimal HTTP/1.1 server for pipeline tests.
//!
//! Serves a single static body to GET requests, optionally refusing
//! requests that don't carry an HTTP Basic Authorization header, or
//! answering every request with a fixed error status.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthServerOptions {
    /// Respond 401 unless the request carries `Authorization: Basic ...`.
    pub require_basic_auth: bool,
    /// Answer every request with this status line and an empty body.
    pub fail_with: Option<&'static str>,
}

/// Starts a server in a background thread serving `body`. Returns the URL
/// of the served document. The server runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, AuthServerOptions::default())
}

/// Like `start` but allows customizing server behavior (auth required,
/// forced failure status).
pub fn start_with_options(body: Vec<u8>, opts: AuthServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, opts));
        }
    });
    format!("http://127.0.0.1:{}/thesis.pdf", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: AuthServerOptions) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };

    if let Some(status) = opts.fail_with {
        let _ = stream.write_all(
            format!("HTTP/1.1 {}\r\nContent-Length: 0\r\n\r\n", status).as_bytes(),
        );
        return;
    }
    if opts.require_basic_auth && !has_basic_auth(request) {
        let _ = stream.write_all(
            b"HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Basic realm=\"tdm\"\r\nContent-Length: 0\r\n\r\n",
        );
        return;
    }

    let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", body.len());
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
}

fn has_basic_auth(request: &str) -> bool {
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("authorization")
                && value.trim().starts_with("Basic ")
            {
                return true;
            }
        }
    }
    false
}
