// tests/common/mod.rs

//! Shared test utilities for integration tests.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread;

/// Serve one HTTP response with chunked transfer encoding.
///
/// Chunked responses carry no Content-Length header, which the transfer
/// unit treats as a protocol error. wiremock always sets the header for
/// fixed bodies, so this minimal server fills the gap.
pub fn spawn_chunked_server(body: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);

            let header = format!(
                "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n{:x}\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(body);
            let _ = stream.write_all(b"\r\n0\r\n\r\n");
        }
    });

    addr
}
