//! Helpers shared by the unit tests.

use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig, ServerConnection, StreamOwned};

/// In-memory writer for capturing log output.
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedOutput {
    type Writer = CapturedOutput;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A loopback HTTP server answering exactly one request with a canned response.
pub struct FakeServer {
    pub addr: SocketAddr,
    requests: mpsc::Receiver<String>,
}

impl FakeServer {
    pub fn respond(status_line: &str, body: &str) -> FakeServer {
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        FakeServer { addr, requests: rx }
    }

    pub fn url(&self, path: &str) -> url::Url {
        url::Url::parse(&format!("http://{}{}", self.addr, path)).unwrap()
    }

    /// The raw request head the server received.
    pub fn request(&self) -> String {
        self.requests.recv().unwrap()
    }
}

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_certs(name: &str) -> Vec<CertificateDer<'static>> {
    let mut reader = BufReader::new(fs::File::open(fixture(name)).unwrap());
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<_, _>>()
        .unwrap()
}

fn load_key(name: &str) -> PrivateKeyDer<'static> {
    let mut reader = BufReader::new(fs::File::open(fixture(name)).unwrap());
    rustls_pemfile::private_key(&mut reader).unwrap().unwrap()
}

/// DER encoding of the certificates in a PEM fixture.
pub fn der_certificates(name: &str) -> Vec<Vec<u8>> {
    load_certs(name).iter().map(|cert| cert.to_vec()).collect()
}

/// A loopback HTTPS server that requires a client certificate signed by the `ca.pem` fixture
/// and answers exactly one request with `200 OK` and `body`. Its own certificate is
/// self-signed.
pub struct TlsServer {
    pub addr: SocketAddr,
    client_certificates: mpsc::Receiver<Vec<Vec<u8>>>,
}

impl TlsServer {
    pub fn respond(body: &str) -> TlsServer {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut roots = RootCertStore::empty();
        for cert in load_certs("ca.pem") {
            roots.add(cert).unwrap();
        }
        let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .unwrap();
        let config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_client_cert_verifier(verifier)
            .with_single_cert(load_certs("server.pem"), load_key("server.key"))
            .unwrap();
        let config = Arc::new(config);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let conn = ServerConnection::new(config).unwrap();
            let mut tls = StreamOwned::new(conn, stream);

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = tls.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let presented = tls
                .conn
                .peer_certificates()
                .map(|certs| certs.iter().map(|cert| cert.to_vec()).collect())
                .unwrap_or_default();

            tls.write_all(response.as_bytes()).unwrap();
            tls.conn.send_close_notify();
            tls.flush().unwrap();
            let _ = tx.send(presented);
        });

        TlsServer {
            addr,
            client_certificates: rx,
        }
    }

    /// The certificate chain the client presented during the handshake, in DER.
    pub fn client_certificates(&self) -> Vec<Vec<u8>> {
        self.client_certificates.recv().unwrap()
    }
}

/// An address nothing listens on.
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// An HTTP client without TLS identity or proxies, for talking to [FakeServer].
pub fn plain_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
