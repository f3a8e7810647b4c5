//! Single-domain certificate retrieval.
//!
//! [`CertificateFetcher::fetch`] makes one TCP connection and one TLS
//! handshake against `domain:port`, reads the leaf certificate and turns
//! whatever happened into a [`CertificateOutcome`]. It never retries and
//! never returns an error to the caller.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::ssl::{HandshakeError, SslConnector, SslMethod};
use openssl::x509::{X509Ref, X509VerifyResult, X509};

use crate::error::FetchError;
use crate::observer::{FetchObserver, LogObserver};
use crate::outcome::CertificateOutcome;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenSSL's text rendering of an ASN.1 time, e.g. `Jan 15 00:00:00 2030 GMT`.
const NOT_AFTER_FORMAT: &str = "%b %d %H:%M:%S %Y GMT";

/// Anything that can turn a domain into an outcome.
///
/// The batch runner is generic over this so it can be driven without network.
pub trait Fetch: Sync {
    fn fetch(&self, domain: &str) -> CertificateOutcome;
}

/// Fields read from a successfully verified leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCertificate {
    pub issued_to: Option<String>,
    pub expires_on: NaiveDate,
}

impl LeafCertificate {
    pub fn from_x509(cert: &X509Ref) -> Result<LeafCertificate, FetchError> {
        Ok(LeafCertificate {
            issued_to: common_name(cert),
            expires_on: parse_not_after(&cert.not_after().to_string())?,
        })
    }
}

pub struct CertificateFetcher {
    port: u16,
    timeout: Duration,
    connector: SslConnector,
    observer: Arc<dyn FetchObserver>,
}

impl fmt::Debug for CertificateFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateFetcher")
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CertificateFetcher {
    /// Fetcher on port 443 with a 10 second timeout, logging through `log`.
    pub fn new() -> Result<CertificateFetcher, ErrorStack> {
        Self::builder().build()
    }

    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Audits one domain. Exactly one outcome is returned and one observer
    /// event emitted per call.
    pub fn fetch(&self, domain: &str) -> CertificateOutcome {
        let outcome = match self.retrieve(domain) {
            Ok(leaf) => CertificateOutcome::valid(domain, leaf.issued_to, leaf.expires_on),
            Err(e) => CertificateOutcome::failed(domain, e),
        };
        self.observer.on_outcome(&outcome);
        outcome
    }

    fn retrieve(&self, domain: &str) -> Result<LeafCertificate, FetchError> {
        let deadline = Instant::now() + self.timeout;
        let stream = DeadlineStream::new(self.connect(domain, deadline)?, deadline);

        let tls = self
            .connector
            .connect(domain, stream)
            .map_err(|e| self.classify_handshake(e))?;

        let cert = tls
            .ssl()
            .peer_certificate()
            .ok_or_else(|| FetchError::parse("server presented no certificate"))?;

        LeafCertificate::from_x509(&cert)
    }

    fn connect(&self, domain: &str, deadline: Instant) -> Result<TcpStream, FetchError> {
        let address = format!("{}:{}", domain, self.port);
        let candidates: Vec<SocketAddr> = (domain, self.port)
            .to_socket_addrs()
            .map_err(|e| FetchError::network(&address, format!("failed to resolve host: {}", e)))?
            .collect();
        if candidates.is_empty() {
            return Err(FetchError::network(
                &address,
                "failed to resolve host: no addresses found",
            ));
        }

        let mut last_error: Option<io::Error> = None;
        for candidate in candidates {
            let Some(remaining) = time_left(deadline) else {
                break;
            };
            match TcpStream::connect_timeout(&candidate, remaining) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    log::debug!("connect to {} ({}) failed: {}", address, candidate, e);
                    last_error = Some(e);
                }
            }
        }

        let details = match last_error {
            Some(e) if !is_timeout(&e) => format!("connection failed: {}", e),
            _ => format!("connection timed out after {:?}", self.timeout),
        };
        Err(FetchError::network(address, details))
    }

    fn classify_handshake(&self, err: HandshakeError<DeadlineStream>) -> FetchError {
        match err {
            HandshakeError::SetupFailure(stack) => {
                FetchError::handshake(format!("could not set up TLS session: {}", stack))
            }
            HandshakeError::Failure(mid) => {
                let verify = mid.ssl().verify_result();
                if verify != X509VerifyResult::OK {
                    return FetchError::handshake(format!(
                        "certificate verify failed: {}",
                        verify.error_string()
                    ));
                }
                let error = mid.error();
                if error.io_error().map(is_timeout).unwrap_or(false) {
                    return self.handshake_timeout();
                }
                FetchError::handshake(error.to_string())
            }
            HandshakeError::WouldBlock(_) => self.handshake_timeout(),
        }
    }

    fn handshake_timeout(&self) -> FetchError {
        FetchError::handshake(format!("handshake timed out after {:?}", self.timeout))
    }
}

impl Fetch for CertificateFetcher {
    fn fetch(&self, domain: &str) -> CertificateOutcome {
        CertificateFetcher::fetch(self, domain)
    }
}

pub struct FetcherBuilder {
    port: u16,
    timeout: Duration,
    roots: Vec<X509>,
    ca_bundle: Option<PathBuf>,
    ca_dir: Option<PathBuf>,
    observer: Arc<dyn FetchObserver>,
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        let host = openssl_probe::probe();
        FetcherBuilder {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            roots: Vec::new(),
            ca_bundle: host.cert_file,
            ca_dir: host.cert_dir,
            observer: Arc::new(LogObserver),
        }
    }
}

impl FetcherBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bounds connection establishment and the handshake together.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Trusts `cert` in addition to the system roots.
    pub fn root_certificate(mut self, cert: X509) -> Self {
        self.roots.push(cert);
        self
    }

    /// Trusts every certificate of a PEM bundle in addition to the system roots.
    pub fn root_certificates_pem(mut self, pem: &[u8]) -> Result<Self, ErrorStack> {
        self.roots.extend(X509::stack_from_pem(pem)?);
        Ok(self)
    }

    /// Overrides where the system CA bundle and hashed CA directory live.
    /// Defaults to the locations detected on this host.
    pub fn system_roots(mut self, bundle: Option<PathBuf>, dir: Option<PathBuf>) -> Self {
        self.ca_bundle = bundle;
        self.ca_dir = dir;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn build(self) -> Result<CertificateFetcher, ErrorStack> {
        // SslConnector already enables peer verification, SNI, hostname
        // checks and the compiled-in default verify paths.
        let mut builder = SslConnector::builder(SslMethod::tls_client())?;

        // A vendored OpenSSL does not know where the distro keeps its roots.
        if let Some(bundle) = self.ca_bundle.as_deref() {
            if let Err(e) = builder.set_ca_file(bundle) {
                log::debug!("ignoring CA bundle {}: {}", bundle.display(), e);
            }
        }
        if let Some(dir) = self.ca_dir.as_deref() {
            if let Err(e) = builder.load_verify_locations(None, Some(dir)) {
                log::debug!("ignoring CA directory {}: {}", dir.display(), e);
            }
        }

        for root in self.roots {
            builder.cert_store_mut().add_cert(root)?;
        }

        Ok(CertificateFetcher {
            port: self.port,
            timeout: self.timeout,
            connector: builder.build(),
            observer: self.observer,
        })
    }
}

/// `TcpStream` whose every read and write is bounded by one shared deadline.
///
/// Socket timeouts alone restart on each call, so a peer trickling bytes
/// could hold the handshake open forever.
#[derive(Debug)]
pub struct DeadlineStream {
    inner: TcpStream,
    deadline: Instant,
}

impl DeadlineStream {
    pub fn new(inner: TcpStream, deadline: Instant) -> Self {
        DeadlineStream { inner, deadline }
    }

    fn arm(
        &self,
        set_timeout: fn(&TcpStream, Option<Duration>) -> io::Result<()>,
    ) -> io::Result<()> {
        let left = time_left(self.deadline)
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"))?;
        set_timeout(&self.inner, Some(left))
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.arm(TcpStream::set_read_timeout)?;
        self.inner.read(buf)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.arm(TcpStream::set_write_timeout)?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Subject common name of `cert`, if it has one.
pub fn common_name(cert: &X509Ref) -> Option<String> {
    cert.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|cn| cn.to_string())
}

/// Parses OpenSSL's `notAfter` rendering into a calendar date.
///
/// OpenSSL pads single digit days with a second space (`Jan  5 ...`), so
/// whitespace runs are collapsed before parsing.
pub fn parse_not_after(raw: &str) -> Result<NaiveDate, FetchError> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, NOT_AFTER_FORMAT)
        .map(|timestamp| timestamp.date())
        .map_err(|e| FetchError::parse(format!("unexpected expiry timestamp '{}': {}", raw, e)))
}

fn time_left(deadline: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
