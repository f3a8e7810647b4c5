//! Local TLS fixtures: a throwaway CA, leaf certificates and servers on
//! 127.0.0.1 so handshake tests never leave the machine.

#![allow(dead_code)]

use std::io::Write;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectAlternativeName,
    SubjectKeyIdentifier,
};
use openssl::x509::{X509Builder, X509NameBuilder, X509};

use certaudit::{CertificateOutcome, FetchObserver};

fn new_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

pub struct TestCa {
    pub cert: X509,
    key: PKey<Private>,
    next_serial: Mutex<u32>,
}

/// What to put in a leaf certificate.
pub struct LeafSpec<'a> {
    pub common_name: Option<&'a str>,
    pub dns_name: &'a str,
    pub not_before: &'a str,
    pub not_after: &'a str,
}

impl<'a> LeafSpec<'a> {
    pub fn localhost(common_name: &'a str, not_after: &'a str) -> Self {
        LeafSpec {
            common_name: Some(common_name),
            dns_name: "localhost",
            not_before: "20200101000000Z",
            not_after,
        }
    }
}

impl TestCa {
    pub fn new() -> TestCa {
        let key = new_key();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COMMONNAME, "certaudit test CA")
            .unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::from_str("20200101000000Z").unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_str("20401231000000Z").unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let skid = SubjectKeyIdentifier::new()
            .build(&builder.x509v3_context(None, None))
            .unwrap();
        builder.append_extension(skid).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        TestCa {
            cert: builder.build(),
            key,
            next_serial: Mutex::new(2),
        }
    }

    pub fn pem(&self) -> Vec<u8> {
        self.cert.to_pem().unwrap()
    }

    pub fn issue(&self, spec: &LeafSpec<'_>) -> (X509, PKey<Private>) {
        let key = new_key();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "certaudit tests")
            .unwrap();
        if let Some(cn) = spec.common_name {
            name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
        }
        let name = name.build();

        let serial = {
            let mut next = self.next_serial.lock().unwrap();
            *next += 1;
            *next
        };

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(self.cert.subject_name()).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::from_str(spec.not_before).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_str(spec.not_after).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        let san = SubjectAlternativeName::new()
            .dns(spec.dns_name)
            .build(&builder.x509v3_context(Some(&*self.cert), None))
            .unwrap();
        builder.append_extension(san).unwrap();
        let akid = AuthorityKeyIdentifier::new()
            .keyid(false)
            .build(&builder.x509v3_context(Some(&*self.cert), None))
            .unwrap();
        builder.append_extension(akid).unwrap();
        builder.sign(&self.key, MessageDigest::sha256()).unwrap();

        (builder.build(), key)
    }
}

/// Serves TLS with `cert` for the next `connections` clients. Returns the port.
pub fn tls_server(cert: X509, key: PKey<Private>, connections: usize) -> u16 {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.check_private_key().unwrap();
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().take(connections) {
            if let Ok(stream) = stream {
                // Handshake failures are the point of several tests.
                let _ = acceptor.accept(stream);
            }
        }
    });
    port
}

/// Accepts TCP connections and never sends a byte.
pub fn silent_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    port
}

/// Starts a TLS record header announcing 16 KiB, then dribbles one byte
/// every 300 ms so no single socket read ever times out.
pub fn trickle_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            thread::spawn(move || {
                if stream.write_all(&[0x16, 0x03, 0x03, 0x40, 0x00]).is_err() {
                    return;
                }
                for _ in 0..100 {
                    thread::sleep(Duration::from_millis(300));
                    if stream.write_all(&[0x00]).is_err() {
                        return;
                    }
                }
            });
        }
    });
    port
}

/// A port on 127.0.0.1 with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Records every outcome it is shown.
#[derive(Default)]
pub struct RecordingObserver {
    pub outcomes: Mutex<Vec<CertificateOutcome>>,
    pub batches: Mutex<usize>,
}

impl RecordingObserver {
    pub fn shared() -> Arc<RecordingObserver> {
        Arc::new(RecordingObserver::default())
    }
}

impl FetchObserver for RecordingObserver {
    fn on_outcome(&self, outcome: &CertificateOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }

    fn on_batch_complete(&self, _outcomes: &[CertificateOutcome]) {
        *self.batches.lock().unwrap() += 1;
    }
}
