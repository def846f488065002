// Signet — Certificate Codec
//
// Transcodes an X.509 certificate to the canonical comparable form used by
// the matcher and the repository: the byte-exact PEM text, URL-safe base64
// encoded. Matching downstream is string equality over this form, so the PEM
// bytes are never normalized or re-wrapped once supplied.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use std::fmt;

use super::CredentialError;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

/// Certificate body that can be either PEM or DER encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateData {
    /// PEM-encoded certificate bytes, kept byte-exact.
    Pem(Vec<u8>),
    /// DER-encoded certificate bytes.
    Der(Vec<u8>),
}

/// An X.509 certificate presented for storage or resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    subject: String,
    data: CertificateData,
}

impl Certificate {
    /// Wrap PEM bytes, validating the armor markers.
    pub fn from_pem(subject: &str, pem: &[u8]) -> Result<Self, CredentialError> {
        let text = std::str::from_utf8(pem)
            .map_err(|_| CredentialError::Pem("PEM data is not UTF-8".to_string()))?;
        if !text.contains(PEM_BEGIN) || !text.contains(PEM_END) {
            return Err(CredentialError::Pem(
                "missing BEGIN/END CERTIFICATE markers".to_string(),
            ));
        }
        Ok(Self {
            subject: subject.to_string(),
            data: CertificateData::Pem(pem.to_vec()),
        })
    }

    /// Wrap raw DER bytes.
    pub fn from_der(subject: &str, der: &[u8]) -> Self {
        Self {
            subject: subject.to_string(),
            data: CertificateData::Der(der.to_vec()),
        }
    }

    /// Subject identity string, used in resolution error messages.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// PEM rendering. PEM input is returned as-is; DER input is base64
    /// encoded and wrapped in 64-column armor.
    pub fn to_pem(&self) -> Vec<u8> {
        match &self.data {
            CertificateData::Pem(pem) => pem.clone(),
            CertificateData::Der(der) => {
                let body = STANDARD.encode(der);
                let mut pem = Vec::new();
                pem.extend_from_slice(PEM_BEGIN.as_bytes());
                pem.push(b'\n');
                for chunk in body.as_bytes().chunks(64) {
                    pem.extend_from_slice(chunk);
                    pem.push(b'\n');
                }
                pem.extend_from_slice(PEM_END.as_bytes());
                pem.push(b'\n');
                pem
            }
        }
    }

    /// Canonical comparable form: URL-safe base64 of the PEM bytes.
    pub fn canonical_text(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_pem())
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "certificate for {}", self.subject)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PEM: &[u8] =
        b"-----BEGIN CERTIFICATE-----\nMIIBsampleBody\n-----END CERTIFICATE-----\n";

    #[test]
    fn test_from_pem_accepts_armored_input() {
        let cert = Certificate::from_pem("CN=alice", SAMPLE_PEM).unwrap();
        assert_eq!(cert.subject(), "CN=alice");
    }

    #[test]
    fn test_from_pem_rejects_unarmored_input() {
        let err = Certificate::from_pem("CN=alice", b"not a certificate").unwrap_err();
        assert!(matches!(err, CredentialError::Pem(_)));
    }

    #[test]
    fn test_pem_input_is_byte_exact() {
        let cert = Certificate::from_pem("CN=alice", SAMPLE_PEM).unwrap();
        assert_eq!(cert.to_pem(), SAMPLE_PEM.to_vec());
    }

    #[test]
    fn test_der_input_wraps_in_armor() {
        let cert = Certificate::from_der("CN=alice", &[0x30, 0x82, 0x01, 0x0a]);
        let pem = String::from_utf8(cert.to_pem()).unwrap();
        assert!(pem.starts_with(PEM_BEGIN));
        assert!(pem.trim_end().ends_with(PEM_END));
    }

    #[test]
    fn test_der_armor_wraps_at_64_columns() {
        let cert = Certificate::from_der("CN=alice", &[0xAB; 120]);
        let pem = String::from_utf8(cert.to_pem()).unwrap();
        for line in pem.lines() {
            assert!(line.len() <= 64, "armor lines must not exceed 64 columns");
        }
    }

    #[test]
    fn test_canonical_text_is_url_safe() {
        let cert = Certificate::from_pem("CN=alice", SAMPLE_PEM).unwrap();
        let canonical = cert.canonical_text();
        assert!(
            !canonical.contains('+') && !canonical.contains('/') && !canonical.contains('='),
            "canonical text must be URL-safe base64 without padding"
        );
    }

    #[test]
    fn test_canonical_text_is_stable_and_exact() {
        let a = Certificate::from_pem("CN=alice", SAMPLE_PEM).unwrap();
        let b = Certificate::from_pem("CN=other-subject", SAMPLE_PEM).unwrap();
        // Subject plays no part in the comparable form.
        assert_eq!(a.canonical_text(), b.canonical_text());

        let different =
            Certificate::from_pem("CN=alice", b"-----BEGIN CERTIFICATE-----\nX\n-----END CERTIFICATE-----\n")
                .unwrap();
        assert_ne!(a.canonical_text(), different.canonical_text());
    }
}
