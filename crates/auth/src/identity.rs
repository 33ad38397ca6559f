//! Identity resolution: raw caller credential → canonical organization.
//!
//! The hosting runtime hands every invocation an opaque credential blob. The
//! production resolver expects a PEM certificate somewhere inside it (callers
//! commonly wrap it in a serialized identity envelope) and reads the issuer's
//! organization attribute.

use std::sync::Arc;

use rustls_pki_types::CertificateDer;
use rustls_pki_types::pem::PemObject;
use thiserror::Error;

use carchain_core::OrgId;
use carchain_observability::Logger;

use crate::organization::canonical_organization;

const BEGIN_MARKER: &[u8] = b"-----BEGIN CERTIFICATE-----";
const END_MARKER: &[u8] = b"-----END CERTIFICATE-----";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no certificate boundary markers found in credential")]
    MissingCertificate,

    #[error("failed to decode certificate: {0}")]
    PemDecode(String),

    #[error("failed to parse certificate: {0}")]
    CertificateParse(String),

    #[error("certificate issuer has no organization attribute")]
    MissingOrganization,

    #[error("issuer organization '{0}' has an empty canonical form")]
    EmptyOrganization(String),

    #[error("unreadable credential: {0}")]
    InvalidCredential(String),
}

/// Capability that maps a raw credential to the caller's organization.
///
/// Failure must never be papered over with a default organization; callers
/// treat any error as "unauthenticated".
pub trait IdentityResolver: Send + Sync {
    fn resolve_organization(&self, credential: &[u8]) -> Result<OrgId, IdentityError>;
}

impl<R> IdentityResolver for Arc<R>
where
    R: IdentityResolver + ?Sized,
{
    fn resolve_organization(&self, credential: &[u8]) -> Result<OrgId, IdentityError> {
        (**self).resolve_organization(credential)
    }
}

impl<R> IdentityResolver for &R
where
    R: IdentityResolver + ?Sized,
{
    fn resolve_organization(&self, credential: &[u8]) -> Result<OrgId, IdentityError> {
        (**self).resolve_organization(credential)
    }
}

/// Resolves the issuer organization of an embedded X.509 certificate.
#[derive(Debug, Clone, Default)]
pub struct X509IdentityResolver {
    logger: Logger,
}

impl X509IdentityResolver {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl IdentityResolver for X509IdentityResolver {
    fn resolve_organization(&self, credential: &[u8]) -> Result<OrgId, IdentityError> {
        self.logger.scope(|| {
            let result = issuer_organization(credential).and_then(|raw| {
                let org = canonical_organization(&raw)?;
                tracing::debug!(issuer_org = %raw, org = %org, "organization resolved");
                Ok(org)
            });
            if let Err(err) = &result {
                tracing::warn!(error = %err, "organization resolution failed");
            }
            result
        })
    }
}

/// Slice from the first begin marker through the last end marker.
fn locate_certificate(credential: &[u8]) -> Result<&[u8], IdentityError> {
    let start = find(credential, BEGIN_MARKER).ok_or(IdentityError::MissingCertificate)?;
    let tail = &credential[start..];
    let end = rfind(tail, END_MARKER).ok_or(IdentityError::MissingCertificate)?;
    Ok(&tail[..end + END_MARKER.len()])
}

fn issuer_organization(credential: &[u8]) -> Result<String, IdentityError> {
    let pem = locate_certificate(credential)?;
    let der = CertificateDer::from_pem_slice(pem)
        .map_err(|e| IdentityError::PemDecode(e.to_string()))?;
    let (_, cert) = x509_parser::parse_x509_certificate(der.as_ref())
        .map_err(|e| IdentityError::CertificateParse(e.to_string()))?;

    let attr = cert
        .issuer()
        .iter_organization()
        .next()
        .ok_or(IdentityError::MissingOrganization)?;
    let org = attr
        .as_str()
        .map_err(|e| IdentityError::CertificateParse(format!("organization attribute: {e}")))?;
    Ok(org.to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Treats the credential bytes as the issuer organization itself.
///
/// Lets authorization be exercised without minting certificates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticIdentityResolver;

impl IdentityResolver for SyntheticIdentityResolver {
    fn resolve_organization(&self, credential: &[u8]) -> Result<OrgId, IdentityError> {
        let raw = std::str::from_utf8(credential)
            .map_err(|e| IdentityError::InvalidCredential(e.to_string()))?;
        if raw.is_empty() {
            return Err(IdentityError::MissingOrganization);
        }
        canonical_organization(raw)
    }
}
