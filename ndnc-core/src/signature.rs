//! Signing collaborator seam.
//!
//! A [`Signer`] takes a Data packet whose fields are already
//! assigned, computes SignatureInfo and SignatureValue over the
//! packet's signed region, and assigns them. The codec treats a
//! completed signature as an opaque precondition for producing a
//! verifiable wire encoding; it never verifies signatures itself.

use sha2::{Digest, Sha256};

use crate::packets::{Data, PacketError, SignatureInfo};

/// Signature algorithm identifiers used in SignatureType
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum SignatureType {
    DigestSha256 = 0,
    Sha256WithRsa = 1,
    Sha256WithEcdsa = 3,
    HmacWithSha256 = 4,
}

impl From<SignatureType> for u64 {
    fn from(t: SignatureType) -> u64 {
        t as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    #[error("unsupported signature type {0}")]
    Unsupported(u64),
    #[error(transparent)]
    Packet(#[from] PacketError),
}

/// Fills in SignatureInfo/SignatureValue for a packet.
pub trait Signer {
    fn sign(&self, data: &mut Data) -> Result<(), SignError>;
}

/// Integrity-only signer: SignatureValue is the SHA-256 digest of the
/// signed region (DigestSha256).
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestSha256Signer;

impl DigestSha256Signer {
    pub fn new() -> Self {
        Self
    }
}

impl Signer for DigestSha256Signer {
    fn sign(&self, data: &mut Data) -> Result<(), SignError> {
        data.set_signature_info(SignatureInfo::new(SignatureType::DigestSha256.into()));
        let digest = Sha256::digest(data.signed_region()?);
        data.set_signature_value(digest.to_vec());
        Ok(())
    }
}

/// Recompute the DigestSha256 value and compare it to the packet's
/// SignatureValue.
pub fn verify_digest(data: &Data) -> Result<bool, SignError> {
    let info = data
        .signature_info()
        .ok_or(PacketError::MissingField("SignatureInfo"))?;
    if info.signature_type != SignatureType::DigestSha256.into() {
        return Err(SignError::Unsupported(info.signature_type));
    }
    let value = data
        .signature_value()
        .ok_or(PacketError::MissingField("SignatureValue"))?;
    let digest = Sha256::digest(data.signed_region()?);
    Ok(digest.as_slice() == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;

    #[test]
    fn test_digest_signer_fills_signature() {
        let mut data = Data::new(Name::from_uri("/signed"));
        data.set_content(b"content".to_vec());
        DigestSha256Signer::new().sign(&mut data).unwrap();

        let info = data.signature_info().unwrap();
        assert_eq!(info.signature_type, u64::from(SignatureType::DigestSha256));
        assert_eq!(data.signature_value().unwrap().len(), 32);
        assert!(verify_digest(&data).unwrap());
    }

    #[test]
    fn test_digest_survives_encode_decode() {
        let mut data = Data::new(Name::from_uri("/signed"));
        data.set_content(b"content".to_vec());
        DigestSha256Signer::new().sign(&mut data).unwrap();
        let decoded = Data::wire_decode(&data.wire_encode().unwrap()).unwrap();
        assert!(verify_digest(&decoded).unwrap());
    }

    #[test]
    fn test_tampered_content_fails_verification() {
        let mut data = Data::new(Name::from_uri("/signed"));
        data.set_content(b"content".to_vec());
        DigestSha256Signer::new().sign(&mut data).unwrap();
        data.set_content(b"tampered".to_vec());
        assert!(!verify_digest(&data).unwrap());
    }

    #[test]
    fn test_verify_requires_digest_type() {
        let mut data = Data::new(Name::from_uri("/rsa"));
        data.set_signature_info(SignatureInfo::new(SignatureType::Sha256WithRsa.into()));
        data.set_signature_value(vec![0; 128]);
        assert_eq!(verify_digest(&data), Err(SignError::Unsupported(1)));
    }

    #[test]
    fn test_verify_surfaces_unknown_wide_type() {
        let mut data = Data::new(Name::from_uri("/exotic"));
        data.set_signature_info(SignatureInfo::new(256));
        data.set_signature_value(vec![0; 32]);
        assert_eq!(verify_digest(&data), Err(SignError::Unsupported(256)));
    }
}
