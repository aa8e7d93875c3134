//! Signing tokens for crop paths.
//!
//! Token = base64url(HMAC-SHA256(secret, encoded_path)). The token depends on
//! nothing but the path and the secret, so any edit to the path invalidates it.

use crate::error::CropError;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks signing tokens with a process-wide secret.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CropError> {
        let mac = HmacSha256::new_from_slice(secret.as_ref())
            .map_err(|e| CropError::Config(format!("Invalid signing secret: {}", e)))?;
        Ok(UrlSigner { mac })
    }

    /// Token for an encoded path (relative, no leading slash).
    pub fn token(&self, path: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(path.as_bytes());
        base64_url_encode(&mac.finalize().into_bytes())
    }

    /// Constant-time check of a token against the path it claims to sign.
    pub fn verify(&self, path: &str, token: &str) -> bool {
        let Ok(tag) = base64_url_decode(token) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(path.as_bytes());
        mac.verify_slice(&tag).is_ok()
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

fn base64_url_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn base64_url_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "photos/a-100x50-crop.jpg";

    #[test]
    fn test_token_is_deterministic() {
        let signer = UrlSigner::new("secret").unwrap();
        assert_eq!(signer.token(PATH), signer.token(PATH));
        assert!(signer.verify(PATH, &signer.token(PATH)));
    }

    #[test]
    fn test_token_depends_on_secret() {
        let a = UrlSigner::new("secret-a").unwrap();
        let b = UrlSigner::new("secret-b").unwrap();
        assert_ne!(a.token(PATH), b.token(PATH));
        assert!(!b.verify(PATH, &a.token(PATH)));
    }

    #[test]
    fn test_any_single_character_edit_is_rejected() {
        let signer = UrlSigner::new("secret").unwrap();
        let token = signer.token(PATH);

        for (idx, original) in PATH.char_indices() {
            let replacement = if original == 'z' { 'y' } else { 'z' };
            let mut tampered = PATH.to_string();
            tampered.replace_range(idx..idx + original.len_utf8(), &replacement.to_string());
            assert!(
                !signer.verify(&tampered, &token),
                "tampered path {} accepted",
                tampered
            );
        }
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let signer = UrlSigner::new("secret").unwrap();
        assert!(!signer.verify(PATH, ""));
        assert!(!signer.verify(PATH, "not base64 !!"));
        assert!(!signer.verify(PATH, "AAAA"));
    }
}
