// Session Codec
// Authenticated encryption of session records into opaque cookie tokens
// using AES-256-GCM. Decoding fails closed: any structural, cryptographic,
// or schema failure is reported as an invalid token, never a panic.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use argon2::Argon2;
use base64::{Engine as _, engine::general_purpose};
use serde::{Serialize, de::DeserializeOwned};

use super::error::AuthError;
use super::session::Session;

/// Token layout version, reserved so a future key rotation can try multiple
/// keys (or layouts) on decode without changing the public contract.
const TOKEN_VERSION: u8 = 1;

/// Nonce size for AES-GCM (96 bits)
const NONCE_LEN: usize = 12;

/// Salt for deriving a key from a passphrase secret
const KEY_SALT: &[u8] = b"authgate.session.v1";

/// Encodes session records to encrypted tokens and back
pub struct SessionCodec {
    cipher: Aes256Gcm,
}

impl SessionCodec {
    /// Create a codec from a raw 32-byte key
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Create a codec from the configured secret: either a base64-encoded
    /// 32-byte key, or a passphrase (min 32 chars) run through Argon2id.
    pub fn from_secret(secret: &str) -> Result<Self, AuthError> {
        if let Ok(raw) = general_purpose::STANDARD.decode(secret)
            && raw.len() == 32
        {
            let mut key = [0u8; 32];
            key.copy_from_slice(&raw);
            return Ok(Self::new(&key));
        }

        if secret.len() < 32 {
            return Err(AuthError::InvalidConfig {
                key: "session_secret".to_string(),
                reason: "must be a base64-encoded 32-byte key or at least 32 characters"
                    .to_string(),
            });
        }

        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(secret.as_bytes(), KEY_SALT, &mut key)
            .map_err(|e| AuthError::Crypto(format!("key derivation failed: {}", e)))?;

        Ok(Self::new(&key))
    }

    /// Encode a session record into an opaque cookie-safe token
    pub fn encode(&self, session: &Session) -> Result<String, AuthError> {
        self.seal(session)
    }

    /// Decode and verify a token back into a session record
    pub fn decode(&self, token: &str) -> Result<Session, AuthError> {
        let session: Session = self.open(token)?;

        // Schema validation fails closed like any other decode failure
        if session.user.id.is_empty() {
            return Err(AuthError::InvalidSessionToken);
        }

        Ok(session)
    }

    /// Encrypt any serializable value into a token:
    /// base64url(version || nonce || ciphertext)
    pub(crate) fn seal<T: Serialize>(&self, value: &T) -> Result<String, AuthError> {
        let plaintext = serde_json::to_vec(value)?;

        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from(nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| AuthError::Crypto(format!("encryption failed: {}", e)))?;

        let mut data = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        data.push(TOKEN_VERSION);
        data.extend_from_slice(&nonce_bytes);
        data.extend_from_slice(&ciphertext);

        Ok(general_purpose::URL_SAFE_NO_PAD.encode(data))
    }

    /// Decrypt a sealed token. Every failure mode maps to `InvalidSessionToken`.
    pub(crate) fn open<T: DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        let data = general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AuthError::InvalidSessionToken)?;

        if data.len() <= 1 + NONCE_LEN {
            return Err(AuthError::InvalidSessionToken);
        }

        if data[0] != TOKEN_VERSION {
            return Err(AuthError::InvalidSessionToken);
        }

        let nonce = Nonce::from_slice(&data[1..1 + NONCE_LEN]);

        let plaintext = self
            .cipher
            .decrypt(nonce, &data[1 + NONCE_LEN..])
            .map_err(|_| AuthError::InvalidSessionToken)?;

        serde_json::from_slice(&plaintext).map_err(|_| AuthError::InvalidSessionToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::{AuthProvider, SessionUser};

    fn create_test_codec() -> SessionCodec {
        let key: [u8; 32] = rand::random();
        SessionCodec::new(&key)
    }

    fn test_session() -> Session {
        Session::new(
            AuthProvider::GitHub,
            SessionUser {
                id: "github_12345".to_string(),
                name: "Test User".to_string(),
                email: Some("user@example.com".to_string()),
                avatar_url: Some("https://example.com/avatar.png".to_string()),
                username: Some("testuser".to_string()),
            },
        )
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = create_test_codec();
        let session = test_session();

        let token = codec.encode(&session).unwrap();
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded, session);
    }

    #[test]
    fn test_different_nonces() {
        let codec = create_test_codec();
        let session = test_session();

        let token1 = codec.encode(&session).unwrap();
        let token2 = codec.encode(&session).unwrap();

        // Same session must produce different tokens (fresh nonces)
        assert_ne!(token1, token2);
        assert_eq!(codec.decode(&token1).unwrap(), codec.decode(&token2).unwrap());
    }

    #[test]
    fn test_tampered_token_fails() {
        let codec = create_test_codec();
        let token = codec.encode(&test_session()).unwrap();

        // Flip one bit somewhere in the middle of the token
        let mut bytes = general_purpose::URL_SAFE_NO_PAD.decode(&token).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0x01;
        let tampered = general_purpose::URL_SAFE_NO_PAD.encode(bytes);

        assert!(matches!(
            codec.decode(&tampered),
            Err(AuthError::InvalidSessionToken)
        ));
    }

    #[test]
    fn test_truncated_and_garbage_tokens_fail() {
        let codec = create_test_codec();
        let token = codec.encode(&test_session()).unwrap();

        assert!(codec.decode(&token[..8]).is_err());
        assert!(codec.decode("").is_err());
        assert!(codec.decode("not!base64!!").is_err());
        assert!(codec.decode("AAAA").is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let codec = create_test_codec();
        let other = create_test_codec();

        let token = codec.encode(&test_session()).unwrap();
        assert!(matches!(
            other.decode(&token),
            Err(AuthError::InvalidSessionToken)
        ));
    }

    #[test]
    fn test_version_mismatch_fails() {
        let codec = create_test_codec();
        let token = codec.encode(&test_session()).unwrap();

        let mut bytes = general_purpose::URL_SAFE_NO_PAD.decode(&token).unwrap();
        bytes[0] = 99;
        let wrong_version = general_purpose::URL_SAFE_NO_PAD.encode(bytes);

        assert!(codec.decode(&wrong_version).is_err());
    }

    #[test]
    fn test_empty_user_id_fails_closed() {
        let codec = create_test_codec();
        let mut session = test_session();
        session.user.id = String::new();

        let token = codec.encode(&session).unwrap();
        assert!(matches!(
            codec.decode(&token),
            Err(AuthError::InvalidSessionToken)
        ));
    }

    #[test]
    fn test_from_secret_base64_key() {
        let key: [u8; 32] = rand::random();
        let secret = general_purpose::STANDARD.encode(key);

        let codec = SessionCodec::from_secret(&secret).unwrap();
        let reference = SessionCodec::new(&key);

        // Both constructions must use the same key material
        let token = codec.encode(&test_session()).unwrap();
        assert!(reference.decode(&token).is_ok());
    }

    #[test]
    fn test_from_secret_passphrase() {
        let codec = SessionCodec::from_secret("correct horse battery staple plus padding").unwrap();
        let token = codec.encode(&test_session()).unwrap();
        assert!(codec.decode(&token).is_ok());
    }

    #[test]
    fn test_from_secret_too_short() {
        assert!(matches!(
            SessionCodec::from_secret("short"),
            Err(AuthError::InvalidConfig { .. })
        ));
    }
}
