use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::CodecError;

/// Signature algorithm written into every token header.
pub const ALGORITHM: &str = "RS256";

/// Asymmetric key material for signing and verifying session credentials.
///
/// The public half is always present. The private half is optional so a
/// verify-only codec can be built from a bare public key.
#[derive(Clone)]
pub struct KeyPair {
    signing: Option<SigningKey<Sha256>>,
    verifying: VerifyingKey<Sha256>,
    fingerprint: String,
}

impl KeyPair {
    /// Load a PKCS#8 PEM private key and derive its public key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CodecError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CodecError::Configuration(format!("unreadable private key: {e}")))?;
        let public = private.to_public_key();
        let fingerprint = key_fingerprint(&public)?;

        Ok(Self {
            signing: Some(SigningKey::<Sha256>::new(private)),
            verifying: VerifyingKey::<Sha256>::new(public),
            fingerprint,
        })
    }

    /// Build a verify-only key pair from an SPKI PEM public key.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, CodecError> {
        let public = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| CodecError::Configuration(format!("unreadable public key: {e}")))?;
        let fingerprint = key_fingerprint(&public)?;

        Ok(Self {
            signing: None,
            verifying: VerifyingKey::<Sha256>::new(public),
            fingerprint,
        })
    }

    pub fn can_sign(&self) -> bool {
        self.signing.is_some()
    }

    /// Hex of the first 8 bytes of the SHA-256 of the public key DER.
    /// Safe to log.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &self.fingerprint)
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

fn key_fingerprint(public: &RsaPublicKey) -> Result<String, CodecError> {
    let der = public
        .to_public_key_der()
        .map_err(|e| CodecError::Configuration(format!("cannot encode public key: {e}")))?;
    let digest = Sha256::digest(der.as_bytes());
    Ok(hex::encode(&digest[..8]))
}

/// Encodes, signs and verifies compact `header.payload.signature` tokens.
///
/// Pure: the only state is the key pair handed in at construction.
#[derive(Debug, Clone, Default)]
pub struct CredentialCodec {
    keys: Option<KeyPair>,
}

impl CredentialCodec {
    pub fn new(keys: Option<KeyPair>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> Option<&KeyPair> {
        self.keys.as_ref()
    }

    pub fn can_sign(&self) -> bool {
        self.keys.as_ref().is_some_and(KeyPair::can_sign)
    }

    /// Serialize `claims` and sign `header.payload` with the private key.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, CodecError> {
        let signing = self
            .keys
            .as_ref()
            .and_then(|k| k.signing.as_ref())
            .ok_or_else(|| CodecError::Configuration("no private key loaded".into()))?;

        let header = serde_json::json!({ "alg": ALGORITHM, "typ": "JWT" });
        let header = encode_segment(&header)?;
        let payload = encode_segment(claims)?;

        let signing_input = format!("{header}.{payload}");
        let signature: Signature = signing.sign(signing_input.as_bytes());

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Verify `token` against the current time.
    pub fn verify(&self, token: &str) -> Result<Map<String, Value>, CodecError> {
        self.verify_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Verify `token` and deserialize its payload into `T`.
    pub fn verify_claims<T: DeserializeOwned>(&self, token: &str) -> Result<T, CodecError> {
        let claims = self.verify(token)?;
        serde_json::from_value(Value::Object(claims)).map_err(|e| CodecError::Claims(e.to_string()))
    }

    /// Verify `token` as if the current Unix time were `now`.
    ///
    /// Order matters: structure, then signature, then expiry. A tampered
    /// token never reaches payload decoding.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Map<String, Value>, CodecError> {
        let keys = self
            .keys
            .as_ref()
            .ok_or_else(|| CodecError::Configuration("no public key loaded".into()))?;

        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(CodecError::Format(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        };

        let header = decode_object(header)?;
        if header.get("alg").and_then(Value::as_str) != Some(ALGORITHM) {
            return Err(CodecError::Format("unsupported algorithm".into()));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CodecError::Signature)?;
        let signature =
            Signature::try_from(signature.as_slice()).map_err(|_| CodecError::Signature)?;

        let signing_input_len = token.len() - segments[2].len() - 1;
        keys.verifying
            .verify(token[..signing_input_len].as_bytes(), &signature)
            .map_err(|_| CodecError::Signature)?;

        let claims = decode_object(payload)?;
        if let Some(exp) = claims.get("exp") {
            let exp = exp
                .as_i64()
                .ok_or_else(|| CodecError::Claims("exp must be an integer".into()))?;
            if now >= exp {
                return Err(CodecError::Expired);
            }
        }

        Ok(claims)
    }
}

fn encode_segment<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    let json = serde_json::to_vec(value).map_err(|e| CodecError::Claims(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_object(segment: &str) -> Result<Map<String, Value>, CodecError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| CodecError::Format(format!("bad base64url segment: {e}")))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CodecError::Format("segment is not a JSON object".into())),
        Err(e) => Err(CodecError::Format(format!("bad JSON segment: {e}"))),
    }
}
