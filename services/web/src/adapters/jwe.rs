//! services/web/src/adapters/jwe.rs
//!
//! This module contains the token adapter, which is the concrete implementation
//! of the `IdentityResolver` port from the `core` crate. Tokens are JWE compact
//! serializations issued by an external system and decrypted here with a JSON
//! Web Key that is re-read from disk on every call.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use josekit::{
    jwe::{
        self, JweDecrypter, A128KW, A192KW, A256KW, Dir, ECDH_ES, ECDH_ES_A128KW,
        ECDH_ES_A192KW, ECDH_ES_A256KW, RSA_OAEP, RSA_OAEP_256,
    },
    jwk::Jwk,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use visit_core::domain::Identity;
use visit_core::ports::{AuthError, IdentityResolver};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `IdentityResolver` port for JWE tokens.
#[derive(Clone, Debug)]
pub struct JweIdentityResolver {
    key_path: PathBuf,
}

impl JweIdentityResolver {
    /// Creates a new `JweIdentityResolver` reading its key from `key_path`.
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }
}

#[async_trait]
impl IdentityResolver for JweIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let key = load_key(&self.key_path).await?;
        let envelope = parse_envelope(token)?;
        let plaintext = decrypt(&envelope, &key)?;
        parse_claims(&plaintext)
    }
}

//=========================================================================================
// Key Loading
//=========================================================================================

/// Reads, parses and validates the JSON Web Key at `path`.
///
/// There is deliberately no cache: a key rotated by replacing the file is
/// picked up by the very next request.
pub async fn load_key(path: &Path) -> Result<Jwk, AuthError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| AuthError::KeyRead(format!("{}: {}", path.display(), e)))?;
    let jwk = Jwk::from_bytes(&data).map_err(|e| AuthError::KeyParse(e.to_string()))?;
    validate_key(&jwk)?;
    Ok(jwk)
}

/// Checks the key type is supported and that the private parameters needed
/// for decryption are present.
pub fn validate_key(jwk: &Jwk) -> Result<(), AuthError> {
    let required: &[&str] = match jwk.key_type() {
        "EC" => &["crv", "x", "y", "d"],
        "RSA" => &["n", "e", "d"],
        "oct" => &["k"],
        other => {
            return Err(AuthError::KeyInvalid(format!(
                "unsupported key type '{}'",
                other
            )))
        }
    };

    for name in required {
        match jwk.parameter(name) {
            Some(Value::String(s)) if !s.is_empty() => {}
            _ => {
                return Err(AuthError::KeyInvalid(format!(
                    "{} key is missing parameter '{}'",
                    jwk.key_type(),
                    name
                )))
            }
        }
    }
    Ok(())
}

//=========================================================================================
// Envelope Parsing and Decryption
//=========================================================================================

/// A structurally valid JWE compact serialization.
#[derive(Debug, Clone)]
pub struct Envelope {
    compact: String,
    /// Key management algorithm from the protected header.
    pub alg: String,
    /// Content encryption algorithm from the protected header.
    pub enc: String,
}

/// Checks the token is five base64url segments with a JSON protected header
/// naming both algorithms. Nothing is decrypted here.
pub fn parse_envelope(token: &str) -> Result<Envelope, AuthError> {
    let token = token.trim();
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 5 {
        return Err(AuthError::TokenFormat(format!(
            "expected 5 segments, found {}",
            segments.len()
        )));
    }

    for (index, segment) in segments.iter().enumerate() {
        URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
            AuthError::TokenFormat(format!("segment {} is not base64url: {}", index, e))
        })?;
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|e| AuthError::TokenFormat(e.to_string()))?;
    let header: Map<String, Value> = serde_json::from_slice(&header_bytes)
        .map_err(|e| AuthError::TokenFormat(format!("protected header: {}", e)))?;

    let field = |name: &str| -> Result<String, AuthError> {
        header
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AuthError::TokenFormat(format!("header has no '{}'", name)))
    };

    Ok(Envelope {
        alg: field("alg")?,
        enc: field("enc")?,
        compact: token.to_string(),
    })
}

/// Decrypts the envelope with `key`, choosing the key management algorithm
/// the token header asks for.
pub fn decrypt(envelope: &Envelope, key: &Jwk) -> Result<Vec<u8>, AuthError> {
    let decrypter = decrypter_for(&envelope.alg, key)?;
    let (payload, _header) = jwe::deserialize_compact(&envelope.compact, decrypter.as_ref())
        .map_err(|e| AuthError::Decrypt(e.to_string()))?;
    Ok(payload)
}

fn decrypter_for(alg: &str, key: &Jwk) -> Result<Box<dyn JweDecrypter>, AuthError> {
    let decrypter: Box<dyn JweDecrypter> = match alg {
        "ECDH-ES" => Box::new(ECDH_ES.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "ECDH-ES+A128KW" => Box::new(ECDH_ES_A128KW.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "ECDH-ES+A192KW" => Box::new(ECDH_ES_A192KW.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "ECDH-ES+A256KW" => Box::new(ECDH_ES_A256KW.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "RSA-OAEP" => Box::new(RSA_OAEP.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "RSA-OAEP-256" => Box::new(RSA_OAEP_256.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "A128KW" => Box::new(A128KW.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "A192KW" => Box::new(A192KW.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "A256KW" => Box::new(A256KW.decrypter_from_jwk(key).map_err(decrypt_error)?),
        "dir" => Box::new(Dir.decrypter_from_jwk(key).map_err(decrypt_error)?),
        other => {
            return Err(AuthError::Decrypt(format!(
                "unsupported key management algorithm '{}'",
                other
            )))
        }
    };
    Ok(decrypter)
}

fn decrypt_error(e: josekit::JoseError) -> AuthError {
    AuthError::Decrypt(e.to_string())
}

//=========================================================================================
// Claims
//=========================================================================================

const ID_CLAIM: &str = "Id";
const USER_NAME_CLAIM: &str = "UserName";

/// Parses decrypted claim bytes into an `Identity`.
///
/// Claim names match regardless of ASCII case, with an exact match taking
/// precedence. Missing or null claims fall back to zero values and unknown
/// claims are ignored; only a non-object payload or a wrongly typed claim is
/// an error.
pub fn parse_claims(plaintext: &[u8]) -> Result<Identity, AuthError> {
    let claims: Map<String, Value> =
        serde_json::from_slice(plaintext).map_err(|e| AuthError::ClaimParse(e.to_string()))?;

    let id = match claim(&claims, ID_CLAIM) {
        None | Some(Value::Null) => 0,
        Some(value) => value.as_i64().ok_or_else(|| {
            AuthError::ClaimParse(format!("claim '{}' is not an integer: {}", ID_CLAIM, value))
        })?,
    };
    let user_name = match claim(&claims, USER_NAME_CLAIM) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(name)) => name.clone(),
        Some(value) => {
            return Err(AuthError::ClaimParse(format!(
                "claim '{}' is not a string: {}",
                USER_NAME_CLAIM, value
            )))
        }
    };

    Ok(Identity::new(id, user_name))
}

fn claim<'a>(claims: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    claims.get(name).or_else(|| {
        claims
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}
