//! OAuth 1.0a request signing (HMAC-SHA1) for the X API user context.

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use url::{Position, Url};

use crate::core::config::XCredentials;
use crate::errors::PosterError;

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Per-request values that make a signature unique.
#[derive(Debug, Clone)]
pub struct OAuthNonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuthNonce {
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

fn protocol_params(credentials: &XCredentials, nonce: &OAuthNonce) -> Vec<(String, String)> {
    vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.nonce.clone()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), nonce.timestamp.to_string()),
        ("oauth_token".to_string(), credentials.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ]
}

/// Signature base string over the method, the URL without query, and every
/// parameter (query, form body and protocol) sorted by encoded name then value.
#[must_use]
pub fn signature_base_string(
    method: &str,
    url: &Url,
    form_params: &[(&str, &str)],
    protocol: &[(String, String)],
) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(form_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .chain(protocol.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    params.sort();

    let normalized = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&url[..Position::AfterPath]),
        encode(&normalized)
    )
}

/// Base64 HMAC-SHA1 of the base string, keyed by both secrets.
///
/// # Errors
///
/// Returns an error if the HMAC cannot be initialised.
pub fn sign(base_string: &str, credentials: &XCredentials) -> Result<String, PosterError> {
    let key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.access_token_secret)
    );
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| PosterError::PublishAuthFailure(format!("Failed to create HMAC: {e}")))?;
    mac.update(base_string.as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Value for the `Authorization` header of one request.
///
/// JSON bodies are not part of the signature; only form bodies would be.
///
/// # Errors
///
/// Returns an error if signing fails.
pub fn authorization_header(
    method: &str,
    url: &Url,
    credentials: &XCredentials,
    nonce: &OAuthNonce,
) -> Result<String, PosterError> {
    let mut protocol = protocol_params(credentials, nonce);
    let base_string = signature_base_string(method, url, &[], &protocol);
    protocol.push(("oauth_signature".to_string(), sign(&base_string, credentials)?));
    protocol.sort();

    let fields = protocol
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {fields}"))
}
