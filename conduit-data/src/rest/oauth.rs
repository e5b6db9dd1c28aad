//! OAuth 1.0 request signing with HMAC-SHA1 (RFC 5849, consumer-only).

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use conduit_core::DataError;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;

/// RFC 3986 unreserved characters stay literal; everything else is encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_LENGTH: usize = 32;
const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";

/// Consumer credentials used to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct OAuthCredentials {
    consumer_key: String,
    consumer_secret: Option<String>,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "********"),
            )
            .finish()
    }
}

impl OAuthCredentials {
    /// Credentials for `consumer_key`, optionally with its secret.
    pub(crate) fn new(consumer_key: impl Into<String>, consumer_secret: Option<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret,
        }
    }

    /// Build the `Authorization` header for a request, using a fresh nonce
    /// and the current time.
    ///
    /// A key without a secret signs with an empty secret. The server will
    /// reject such a signature; it is logged, not refused.
    pub(crate) fn authorization<'p>(
        &self,
        method: &str,
        base_url: &str,
        params: impl IntoIterator<Item = (&'p str, &'p str)>,
    ) -> Result<String, DataError> {
        if self.consumer_secret.is_none() {
            log::warn!(
                "OAuth consumer key {} has no secret; the request signature will be invalid",
                self.consumer_key
            );
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        self.authorization_with(method, base_url, params, &nonce(), timestamp)
    }

    fn authorization_with<'p>(
        &self,
        method: &str,
        base_url: &str,
        params: impl IntoIterator<Item = (&'p str, &'p str)>,
        nonce: &str,
        timestamp: u64,
    ) -> Result<String, DataError> {
        let issued_at = timestamp.to_string();
        let protocol = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", issued_at.as_str()),
            ("oauth_version", VERSION),
        ];
        let mut encoded: Vec<(String, String)> = params.into_iter().map(encode_pair).collect();
        encoded.extend(protocol.iter().copied().map(encode_pair));
        let base = signature_base(method, base_url, encoded);
        let signature = sign(&base, self.consumer_secret.as_deref().unwrap_or_default())?;

        let mut fields: Vec<(&str, &str)> = protocol.to_vec();
        fields.push(("oauth_signature", signature.as_str()));
        fields.sort_unstable();
        let rendered = fields
            .iter()
            .map(|(key, value)| format!("{key}=\"{}\"", encode(value)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {rendered}"))
    }
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, UNRESERVED).to_string()
}

fn encode_pair((key, value): (&str, &str)) -> (String, String) {
    (encode(key), encode(value))
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// `METHOD&enc(base_url)&enc(sorted, encoded parameters)`.
fn signature_base(method: &str, base_url: &str, mut encoded: Vec<(String, String)>) -> String {
    encoded.sort_unstable();
    let normalised = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(base_url),
        encode(&normalised)
    )
}

fn sign(base: &str, consumer_secret: &str) -> Result<String, DataError> {
    // No token secret: the key ends with a bare `&`.
    let key = format!("{}&", encode(consumer_secret));
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|_| DataError::configuration("OAuth signing key was rejected"))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
