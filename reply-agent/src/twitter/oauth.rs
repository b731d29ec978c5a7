//! OAuth 1.0a request signing for the Twitter API.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = Hmac<Sha1>;

/// User-context credentials for OAuth 1.0a
#[derive(Clone)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl TwitterCredentials {
    pub fn new(
        consumer_key: String,
        consumer_secret: String,
        access_token: String,
        access_token_secret: String,
    ) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
        }
    }
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Percent-encode per RFC 3986, as OAuth 1.0a requires
pub fn percent_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

/// Generate an OAuth 1.0a Authorization header.
///
/// `params` are the query (or form) parameters of the request; they must be
/// part of the signature base string. JSON bodies are not signed.
pub fn generate_oauth_header(
    method: &str,
    url: &str,
    credentials: &TwitterCredentials,
    params: Option<&[(&str, &str)]>,
) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string();

    let nonce: String = (0..32)
        .map(|_| format!("{:x}", rand::random::<u8>()))
        .collect();

    authorization_header(method, url, credentials, params.unwrap_or(&[]), &nonce, &timestamp)
}

fn authorization_header(
    method: &str,
    url: &str,
    credentials: &TwitterCredentials,
    params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let signature = sign(method, url, credentials, params, nonce, timestamp);

    let auth_params = [
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature", signature.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let auth_string: String = auth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", auth_string)
}

/// HMAC-SHA1 signature over the normalized request.
fn sign(
    method: &str,
    url: &str,
    credentials: &TwitterCredentials,
    params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let mut all_params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), credentials.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];
    all_params.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    // Sort on the encoded pairs
    let mut encoded: Vec<(String, String)> = all_params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    );

    let signing_key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.access_token_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(signing_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs_credentials() -> TwitterCredentials {
        TwitterCredentials::new(
            "xvz1evFS4wEEPTGEFPHBog".to_string(),
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        )
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello"), "hello");
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("a=b&c=d"), "a%3Db%26c%3Dd");
        assert_eq!(percent_encode("(from:a OR from:b)"), "%28from%3Aa%20OR%20from%3Ab%29");
    }

    #[test]
    fn test_signature_matches_twitter_docs_example() {
        let signature = sign(
            "post",
            "https://api.twitter.com/1.1/statuses/update.json",
            &docs_credentials(),
            &[
                ("include_entities", "true"),
                ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
            ],
            "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            "1318622958",
        );
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_header_contains_all_oauth_fields() {
        let header = generate_oauth_header(
            "GET",
            "https://api.twitter.com/2/users/me",
            &docs_credentials(),
            None,
        );
        assert!(header.starts_with("OAuth "));
        for field in [
            "oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\"",
            "oauth_nonce=",
            "oauth_signature=",
            "oauth_signature_method=\"HMAC-SHA1\"",
            "oauth_timestamp=",
            "oauth_version=\"1.0\"",
        ] {
            assert!(header.contains(field), "missing {} in {}", field, header);
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", docs_credentials());
        assert!(!rendered.contains("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"));
        assert!(rendered.contains("<redacted>"));
    }
}
