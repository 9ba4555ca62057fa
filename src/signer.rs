//! HMAC-SHA1 request signing (RFC 5849).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use url::Url;

use crate::error::{SignError, SignResult};

type HmacSha1 = Hmac<Sha1>;

/// OAuth unreserved characters: `A-Z a-z 0-9 - . _ ~` (RFC 3986). Every other
/// byte is percent-encoded with uppercase hex digits.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a parameter name or value per RFC 3986.
pub fn oauth_encode(input: &str) -> String {
    percent_encode(input.as_bytes(), OAUTH_ENCODE_SET).to_string()
}

/// Normalized parameter string: entries encoded, sorted by encoded key then
/// encoded value in ascending byte order, joined as `key=value` pairs with
/// `&`. Duplicate keys are preserved as repeated entries.
pub fn normalize_params<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut encoded: Vec<(String, String)> = params
        .into_iter()
        .map(|(key, value)| (oauth_encode(key), oauth_encode(value)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signature base string per RFC 5849 section 3.4.1:
/// `METHOD&enc(base-url)&enc(parameter-string)`.
fn signature_base_string(method: &str, base_url: &str, parameter_string: &str) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        oauth_encode(base_url),
        oauth_encode(parameter_string)
    )
}

/// Compute the HMAC-SHA1 signature for a request.
///
/// `params` must already contain the `oauth_*` protocol parameters as well as
/// any query and form parameters; `oauth_signature` itself is never part of
/// the input. Query and fragment of `url` are ignored here, callers pass
/// query pairs through `params`. Nonce and timestamp are plain inputs, so the
/// result is deterministic.
pub fn sign(
    method: &str,
    url: &str,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> SignResult<String> {
    if method.trim().is_empty() {
        return Err(SignError::EmptyMethod);
    }
    if url.trim().is_empty() {
        return Err(SignError::EmptyUrl);
    }
    let mut base_url = Url::parse(url)?;
    base_url.set_query(None);
    base_url.set_fragment(None);

    let parameter_string =
        normalize_params(params.iter().map(|(key, value)| (key.as_str(), value.as_str())));
    let base = signature_base_string(method, base_url.as_str(), &parameter_string);
    let key = format!(
        "{}&{}",
        oauth_encode(consumer_secret),
        oauth_encode(token_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn encode_keeps_unreserved_characters() {
        let unreserved = "AZaz09-._~";
        assert_eq!(oauth_encode(unreserved), unreserved);
        // stable under re-encoding
        assert_eq!(oauth_encode(&oauth_encode(unreserved)), unreserved);
    }

    #[test]
    fn encode_uses_uppercase_hex() {
        assert_eq!(oauth_encode("ä /+"), "%C3%A4%20%2F%2B");
        assert_eq!(oauth_encode("少女"), "%E5%B0%91%E5%A5%B3");
    }

    #[test]
    fn normalize_sorts_by_key_then_value_and_keeps_duplicates() {
        let params = normalize_params(vec![("a", "2"), ("b", "x"), ("a", "1")]);
        assert_eq!(params, "a=1&a=2&b=x");
    }

    #[test]
    fn known_answer_fixture() {
        let params = owned(&[
            ("oauth_consumer_key", "ck"),
            ("oauth_nonce", "abc"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1000000000"),
            ("oauth_version", "1.0"),
        ]);
        let signature = sign("GET", "http://example.com/r", &params, "cs", "").unwrap();
        assert_eq!(signature, "OR2CBzH0i/LQRID0llHdxFuvDF4=");
    }

    #[test]
    fn sign_request_token_initiation() {
        // https://tools.ietf.org/html/rfc5849
        let params = owned(&[
            ("oauth_consumer_key", "dpf43f3p2l4k3l03"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "137131200"),
            ("oauth_nonce", "wIjqoS"),
            ("oauth_callback", "http://printer.example.com/ready"),
        ]);
        let signature = sign(
            "POST",
            "https://photos.example.net/initiate",
            &params,
            "kd94hf93k423kf44",
            "",
        )
        .unwrap();
        assert_eq!(signature, "74KNZJeDHnMBp0EMJ9ZHt/XKycU=");
    }

    #[test]
    fn sign_resource_request_with_token() {
        // https://tools.ietf.org/html/rfc5849
        let params = owned(&[
            ("file", "vacation.jpg"),
            ("size", "original"),
            ("oauth_consumer_key", "dpf43f3p2l4k3l03"),
            ("oauth_token", "nnch734d00sl2jdk"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "137131202"),
            ("oauth_nonce", "chapoH"),
        ]);
        let signature = sign(
            "GET",
            "http://photos.example.net/photos?file=vacation.jpg&size=original",
            &params,
            "kd94hf93k423kf44",
            "pfkkdhi9sl3r4s00",
        )
        .unwrap();
        assert_eq!(signature, "MdpQcU8iPSUjWoN/UDMsK2sui9I=");
    }

    #[test]
    fn sign_form_body_request() {
        // https://developer.twitter.com/ja/docs/basics/authentication/guides/creating-a-signature
        let params = owned(&[
            ("include_entities", "true"),
            (
                "status",
                "Hello Ladies + Gentlemen, a signed OAuth request!",
            ),
            ("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
            ("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            (
                "oauth_token",
                "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            ),
            ("oauth_version", "1.0"),
        ]);
        let signature = sign(
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &params,
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        )
        .unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn method_is_uppercased_in_base_string() {
        let params = owned(&[("oauth_nonce", "n")]);
        let lower = sign("get", "http://example.com/r", &params, "cs", "").unwrap();
        let upper = sign("GET", "http://example.com/r", &params, "cs", "").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn empty_method_is_rejected() {
        let result = sign("", "http://example.com/r", &[], "cs", "");
        assert!(matches!(result, Err(SignError::EmptyMethod)));
    }

    #[test]
    fn empty_url_is_rejected() {
        let result = sign("GET", "  ", &[], "cs", "");
        assert!(matches!(result, Err(SignError::EmptyUrl)));
    }

    #[test]
    fn unparsable_url_is_rejected() {
        let result = sign("GET", "not a url", &[], "cs", "");
        assert!(matches!(result, Err(SignError::InvalidUrl(_))));
    }
}
