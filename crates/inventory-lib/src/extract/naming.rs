//! Name and version heuristics
//!
//! Owner-name stripping: a trailing `-<8-10 alphanumerics>` token (the
//! ReplicaSet pod-template hash, or a CronJob schedule timestamp), optionally
//! followed by a `-<5 chars>` pod suffix drawn from the Kubernetes random
//! suffix alphabet, is removed once; then a trailing `-<digits>` token is
//! removed once.

use regex::Regex;
use std::sync::OnceLock;

static HASH_SUFFIX: OnceLock<Regex> = OnceLock::new();
static ORDINAL_SUFFIX: OnceLock<Regex> = OnceLock::new();

fn hash_suffix() -> &'static Regex {
    HASH_SUFFIX.get_or_init(|| {
        Regex::new(r"-[a-zA-Z0-9]{8,10}(-[bcdfghjklmnpqrstvwxz2456789]{5})?$")
            .expect("hash suffix pattern is valid")
    })
}

fn ordinal_suffix() -> &'static Regex {
    ORDINAL_SUFFIX.get_or_init(|| Regex::new(r"-[0-9]+$").expect("ordinal suffix pattern is valid"))
}

/// Derive an application name from an owner reference name
pub fn strip_owner_suffix(owner_name: &str) -> String {
    let without_hash = hash_suffix().replace(owner_name, "");
    ordinal_suffix().replace(&without_hash, "").into_owned()
}

/// The tag of an image reference, unless it carries no version information
pub fn version_from_image(image: &str) -> Option<&str> {
    let (_, tag) = image.rsplit_once(':')?;

    // `registry:5000/app` has a port, not a tag
    if tag.is_empty() || tag.contains('/') {
        return None;
    }
    if tag.eq_ignore_ascii_case("latest") || is_hex_digest(tag) {
        return None;
    }
    Some(tag)
}

fn is_hex_digest(text: &str) -> bool {
    text.len() == 64 && text.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_owner_suffix_table() {
        let cases = [
            // ReplicaSet owned by a Deployment
            ("payment-api-7d9f8c6b59", "payment-api"),
            // Full pod name shape
            ("payment-api-7d9f8c6b59-x2kvq", "payment-api"),
            ("checkout-5c4b9d8f7", "checkout"),
            // Job created by a CronJob
            ("nightly-backup-28393020", "nightly-backup"),
            // Numeric suffix only
            ("kafka-broker-3", "kafka-broker"),
            // Nothing to strip
            ("redis", "redis"),
            ("order-service", "order-service"),
            ("api-v2", "api-v2"),
            // Token too short or too long to be a hash
            ("web-abc12", "web-abc12"),
            ("web-abcdefghijk", "web-abcdefghijk"),
            // A 5-char tail with vowels is not a pod suffix
            ("my-frontend1-cache", "my-frontend1-cache"),
        ];

        for (input, expected) in cases {
            assert_eq!(strip_owner_suffix(input), expected, "owner name {}", input);
        }
    }

    #[test]
    fn test_strip_owner_suffix_applies_each_step_once() {
        // each step removes at most one token
        assert_eq!(strip_owner_suffix("app-1-2"), "app-1");
        assert_eq!(strip_owner_suffix("app-12345678-9"), "app-12345678");
    }

    #[test]
    fn test_version_from_image() {
        let digest = "a".repeat(64);
        let digest_image = format!("registry/foo@sha256:{}", digest);
        let cases = [
            ("registry/foo:1.2.3", Some("1.2.3")),
            ("foo:v2.0.0-rc1", Some("v2.0.0-rc1")),
            ("registry/foo:latest", None),
            ("registry/foo:LATEST", None),
            (digest_image.as_str(), None),
            ("registry:5000/foo", None),
            ("registry:5000/foo:4.1", Some("4.1")),
            ("foo", None),
            ("foo:", None),
        ];

        for (image, expected) in cases {
            assert_eq!(version_from_image(image), expected, "image {}", image);
        }
    }

    #[test]
    fn test_hex_digest_detection() {
        assert!(is_hex_digest(&"0123456789abcdef".repeat(4)));
        assert!(!is_hex_digest(&"0123456789abcdef".repeat(3)));
        assert!(!is_hex_digest(&"g".repeat(64)));
    }
}
