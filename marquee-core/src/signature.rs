//! SHA-512 request/response hashes in the gateway's pipe-delimited format.
//!
//! Outbound (request) sequence:
//! `key|txnid|amount|productinfo|firstname|email|udf1..udf10|salt`
//!
//! Inbound (response) sequence, reversed with the salt first:
//! `salt|status|udf10..udf1|email|firstname|productinfo|amount|txnid|key`
//!
//! The user-defined fields are never populated, so both sequences carry ten
//! empty fields.

use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha512};

/// Number of unused user-defined fields in both hash sequences.
pub const EMPTY_UDF_FIELDS: usize = 10;

/// The transaction fields covered by both hash sequences.
#[derive(Debug, Clone, Copy)]
pub struct HashFields<'a> {
    pub key: &'a str,
    pub txnid: &'a str,
    pub amount: &'a str,
    pub product_info: &'a str,
    pub first_name: &'a str,
    pub email: &'a str,
}

pub fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

pub fn request_hash_sequence(fields: &HashFields<'_>, salt: &str) -> String {
    let mut parts: Vec<&str> = vec![
        fields.key,
        fields.txnid,
        fields.amount,
        fields.product_info,
        fields.first_name,
        fields.email,
    ];
    parts.extend(std::iter::repeat("").take(EMPTY_UDF_FIELDS));
    parts.push(salt);
    parts.join("|")
}

pub fn response_hash_sequence(fields: &HashFields<'_>, status: &str, salt: &str) -> String {
    let mut parts: Vec<&str> = vec![salt, status];
    parts.extend(std::iter::repeat("").take(EMPTY_UDF_FIELDS));
    parts.extend([
        fields.email,
        fields.first_name,
        fields.product_info,
        fields.amount,
        fields.txnid,
        fields.key,
    ]);
    parts.join("|")
}

/// Hash sent with the outbound payment request.
pub fn request_hash(fields: &HashFields<'_>, salt: &str) -> String {
    sha512_hex(&request_hash_sequence(fields, salt))
}

/// Hash the gateway is expected to post back with its callback.
pub fn response_hash(fields: &HashFields<'_>, status: &str, salt: &str) -> String {
    sha512_hex(&response_hash_sequence(fields, status, salt))
}

/// Case-insensitive, constant-time comparison of two hex digests.
pub fn hashes_match(expected: &str, supplied: &str) -> bool {
    let expected = expected.trim().to_ascii_lowercase();
    let supplied = supplied.trim().to_ascii_lowercase();
    constant_time_eq(expected.as_bytes(), supplied.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "merchantK1";
    const SALT: &str = "S3cr3t";

    fn fields() -> HashFields<'static> {
        HashFields {
            key: KEY,
            txnid: "TXN12345678",
            amount: "250.00",
            product_info: "MovieTickets",
            first_name: "Asha",
            email: "asha@example.com",
        }
    }

    #[test]
    fn test_request_hash_golden_vector() {
        assert_eq!(
            request_hash_sequence(&fields(), SALT),
            "merchantK1|TXN12345678|250.00|MovieTickets|Asha|asha@example.com|||||||||||S3cr3t"
        );
        assert_eq!(
            request_hash(&fields(), SALT),
            "75cb4b3bc006ba53ec311ad6e81c3a307cbf87f9bc1589f1f70a1d6c576feb32\
             9a716cdd2f768e202727dcfc703624dd8ac2a4a7b779ce4fd0fd81e3d80d7146"
        );
    }

    #[test]
    fn test_response_hash_golden_vector() {
        assert_eq!(
            response_hash_sequence(&fields(), "success", SALT),
            "S3cr3t|success|||||||||||asha@example.com|Asha|MovieTickets|250.00|TXN12345678|merchantK1"
        );
        assert_eq!(
            response_hash(&fields(), "success", SALT),
            "29f52173fccbd49fbe52ec1db754d38e5ea0f724e603211ed7d3513cbe570b0e\
             90a7fbf338c1edf1726014adbbb48581a00713ca780fb33c4170e3a5b497ec9f"
        );
    }

    #[test]
    fn test_request_hash_is_not_a_valid_response_hash() {
        let outbound = request_hash(&fields(), SALT);
        for status in ["success", "failure", ""] {
            assert!(!hashes_match(&response_hash(&fields(), status, SALT), &outbound));
        }
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = response_hash(&fields(), "success", SALT);

        let mut tampered = fields();
        tampered.amount = "1.00";
        assert_ne!(response_hash(&tampered, "success", SALT), base);

        assert_ne!(response_hash(&fields(), "failure", SALT), base);
        assert_ne!(response_hash(&fields(), "success", "other-salt"), base);
    }

    #[test]
    fn test_hashes_match_ignores_case() {
        let digest = request_hash(&fields(), SALT);
        assert!(hashes_match(&digest, &digest.to_ascii_uppercase()));
        assert!(!hashes_match(&digest, &digest[..64]));
        assert!(!hashes_match(&digest, ""));
    }
}
