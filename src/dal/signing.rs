//! AWS Signature V4 for S3 requests.

use std::collections::BTreeMap;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

type HmacSha256 = Hmac<Sha256>;

pub const AWS_ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const S3_SERVICE: &str = "s3";

const AMZ_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]Z");
const DATE_STAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]");

const KEY_SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub struct SigningParams<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
    pub timestamp: OffsetDateTime,
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

pub fn format_amz_date(ts: OffsetDateTime) -> String {
    // Formatting a UTC timestamp with a fixed numeric layout cannot fail.
    ts.format(AMZ_DATE_FORMAT).unwrap_or_default()
}

fn format_date_stamp(ts: OffsetDateTime) -> String {
    ts.format(DATE_STAMP_FORMAT).unwrap_or_default()
}

pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT_SET).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds the `Authorization` header value. `path` must already be
/// URI-encoded, and `headers` must contain every header to be signed,
/// including `host`, `x-amz-date` and `x-amz-content-sha256`.
pub fn authorization(
    params: &SigningParams<'_>,
    method: &str,
    path: &str,
    headers: &[(&str, String)],
    payload_hash: &str,
) -> String {
    let mut canonical: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        canonical.insert(name.to_lowercase(), value);
    }
    let canonical_headers: String = canonical
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();
    let signed_headers = canonical.keys().cloned().collect::<Vec<_>>().join(";");

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method, path, "", canonical_headers, signed_headers, payload_hash
    );

    let date_stamp = format_date_stamp(params.timestamp);
    let scope = format!("{}/{}/{}/aws4_request", date_stamp, params.region, S3_SERVICE);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        AWS_ALGORITHM,
        format_amz_date(params.timestamp),
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(params.secret_access_key, &date_stamp, params.region, S3_SERVICE);
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        AWS_ALGORITHM, params.access_key_id, scope, signed_headers, signature
    )
}
