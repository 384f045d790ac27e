//! DID Document construction from a network payload.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::did::HpassDid;
use crate::error::ResolutionError;
use crate::types::{DIDDocument, MethodMetadata, VerificationMethod};

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
const DID_PAYLOAD: &str = "payload";
const DID_PUBLIC_KEY: &str = "publicKey";
const DID_ID: &str = "id";
const DID_TYPE: &str = "type";
const DID_PUBLIC_KEY_JWK: &str = "publicKeyJwk";
const DID_CONTROLLER: &str = "controller";
const DID_CREATED: &str = "created";
const DID_UPDATED: &str = "updated";

const KEY_TYPE_P256: &str = "P-256";
const KEY_TYPE_JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

const METADATA_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static METADATA_TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[012])-(0[1-9]|[12][0-9]|3[01])T([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9]Z$")
        .expect("metadata time pattern is a valid regex")
});

/// Builds the DID Document and method metadata from a raw node response
pub fn build_document(
    did: &HpassDid,
    body: &str,
) -> Result<(DIDDocument, MethodMetadata), ResolutionError> {
    let body: Value = serde_json::from_str(body)
        .map_err(|e| ResolutionError::DocumentInvalid(format!("response is not JSON: {}", e)))?;
    let payload = body
        .get(DID_PAYLOAD)
        .filter(|payload| payload.is_object())
        .ok_or_else(|| ResolutionError::DocumentInvalid(format!("'{}' not found", DID_PAYLOAD)))?;

    let document = DIDDocument {
        context: vec![DID_CONTEXT.to_string()],
        id: did.to_string(),
        verification_method: verification_methods(payload)?,
    };

    Ok((document, method_metadata(payload)))
}

fn verification_methods(payload: &Value) -> Result<Vec<VerificationMethod>, ResolutionError> {
    let keys = payload
        .get(DID_PUBLIC_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| mandatory_missing(DID_PUBLIC_KEY))?;

    keys.iter()
        .map(|key| -> Result<VerificationMethod, ResolutionError> {
            let id = key.get(DID_ID).and_then(Value::as_str).ok_or_else(|| mandatory_missing(DID_ID))?;
            let key_type = key
                .get(DID_TYPE)
                .and_then(Value::as_str)
                .ok_or_else(|| mandatory_missing(DID_TYPE))?;
            let controller = key
                .get(DID_CONTROLLER)
                .filter(|value| !value.is_null())
                .ok_or_else(|| mandatory_missing(DID_CONTROLLER))?;
            let public_key_jwk: Option<Map<String, Value>> =
                key.get(DID_PUBLIC_KEY_JWK).and_then(Value::as_object).cloned();

            let method_type = match key_type {
                KEY_TYPE_P256 => KEY_TYPE_JSON_WEB_KEY_2020,
                other => other,
            };

            Ok(VerificationMethod {
                id: id.to_string(),
                method_type: method_type.to_string(),
                controller: controller.clone(),
                public_key_jwk,
            })
        })
        .collect()
}

fn mandatory_missing(key: &str) -> ResolutionError {
    ResolutionError::DocumentInvalid(format!("mandatory key '{}' not found", key))
}

fn method_metadata(payload: &Value) -> MethodMetadata {
    MethodMetadata {
        created: metadata_time(payload, DID_CREATED),
        updated: metadata_time(payload, DID_UPDATED),
    }
}

/// Keeps `key` only when it is a UTC date-time without sub-second precision
fn metadata_time(payload: &Value, key: &str) -> Option<String> {
    let value = payload.get(key).and_then(Value::as_str);
    match value {
        Some(value) if is_metadata_time(value) => Some(value.to_string()),
        other => {
            warn!(key, value = ?other, "Date is invalid or incorrectly formatted, not added to metadata");
            None
        }
    }
}

fn is_metadata_time(value: &str) -> bool {
    METADATA_TIME_PATTERN.is_match(value)
        && NaiveDateTime::parse_from_str(value, METADATA_TIME_FORMAT).is_ok()
}
