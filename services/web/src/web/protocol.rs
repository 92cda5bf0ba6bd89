//! services/web/src/web/protocol.rs
//!
//! Defines the JSON document format exchanged between the browser and the server.

use serde::{de::Error as _, Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use visit_core::domain::Document;

/// A document as the browser sends it to `/save` and receives it in the page.
///
/// `UserId` and `UserName` may be supplied by the client but are always
/// replaced with the token identity. Field names match regardless of ASCII
/// case; anything else at the top level is rejected.
#[derive(Serialize, Deserialize, Debug, Default, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentBody {
    #[serde(rename = "UserId")]
    pub user_id: i64,
    #[serde(rename = "UserName")]
    pub user_name: String,
    /// Selects which processor interprets `Data`.
    #[serde(rename = "Version")]
    pub version: u64,
    /// Arbitrary data produced by the page scripts, `null` when absent.
    #[serde(rename = "Data")]
    #[schema(value_type = Object, nullable)]
    pub data: Option<Map<String, Value>>,
}

impl DocumentBody {
    pub fn from_domain(doc: &Document) -> Self {
        Self {
            user_id: doc.owner_id,
            user_name: doc.owner_name.clone(),
            version: doc.version,
            data: doc.payload.clone(),
        }
    }

    pub fn into_domain(self) -> Document {
        Document {
            owner_id: self.user_id,
            owner_name: self.user_name,
            version: self.version,
            payload: self.data,
        }
    }

    /// Decodes a request body. Only a JSON object is accepted at the top level.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(document_fields(bytes)?))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Top-level document field names in their canonical spelling.
pub const DOCUMENT_FIELDS: [&str; 4] = ["UserId", "UserName", "Version", "Data"];

/// Parses a JSON object and renames every top-level key that equals a
/// document field up to ASCII case to the canonical spelling.
///
/// When both spellings are present the exact one wins. Keys that match no
/// field are kept as they are, so callers still see them.
pub fn document_fields(bytes: &[u8]) -> Result<Map<String, Value>, serde_json::Error> {
    let fields = match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(fields) => fields,
        _ => return Err(serde_json::Error::custom("document must be a JSON object")),
    };

    let mut folded = Map::with_capacity(fields.len());
    for (key, value) in fields {
        match DOCUMENT_FIELDS.iter().find(|name| name.eq_ignore_ascii_case(&key)) {
            Some(name) if *name == key => {
                folded.insert(key, value);
            }
            Some(name) => {
                folded.entry(name.to_string()).or_insert(value);
            }
            None => {
                folded.insert(key, value);
            }
        }
    }
    Ok(folded)
}
