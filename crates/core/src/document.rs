use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content identifier naming a resource on the IPFS network.
///
/// Opaque to this crate: no multibase/multihash validation is performed.
pub type Cid = String;

/// A JSON object retrieved for a CID.
///
/// Only objects are accepted; arrays, scalars and `null` are rejected at
/// construction so every stored document is a key-value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument(Map<String, Value>);

impl MetadataDocument {
    /// Decode a document from raw bytes. Fails unless the payload is a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Map<String, Value>>(bytes).map(Self)
    }

    /// Convert an already-parsed JSON value. Returns `None` for non-objects.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Canonical re-encoding. Need not byte-match the wire payload it came from.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// One persisted row: the CID and the document stored for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub cid: Cid,
    pub token: MetadataDocument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_slice_accepts_objects_only() {
        assert!(MetadataDocument::from_slice(br#"{"name":"cat"}"#).is_ok());
        assert!(MetadataDocument::from_slice(b"[1,2,3]").is_err());
        assert!(MetadataDocument::from_slice(b"\"text\"").is_err());
        assert!(MetadataDocument::from_slice(b"null").is_err());
        assert!(MetadataDocument::from_slice(b"{not json").is_err());
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(MetadataDocument::from_value(json!({"a": 1})).is_some());
        assert!(MetadataDocument::from_value(json!(42)).is_none());
    }

    #[test]
    fn reencoding_preserves_logical_content() {
        let wire = br#"{ "name" : "Token #1",  "attributes": [ {"trait_type": "eyes", "value": 3} ] }"#;
        let doc = MetadataDocument::from_slice(wire).unwrap();
        let bytes = doc.to_bytes().unwrap();
        assert_ne!(bytes.as_slice(), wire.as_slice());

        let again = MetadataDocument::from_slice(&bytes).unwrap();
        assert_eq!(doc, again);
        assert_eq!(again.get("name"), Some(&json!("Token #1")));
    }

    #[test]
    fn record_serializes_with_cid_and_token() {
        let record = MetadataRecord {
            cid: "bafy123".to_string(),
            token: MetadataDocument::from_value(json!({"k": "v"})).unwrap(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"cid": "bafy123", "token": {"k": "v"}}));
    }
}
