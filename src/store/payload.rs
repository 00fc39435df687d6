//! Payload schema for stored chunk points

use crate::error::{Error, Result};
use qdrant_client::qdrant::{PointStruct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A point ready to be upserted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl ChunkPoint {
    /// Deterministic point id for a chunk of a document in a namespace
    pub fn point_id(namespace: &str, doc_id: &str, chunk_index: usize) -> Uuid {
        let key = format!("{}/{}/{}", namespace, doc_id, chunk_index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }

    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

/// Payload stored with each chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Owning namespace
    pub namespace: String,

    /// Document ID (stable per file)
    pub doc_id: String,

    /// Document path relative to the upload directory
    pub doc_path: String,

    /// Document title (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Headings hierarchy above this chunk
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<String>,

    /// Chunk index within the document
    pub chunk_index: i64,

    /// Chunk text handed to the LLM as context
    pub text: String,

    /// Hash of the chunk content
    pub chunk_hash: String,
}

impl ChunkPayload {
    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("namespace".to_string(), string_to_qdrant(&self.namespace));
        map.insert("doc_id".to_string(), string_to_qdrant(&self.doc_id));
        map.insert("doc_path".to_string(), string_to_qdrant(&self.doc_path));
        map.insert("chunk_index".to_string(), int_to_qdrant(self.chunk_index));
        map.insert("text".to_string(), string_to_qdrant(&self.text));
        map.insert("chunk_hash".to_string(), string_to_qdrant(&self.chunk_hash));

        if let Some(ref title) = self.title {
            map.insert("title".to_string(), string_to_qdrant(title));
        }

        if !self.headings.is_empty() {
            let values: Vec<QdrantValue> = self.headings.iter().map(|s| string_to_qdrant(s)).collect();
            map.insert(
                "headings".to_string(),
                QdrantValue {
                    kind: Some(qdrant_client::qdrant::value::Kind::ListValue(
                        qdrant_client::qdrant::ListValue { values },
                    )),
                },
            );
        }

        map
    }

    /// Rebuild a payload from a Qdrant point
    pub fn from_qdrant_payload(payload: HashMap<String, QdrantValue>) -> Result<Self> {
        let map: Map<String, Value> = payload
            .into_iter()
            .map(|(k, v)| (k, json_from_qdrant_value(v)))
            .collect();
        Self::try_from(map)
    }
}

impl TryFrom<Map<String, Value>> for ChunkPayload {
    type Error = Error;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| Error::Index(format!("Malformed chunk payload: {}", e)))
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::StringValue(s.to_string())),
    }
}

fn int_to_qdrant(i: i64) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::IntegerValue(i)),
    }
}

/// Convert Qdrant value to serde_json Value
pub(crate) fn json_from_qdrant_value(v: QdrantValue) -> Value {
    use qdrant_client::qdrant::value::Kind;

    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(
            list.values
                .into_iter()
                .map(json_from_qdrant_value)
                .collect(),
        ),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ChunkPayload {
        ChunkPayload {
            namespace: "Astro".to_string(),
            doc_id: "doc-456".to_string(),
            doc_path: "notes/france.txt".to_string(),
            title: Some("France".to_string()),
            headings: vec!["Europe".to_string(), "Capitals".to_string()],
            chunk_index: 3,
            text: "Paris is the capital of France.".to_string(),
            chunk_hash: "hash123".to_string(),
        }
    }

    #[test]
    fn test_qdrant_payload_conversion() {
        let original = payload();
        let restored = ChunkPayload::from_qdrant_payload(original.clone().to_qdrant_payload()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let mut p = payload();
        p.title = None;
        p.headings.clear();

        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("title").is_none());
        assert!(json.get("headings").is_none());

        let qdrant = p.to_qdrant_payload();
        assert!(!qdrant.contains_key("title"));
        assert!(!qdrant.contains_key("headings"));
    }

    #[test]
    fn test_malformed_payload_is_error() {
        let mut map = Map::new();
        map.insert("doc_id".to_string(), Value::String("x".to_string()));
        assert!(matches!(ChunkPayload::try_from(map), Err(Error::Index(_))));
    }

    #[test]
    fn test_point_ids_are_deterministic() {
        let a = ChunkPoint::point_id("Astro", "doc", 0);
        assert_eq!(a, ChunkPoint::point_id("Astro", "doc", 0));
        assert_ne!(a, ChunkPoint::point_id("Astro", "doc", 1));
        assert_ne!(a, ChunkPoint::point_id("Other", "doc", 0));
    }
}
