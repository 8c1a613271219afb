use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Arbitrary per-document key/value payload carried alongside the content.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A unit of indexed text, keyed by a caller-supplied id.
///
/// The id is opaque to the service: it is stored in the vector store payload
/// verbatim and returned by search unchanged. The store itself is keyed by
/// [`Document::point_id`], a deterministic UUID derived from the id, so
/// re-indexing the same id always overwrites the same point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Derives the vector store point id for this document.
    pub fn point_id(&self) -> Uuid {
        derive_point_id(&self.id)
    }
}

/// Maps an arbitrary string id onto a UUID point id.
///
/// Ids that already parse as UUIDs pass through. 24-hex-digit ids (the
/// ObjectId shape produced by document databases) hash with UUID v5 in the
/// OID namespace; everything else hashes in the DNS namespace. The mapping
/// is stable, so the same id always addresses the same point.
pub fn derive_point_id(id: &str) -> Uuid {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return uuid;
    }
    if is_object_id(id) {
        return Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes());
    }
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, id.as_bytes())
}

fn is_object_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A single search hit: the stored document plus its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_pass_through_unchanged() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(derive_point_id(id), Uuid::parse_str(id).unwrap());
    }

    #[test]
    fn plain_string_ids_derive_a_stable_uuid() {
        let a = derive_point_id("doc1");
        let b = derive_point_id("doc1");
        assert_eq!(a, b);
        assert_ne!(a, derive_point_id("doc2"));
    }

    #[test]
    fn object_id_shaped_ids_use_a_distinct_namespace() {
        let oid = "65b2f8a19c3df0a1b4e2c7d9";
        let derived = derive_point_id(oid);
        assert_eq!(derived, Uuid::new_v5(&Uuid::NAMESPACE_OID, oid.as_bytes()));
        assert_ne!(derived, Uuid::new_v5(&Uuid::NAMESPACE_DNS, oid.as_bytes()));
    }

    #[test]
    fn non_hex_24_char_ids_are_not_treated_as_object_ids() {
        let id = "zzzzzzzzzzzzzzzzzzzzzzzz";
        assert_eq!(
            derive_point_id(id),
            Uuid::new_v5(&Uuid::NAMESPACE_DNS, id.as_bytes())
        );
    }

    #[test]
    fn metadata_defaults_to_empty() {
        let doc = Document::new("doc1", "some text");
        assert!(doc.metadata.is_empty());

        let parsed: Document = serde_json::from_str(r#"{"id":"a","content":"b"}"#).unwrap();
        assert!(parsed.metadata.is_empty());
    }
}
