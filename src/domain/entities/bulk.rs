use serde::Serialize;

use crate::domain::entities::document::{Document, Metadata};

/// One raw record streamed out of the bulk source, already decoded to JSON.
pub type SourceRecord = serde_json::Map<String, serde_json::Value>;

/// Names the record fields that become the document id, content, and metadata.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub id_field: String,
    pub content_field: String,
    pub metadata_fields: Vec<String>,
}

impl FieldMapping {
    pub fn new(id_field: impl Into<String>, content_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            content_field: content_field.into(),
            metadata_fields: Vec::new(),
        }
    }

    pub fn with_metadata_fields(mut self, fields: Vec<String>) -> Self {
        self.metadata_fields = fields;
        self
    }
}

/// Parameters of one bulk indexing run.
#[derive(Debug, Clone)]
pub struct BulkIndexParams {
    pub collection: String,
    pub pipeline: Vec<serde_json::Value>,
    pub mapping: FieldMapping,
    pub batch_size: Option<usize>,
}

/// Turns a source record into a [`Document`] per the field mapping.
///
/// Failures are returned as the per-record error description that ends up in
/// the bulk report. String and numeric ids are accepted; numeric ids are
/// stringified. Content must be a non-empty string.
pub fn extract_document(record: &SourceRecord, mapping: &FieldMapping) -> Result<Document, String> {
    let id = match record.get(&mapping.id_field) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Null) | None => {
            return Err(format!("record missing id field '{}'", mapping.id_field));
        }
        Some(_) => {
            return Err(format!(
                "record has unsupported id type in field '{}'",
                mapping.id_field
            ));
        }
    };

    let content = match record.get(&mapping.content_field) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(serde_json::Value::String(_)) => {
            return Err(format!(
                "record '{}': empty content field '{}'",
                id, mapping.content_field
            ));
        }
        Some(serde_json::Value::Null) | None => {
            return Err(format!(
                "record '{}': missing content field '{}'",
                id, mapping.content_field
            ));
        }
        Some(_) => {
            return Err(format!(
                "record '{}': content field '{}' is not a string",
                id, mapping.content_field
            ));
        }
    };

    let mut metadata = Metadata::new();
    for field in &mapping.metadata_fields {
        if let Some(value) = record.get(field) {
            metadata.insert(field.clone(), value.clone());
        }
    }

    Ok(Document::new(id, content).with_metadata(metadata))
}

/// Outcome of one bulk indexing run.
#[derive(Debug, Clone, Serialize)]
pub struct BulkIndexReport {
    pub indexed_count: usize,
    pub error_count: usize,
    pub elapsed_time: f64,
    pub rate: f64,
    pub errors: Vec<String>,
}

/// Accumulates per-record outcomes during a bulk run.
///
/// Record failures land here instead of aborting the run; the fold over the
/// source stream only ever grows these counters.
#[derive(Debug, Default)]
pub struct BulkAccumulator {
    indexed: usize,
    errors: Vec<String>,
}

impl BulkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_indexed(&mut self) {
        self.indexed += 1;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn indexed(&self) -> usize {
        self.indexed
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn into_report(self, elapsed: std::time::Duration) -> BulkIndexReport {
        let elapsed_time = elapsed.as_secs_f64();
        let rate = if elapsed_time > 0.0 {
            self.indexed as f64 / elapsed_time
        } else {
            0.0
        };

        BulkIndexReport {
            indexed_count: self.indexed,
            error_count: self.errors.len(),
            elapsed_time,
            rate,
            errors: self.errors,
        }
    }
}
