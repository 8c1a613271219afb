use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::domain::ports::{DocumentSource, RecordStream};
use crate::domain::{DomainError, SourceRecord};

/// Bulk document source backed by a MongoDB database.
///
/// The client connects lazily, so constructing the source succeeds even
/// while the database is down; [`DocumentSource::ping`] is the explicit
/// reachability check bulk runs perform up front.
pub struct MongoDocumentSource {
    database: Database,
}

impl MongoDocumentSource {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, DomainError> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|e| DomainError::source(format!("Invalid MongoDB URI: {e}")))?;
        let client = Client::with_options(options)
            .map_err(|e| DomainError::source(format!("Failed to create MongoDB client: {e}")))?;

        Ok(Self {
            database: client.database(database),
        })
    }
}

#[async_trait]
impl DocumentSource for MongoDocumentSource {
    async fn ping(&self) -> Result<(), DomainError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DomainError::source(format!("MongoDB is unreachable: {e}")))?;
        Ok(())
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[serde_json::Value],
    ) -> Result<RecordStream, DomainError> {
        let stages = pipeline
            .iter()
            .map(bson::to_document)
            .collect::<Result<Vec<BsonDocument>, _>>()
            .map_err(|e| DomainError::validation(format!("Invalid aggregation pipeline: {e}")))?;

        let cursor = self
            .database
            .collection::<BsonDocument>(collection)
            .aggregate(stages)
            .await
            .map_err(|e| DomainError::source(format!("Aggregation failed: {e}")))?;

        let stream = cursor.map(|item| {
            item.map(document_to_record)
                .map_err(|e| DomainError::source(format!("Cursor error: {e}")))
        });

        Ok(Box::pin(stream))
    }
}

fn document_to_record(document: BsonDocument) -> SourceRecord {
    document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect()
}

/// Converts BSON into plain JSON the rest of the pipeline understands.
///
/// ObjectIds become hex strings so they can serve as document ids,
/// datetimes become RFC 3339 strings, and Decimal128 becomes a number
/// when it fits in an f64. Exotic types fall back to relaxed Extended
/// JSON rather than being dropped.
fn bson_to_json(value: Bson) -> serde_json::Value {
    match value {
        Bson::ObjectId(oid) => serde_json::Value::String(oid.to_hex()),
        Bson::String(s) => serde_json::Value::String(s),
        Bson::Boolean(b) => serde_json::Value::Bool(b),
        Bson::Int32(i) => serde_json::Value::from(i),
        Bson::Int64(i) => serde_json::Value::from(i),
        Bson::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Bson::Decimal128(d) => {
            let text = d.to_string();
            match text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Some(number) => serde_json::Value::Number(number),
                None => serde_json::Value::String(text),
            }
        }
        Bson::DateTime(dt) => serde_json::Value::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        Bson::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(bson_to_json).collect())
        }
        Bson::Document(doc) => serde_json::Value::Object(
            doc.into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Null => serde_json::Value::Null,
        other => other.into_relaxed_extjson(),
    }
}
