//! MongoDB scan store.
//!
//! Reads the `scans` collection the scanning pipeline writes to. One client is
//! opened at startup and shared by every request; the driver pools
//! connections internally.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harbor_core::{ScanId, ScanRecord};
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::error::{Error as DriverError, ErrorKind};
use mongodb::{Client, Collection, Database};
use serde_json::Value;

use crate::{Filter, ScanQuery, ScanStore, StoreError};

/// [`ScanStore`] backed by a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
    scans: Collection<Document>,
}

impl MongoStore {
    /// Open a client for `uri` and bind to `database.collection`.
    ///
    /// The driver connects lazily; call [`ScanStore::health_check`] to find
    /// out whether the server is actually reachable.
    ///
    /// # Errors
    /// Returns [`StoreError::Query`] if the connection string is invalid.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await.map_err(map_driver_error)?;
        let database = client.database(database);
        let scans = database.collection::<Document>(collection);
        tracing::info!(
            database = %database.name(),
            collection = %scans.name(),
            "mongo scan store configured"
        );
        Ok(Self { database, scans })
    }
}

#[async_trait]
impl ScanStore for MongoStore {
    async fn find(&self, query: &ScanQuery) -> Result<Vec<ScanRecord>, StoreError> {
        // A zero limit means "no limit" to the server.
        if query.limit() == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(query.limit()).unwrap_or(i64::MAX);
        let filter = filter_document(query);

        tracing::debug!(%filter, limit, "querying scans");

        let mut cursor = self
            .scans
            .find(filter)
            .sort(doc! { "_id": -1 })
            .limit(limit)
            .await
            .map_err(map_driver_error)?;

        let mut records = Vec::new();
        while cursor.advance().await.map_err(map_driver_error)? {
            let document = cursor.deserialize_current().map_err(map_driver_error)?;
            records.push(record_from_document(document)?);
        }
        Ok(records)
    }

    async fn get(&self, id: ScanId) -> Result<Option<ScanRecord>, StoreError> {
        let document = self
            .scans
            .find_one(doc! { "_id": object_id(id) })
            .await
            .map_err(map_driver_error)?;
        document.map(record_from_document).transpose()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_driver_error)?;
        Ok(())
    }
}

fn object_id(id: ScanId) -> ObjectId {
    ObjectId::from_bytes(id.to_bytes())
}

/// Translate the conjunction into a MongoDB filter document.
fn filter_document(query: &ScanQuery) -> Document {
    let mut clauses: Vec<Document> = query.filters().iter().map(filter_clause).collect();
    match clauses.len() {
        0 => Document::new(),
        1 => clauses.swap_remove(0),
        _ => doc! { "$and": clauses },
    }
}

fn filter_clause(filter: &Filter) -> Document {
    match filter {
        Filter::Kind(kind) => doc! { "type": kind.as_str() },
        Filter::RiskLevel(level) => doc! { "result.risk_level": level.as_str() },
        Filter::Before(id) => doc! { "_id": { "$lt": object_id(*id) } },
    }
}

/// Map a stored document into a [`ScanRecord`].
///
/// `_id` becomes `id`, a BSON date `created_at` becomes the typed timestamp,
/// and everything else goes through relaxed extended JSON.
fn record_from_document(mut document: Document) -> Result<ScanRecord, StoreError> {
    let id = match document.remove("_id") {
        Some(Bson::ObjectId(oid)) => ScanId::from_bytes(oid.bytes()),
        Some(other) => {
            return Err(StoreError::MalformedDocument {
                id: other.to_string(),
                reason: "_id is not an ObjectId".to_owned(),
            })
        }
        None => {
            return Err(StoreError::MalformedDocument {
                id: "<missing>".to_owned(),
                reason: "document has no _id".to_owned(),
            })
        }
    };

    let created_at = match document.remove("created_at") {
        Some(Bson::DateTime(dt)) => {
            let parsed = DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis());
            if parsed.is_none() {
                tracing::warn!(
                    scan_id = %id,
                    millis = dt.timestamp_millis(),
                    "created_at outside the supported range; dropping it"
                );
            }
            parsed
        }
        Some(other) => {
            // Strings and the like are left for serde to parse.
            document.insert("created_at", other);
            None
        }
        None => None,
    };

    let Value::Object(mut fields) = Bson::Document(document).into_relaxed_extjson() else {
        return Err(StoreError::malformed(id, "document is not a JSON object"));
    };
    fields.insert("id".to_owned(), Value::String(id.to_string()));

    let mut record: ScanRecord = serde_json::from_value(Value::Object(fields))
        .map_err(|e| StoreError::malformed(id, e.to_string()))?;
    if created_at.is_some() {
        record.created_at = created_at;
    }
    Ok(record)
}

fn map_driver_error(err: DriverError) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Query(err.to_string()),
    }
}
