//! Document store abstraction.
//!
//! Defines the collection client trait the view layer consumes, allowing the
//! synchronizer and mutation controller to work with any hosted document
//! backend.

use crate::error::StoreResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use lms_types::{Document, DocumentId, FieldValue, Fields, Filter};

/// The full current contents of a collection (or filtered subset), in the
/// order the backend delivers them.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub collection: String,
    pub documents: Vec<Document>,
}

impl Snapshot {
    pub fn new(collection: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            collection: collection.into(),
            documents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// A live feed of snapshots. Dropping the stream ends the subscription.
pub type SnapshotStream = BoxStream<'static, StoreResult<Snapshot>>;

/// Point CRUD plus live subscription over named collections.
#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Subscribes to a collection, optionally constrained by an equality
    /// filter. The first item is the current contents.
    async fn subscribe(
        &self,
        collection: &str,
        filter: Option<Filter>,
    ) -> StoreResult<SnapshotStream>;

    /// Adds a document and returns its server-assigned id.
    async fn add_document(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId>;

    /// Merges `fields` into an existing document.
    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> StoreResult<()>;

    /// Deletes a document.
    async fn delete_document(&self, collection: &str, id: &DocumentId) -> StoreResult<()>;

    /// Returns every document whose `field` equals `value`.
    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &FieldValue,
    ) -> StoreResult<Vec<Document>>;

    /// Runs an equality query expressed as a [`Filter`].
    async fn query(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.query_equals(collection, filter.field(), filter.value())
            .await
    }
}
