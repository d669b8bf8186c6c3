use crate::client::{CollectionClient, Snapshot, SnapshotStream};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use lms_types::{Document, DocumentId, FieldValue, Fields, Filter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::debug;

/// Counts of calls made against a [`MemoryCollectionClient`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub subscribes: usize,
    pub adds: usize,
    pub updates: usize,
    pub deletes: usize,
    pub queries: usize,
}

impl CallStats {
    /// Total add/update/delete calls.
    pub fn writes(&self) -> usize {
        self.adds + self.updates + self.deletes
    }

    /// Total calls of any kind except subscribe.
    pub fn io(&self) -> usize {
        self.writes() + self.queries
    }
}

#[derive(Default)]
struct Counters {
    subscribes: AtomicUsize,
    adds: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
    queries: AtomicUsize,
    writes_in_flight: AtomicUsize,
}

struct Subscriber {
    collection: String,
    filter: Option<Filter>,
    tx: mpsc::UnboundedSender<StoreResult<Snapshot>>,
}

#[derive(Default)]
struct Inner {
    /// Documents per collection, in insertion order.
    collections: HashMap<String, Vec<Document>>,
    subscribers: Vec<Subscriber>,
}

impl Inner {
    fn contents(&self, collection: &str, filter: Option<&Filter>) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| filter.is_none_or(|f| d.fields.matches(f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sends the current contents to every live subscriber of `collection`,
    /// dropping subscribers whose stream has gone away.
    fn broadcast(&mut self, collection: &str) {
        let mut outgoing = Vec::new();
        for (idx, sub) in self.subscribers.iter().enumerate() {
            if sub.collection == collection {
                let snapshot = Snapshot::new(collection, self.contents(collection, sub.filter.as_ref()));
                outgoing.push((idx, snapshot));
            }
        }
        let mut dead = Vec::new();
        for (idx, snapshot) in outgoing {
            if self.subscribers[idx].tx.unbounded_send(Ok(snapshot)).is_err() {
                dead.push(idx);
            }
        }
        for idx in dead.into_iter().rev() {
            self.subscribers.remove(idx);
        }
    }
}

/// Holds writes until permits are released. Obtained from
/// [`MemoryCollectionClient::hold_writes`].
#[derive(Clone)]
pub struct WriteGate(Arc<Semaphore>);

impl WriteGate {
    /// Lets `n` held (or future) writes proceed.
    pub fn release(&self, n: usize) {
        self.0.add_permits(n);
    }
}

/// A document store kept entirely in memory.
///
/// Every write re-broadcasts a full snapshot to matching subscribers, which
/// is how hosted document stores behave from the listener's point of view.
#[derive(Default)]
pub struct MemoryCollectionClient {
    inner: Mutex<Inner>,
    counters: Counters,
    gate: Mutex<Option<Arc<Semaphore>>>,
    fail_next_write: Mutex<Option<String>>,
    fail_next_query: Mutex<Option<String>>,
}

impl MemoryCollectionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document without counting it as a client call.
    pub fn seed(&self, collection: &str, fields: Fields) -> DocumentId {
        let id = DocumentId::generate();
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        inner.broadcast(collection);
        id
    }

    /// Current contents of a collection, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock().contents(collection, None)
    }

    /// Re-sends the current contents to subscribers of `collection`.
    pub fn emit(&self, collection: &str) {
        self.lock().broadcast(collection);
    }

    /// Delivers a stream error to every subscriber of `collection`.
    pub fn emit_error(&self, collection: &str, message: impl Into<String>) {
        let message = message.into();
        let inner = self.lock();
        for sub in inner.subscribers.iter().filter(|s| s.collection == collection) {
            let _ = sub.tx.unbounded_send(Err(StoreError::Remote(message.clone())));
        }
    }

    /// Number of subscriptions whose streams are still held by someone.
    pub fn live_subscribers(&self, collection: &str) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|s| s.collection == collection && !s.tx.is_closed())
            .count()
    }

    pub fn stats(&self) -> CallStats {
        let c = &self.counters;
        CallStats {
            subscribes: c.subscribes.load(Ordering::SeqCst),
            adds: c.adds.load(Ordering::SeqCst),
            updates: c.updates.load(Ordering::SeqCst),
            deletes: c.deletes.load(Ordering::SeqCst),
            queries: c.queries.load(Ordering::SeqCst),
        }
    }

    /// Writes that have been issued but not yet acknowledged.
    pub fn writes_in_flight(&self) -> usize {
        self.counters.writes_in_flight.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write wait for a permit from the returned gate.
    pub fn hold_writes(&self) -> WriteGate {
        let sem = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap_or_else(|e| e.into_inner()) = Some(sem.clone());
        WriteGate(sem)
    }

    /// The next add/update/delete fails with `StoreError::Remote(message)`.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        *self.fail_next_write.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    /// The next query fails with `StoreError::Remote(message)`.
    pub fn fail_next_query(&self, message: impl Into<String>) {
        *self.fail_next_query.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Waits on the gate (if any), then consumes an injected failure.
    async fn begin_write(&self) -> StoreResult<()> {
        let gate = self.gate.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(sem) = gate {
            sem.acquire()
                .await
                .map_err(|_| StoreError::ChannelClosed)?
                .forget();
        }
        if let Some(msg) = self.fail_next_write.lock().unwrap_or_else(|e| e.into_inner()).take() {
            return Err(StoreError::Remote(msg));
        }
        Ok(())
    }

    async fn gated<T>(&self, op: impl FnOnce(&mut Inner) -> StoreResult<T>) -> StoreResult<T> {
        self.counters.writes_in_flight.fetch_add(1, Ordering::SeqCst);
        let result = match self.begin_write().await {
            Ok(()) => op(&mut self.lock()),
            Err(e) => Err(e),
        };
        self.counters.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn check_collection(collection: &str) -> StoreResult<()> {
    if collection.trim().is_empty() {
        return Err(StoreError::InvalidArgument("collection name is empty".into()));
    }
    Ok(())
}

#[async_trait]
impl CollectionClient for MemoryCollectionClient {
    async fn subscribe(
        &self,
        collection: &str,
        filter: Option<Filter>,
    ) -> StoreResult<SnapshotStream> {
        check_collection(collection)?;
        self.counters.subscribes.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.lock();
        let initial = Snapshot::new(collection, inner.contents(collection, filter.as_ref()));
        tx.unbounded_send(Ok(initial))
            .map_err(|_| StoreError::ChannelClosed)?;
        inner.subscribers.push(Subscriber {
            collection: collection.to_string(),
            filter,
            tx,
        });
        debug!("Subscribed to {}", collection);
        Ok(rx.boxed())
    }

    async fn add_document(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId> {
        check_collection(collection)?;
        self.counters.adds.fetch_add(1, Ordering::SeqCst);
        self.gated(|inner| {
            let id = DocumentId::generate();
            inner
                .collections
                .entry(collection.to_string())
                .or_default()
                .push(Document::new(id.clone(), fields));
            inner.broadcast(collection);
            Ok(id)
        })
        .await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> StoreResult<()> {
        check_collection(collection)?;
        self.counters.updates.fetch_add(1, Ordering::SeqCst);
        self.gated(|inner| {
            let doc = inner
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| &d.id == id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            doc.fields.merge(&fields);
            inner.broadcast(collection);
            Ok(())
        })
        .await
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> StoreResult<()> {
        check_collection(collection)?;
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        self.gated(|inner| {
            if let Some(docs) = inner.collections.get_mut(collection) {
                docs.retain(|d| &d.id != id);
            }
            inner.broadcast(collection);
            Ok(())
        })
        .await
    }

    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &FieldValue,
    ) -> StoreResult<Vec<Document>> {
        check_collection(collection)?;
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.fail_next_query.lock().unwrap_or_else(|e| e.into_inner()).take() {
            return Err(StoreError::Remote(msg));
        }
        let filter = Filter::equals(field, value.clone());
        Ok(self.lock().contents(collection, Some(&filter)))
    }
}
