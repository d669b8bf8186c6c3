//! List synchronizer: mirrors a remote collection into a local list.
//!
//! Every snapshot replaces the whole list. There is no field-level diffing:
//! the list after a snapshot is exactly the mapped contents of that snapshot,
//! in the order the backend delivered them.
//!
//! Each open subscription is consumed by a listener task that publishes
//! immutable [`ListView`]s on a watch channel. The listener checks the
//! subscription's liveness flag under the same lock that
//! [`SubscriptionHandle::close`] takes, so nothing is published once `close`
//! has returned.

use crate::controller::{MutationKind, MutationOutcome};
use crate::error::{SyncError, SyncResult};
use futures::StreamExt;
use lms_store::{CollectionClient, Snapshot, SnapshotStream, StoreResult};
use lms_types::{Document, Filter, ListItem};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Read model published to a screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    pub items: Vec<ListItem>,
    /// True until the first snapshot (or refetch result) arrives.
    pub loading: bool,
    /// Message of the last subscription or refetch failure.
    pub error: Option<String>,
    /// Incremented on every publish, including identical re-emissions.
    pub revision: u64,
}

impl ListView {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &lms_types::DocumentId) -> Option<&ListItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &lms_types::DocumentId) -> bool {
        self.get(id).is_some()
    }

    fn replace(&mut self, items: Vec<ListItem>) {
        self.items = items;
        self.loading = false;
        self.error = None;
        self.revision += 1;
    }
}

struct HandleInner {
    id: u64,
    collection: String,
    filter: Option<Filter>,
    live: Mutex<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Cancellation token for one live subscription.
///
/// Clones refer to the same subscription. Closing is idempotent.
#[derive(Clone)]
pub struct SubscriptionHandle {
    inner: Arc<HandleInner>,
}

impl SubscriptionHandle {
    fn new(collection: &str, filter: Option<Filter>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed),
                collection: collection.to_string(),
                filter,
                live: Mutex::new(true),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn collection(&self) -> &str {
        &self.inner.collection
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.inner.filter.as_ref()
    }

    pub fn is_live(&self) -> bool {
        *self.inner.live.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stops delivery. After this returns no further list updates from this
    /// subscription are published, even if a snapshot was already in flight.
    pub fn close(&self) {
        {
            let mut live = self.inner.live.lock().unwrap_or_else(|e| e.into_inner());
            if !*live {
                return;
            }
            *live = false;
        }
        if let Some(task) = self
            .inner
            .task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
        debug!(
            "Closed subscription {} on {}",
            self.inner.id, self.inner.collection
        );
    }

    fn attach(&self, task: JoinHandle<()>) {
        *self.inner.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
    }

    /// Runs `publish` only while the subscription is live. Returns false once
    /// the subscription has been closed.
    fn publish_if_live(&self, publish: impl FnOnce()) -> bool {
        let live = self.inner.live.lock().unwrap_or_else(|e| e.into_inner());
        if *live {
            publish();
        }
        *live
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.inner.id)
            .field("collection", &self.inner.collection)
            .field("filter", &self.inner.filter)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Maintains one screen's local list in sync with a remote collection.
///
/// At most one subscription is live per synchronizer: opening again closes
/// the previous one first. Dropping the synchronizer closes it too.
pub struct ListSynchronizer {
    client: Arc<dyn CollectionClient>,
    view: Arc<watch::Sender<ListView>>,
    current: Option<SubscriptionHandle>,
}

impl ListSynchronizer {
    /// Creates a synchronizer whose view is loading until the first snapshot.
    pub fn new(client: Arc<dyn CollectionClient>) -> Self {
        Self::with_loading(client, true)
    }

    /// Creates a synchronizer for read-once screens, idle until the first
    /// [`refetch`](Self::refetch).
    pub fn read_once(client: Arc<dyn CollectionClient>) -> Self {
        Self::with_loading(client, false)
    }

    fn with_loading(client: Arc<dyn CollectionClient>, loading: bool) -> Self {
        let (tx, _) = watch::channel(ListView {
            loading,
            ..Default::default()
        });
        Self {
            client,
            view: Arc::new(tx),
            current: None,
        }
    }

    /// Begins a live subscription to `collection`, optionally filtered.
    ///
    /// Rejects an empty collection name before any I/O.
    pub async fn open(
        &mut self,
        collection: &str,
        filter: Option<Filter>,
    ) -> SyncResult<SubscriptionHandle> {
        if collection.trim().is_empty() {
            return Err(SyncError::EmptyCollectionName);
        }
        self.close();
        self.view.send_modify(|v| {
            v.items.clear();
            v.loading = true;
            v.error = None;
            v.revision += 1;
        });

        let stream = match self.client.subscribe(collection, filter.clone()).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to subscribe to {}: {}", collection, e);
                let msg = e.to_string();
                self.view.send_modify(|v| {
                    v.loading = false;
                    v.error = Some(msg);
                    v.revision += 1;
                });
                return Err(e.into());
            }
        };

        let handle = SubscriptionHandle::new(collection, filter);
        let task = tokio::spawn(listen(stream, handle.clone(), self.view.clone()));
        handle.attach(task);
        info!(
            "Opened subscription {} on {}{}",
            handle.id(),
            collection,
            handle
                .filter()
                .map(|f| format!(" where {f}"))
                .unwrap_or_default()
        );
        self.current = Some(handle.clone());
        Ok(handle)
    }

    /// Closes the live subscription, if any. Idempotent.
    pub fn close(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.close();
        }
    }

    /// The live subscription, if any.
    pub fn handle(&self) -> Option<&SubscriptionHandle> {
        self.current.as_ref().filter(|h| h.is_live())
    }

    /// Current read model.
    pub fn view(&self) -> ListView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every publish.
    pub fn watch(&self) -> watch::Receiver<ListView> {
        self.view.subscribe()
    }

    /// Echoes a settled mutation into the local list ahead of the snapshot
    /// that will confirm it. The next snapshot replaces the list wholesale.
    pub fn apply_settled(&self, outcome: &MutationOutcome) {
        self.view.send_modify(|v| {
            match outcome.kind {
                MutationKind::Add => {
                    if !v.items.iter().any(|item| item.id == outcome.id) {
                        v.items
                            .push(Document::new(outcome.id.clone(), outcome.fields.clone()));
                    }
                }
                MutationKind::Update => {
                    if let Some(item) = v.items.iter_mut().find(|item| item.id == outcome.id) {
                        item.fields.merge(&outcome.fields);
                    }
                }
                MutationKind::Delete => v.items.retain(|item| item.id != outcome.id),
            }
            v.revision += 1;
        });
        debug!("Echoed settled {} of {}", outcome.kind, outcome.id);
    }

    /// Read-once variant: closes any live subscription, runs one equality
    /// query and replaces the list with its result.
    pub async fn refetch(&mut self, collection: &str, filter: &Filter) -> SyncResult<ListView> {
        if collection.trim().is_empty() {
            return Err(SyncError::EmptyCollectionName);
        }
        self.close();
        self.view.send_modify(|v| {
            v.loading = true;
            v.revision += 1;
        });

        match self.client.query(collection, filter).await {
            Ok(documents) => {
                debug!(
                    "Refetched {} documents from {} where {}",
                    documents.len(),
                    collection,
                    filter
                );
                self.view.send_modify(|v| v.replace(documents));
                Ok(self.view())
            }
            Err(e) => {
                warn!("Refetch of {} failed: {}", collection, e);
                let msg = e.to_string();
                self.view.send_modify(|v| {
                    v.items.clear();
                    v.loading = false;
                    v.error = Some(msg);
                    v.revision += 1;
                });
                Err(e.into())
            }
        }
    }
}

impl Drop for ListSynchronizer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Applies one stream item to the view.
fn apply(view: &watch::Sender<ListView>, item: StoreResult<Snapshot>) {
    match item {
        Ok(snapshot) => view.send_modify(|v| v.replace(snapshot.documents)),
        Err(e) => {
            warn!("Subscription error: {}", e);
            let msg = e.to_string();
            view.send_modify(|v| {
                v.loading = false;
                v.error = Some(msg);
                v.revision += 1;
            });
        }
    }
}

async fn listen(
    mut stream: SnapshotStream,
    handle: SubscriptionHandle,
    view: Arc<watch::Sender<ListView>>,
) {
    while let Some(item) = stream.next().await {
        if !handle.publish_if_live(|| apply(&view, item)) {
            break;
        }
    }
    debug!("Listener for subscription {} finished", handle.id());
}
