//! Store gateway: the single point of truth in front of the answer store.
//!
//! All catalog mutations are funneled through [`StoreGateway::mutate`],
//! which holds one lock across apply-persist-publish. That serialization is
//! what prevents lost updates when concurrent commits target the same or
//! different questions, and what gives subscribers snapshots in exact
//! commit order with no gaps.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info};

use crate::catalog::{Catalog, Question};
use crate::error::{StoreError, StoreResult};
use crate::store::{self, AnswerStore};

/// Buffered snapshots per subscriber. A receiver that falls further behind
/// than this observes a `Lagged` error rather than silently missing data.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Receiver half of the catalog update stream.
pub type CatalogUpdates = broadcast::Receiver<Catalog>;

struct GatewayInner {
    store: AnswerStore,
    /// Cached snapshot. Holding this lock across persist + publish is the
    /// mutation-serialization contract.
    state: Mutex<Catalog>,
    updates: broadcast::Sender<Catalog>,
}

/// Serialized, observable front for one [`AnswerStore`].
///
/// Cheap to clone; all clones share the same cache, lock, and update
/// stream. One instance is constructed at process start and passed to every
/// component that reads or writes the catalog.
#[derive(Clone)]
pub struct StoreGateway {
    inner: Arc<GatewayInner>,
}

impl StoreGateway {
    /// Load the initial snapshot and build the gateway.
    ///
    /// A corrupted catalog is logged and replaced with the seeded defaults,
    /// the recommended recovery policy. Connection-level failures are not
    /// recovered here.
    pub async fn connect(store: AnswerStore) -> StoreResult<Self> {
        let catalog = match store.load().await {
            Ok(catalog) => catalog,
            Err(StoreError::Corruption { message }) => {
                error!(%message, "Persisted catalog is corrupted, resetting to defaults");
                store.reset().await?
            }
            Err(e) => return Err(e),
        };

        info!(
            questions = catalog.questions.len(),
            notes = catalog.notes.len(),
            version = catalog.version,
            "Store gateway connected"
        );

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(GatewayInner {
                store,
                state: Mutex::new(catalog),
                updates,
            }),
        })
    }

    /// Current in-memory snapshot. Never touches storage.
    pub async fn read(&self) -> Catalog {
        self.inner.state.lock().await.clone()
    }

    /// Subscribe to committed snapshots.
    ///
    /// Returns the current snapshot together with a receiver registered
    /// before any later mutation can publish, so an observer sees the
    /// initial state and then every commit, in order.
    pub async fn subscribe(&self) -> (Catalog, CatalogUpdates) {
        let guard = self.inner.state.lock().await;
        (guard.clone(), self.inner.updates.subscribe())
    }

    /// Apply a mutation to the catalog, persist it, publish the new
    /// snapshot, and return it.
    ///
    /// Strictly serialized: a second caller does not begin until this
    /// mutation has fully persisted and published. If `f` fails or the
    /// persist fails, the cached snapshot is untouched, nothing is
    /// published, and the error surfaces to the caller.
    pub async fn mutate<F>(&self, f: F) -> StoreResult<Catalog>
    where
        F: FnOnce(&mut Catalog) -> StoreResult<()> + Send,
    {
        let mut guard = self.inner.state.lock().await;

        let mut next = guard.clone();
        f(&mut next)?;

        // Write-then-notify, never the reverse
        self.inner.store.persist(&next).await?;
        *guard = next.clone();

        // Send fails only when no subscriber exists, which is fine
        let _ = self.inner.updates.send(next.clone());

        debug!(notes = next.notes.len(), "Catalog mutation committed");
        Ok(next)
    }

    /// Create or replace the note for a question
    pub async fn save_or_update_note(
        &self,
        question_id: &str,
        answer: impl Into<String> + Send,
        metadata: Option<BTreeMap<String, String>>,
    ) -> StoreResult<Catalog> {
        let answer = answer.into();
        let question_id = question_id.to_string();
        self.mutate(move |catalog| {
            catalog.upsert_note(&question_id, answer, metadata)?;
            Ok(())
        })
        .await
    }

    /// Add a question to the catalog
    pub async fn add_question(&self, question: Question) -> StoreResult<Catalog> {
        self.mutate(move |catalog| catalog.add_question(question))
            .await
    }

    /// Delete a question and its note, if any. Deleting an unknown question
    /// is a no-op.
    pub async fn delete_question(&self, question_id: &str) -> StoreResult<Catalog> {
        let question_id = question_id.to_string();
        self.mutate(move |catalog| {
            catalog.remove_question(&question_id);
            Ok(())
        })
        .await
    }

    /// Delete the note for a question, if any
    pub async fn delete_note(&self, question_id: &str) -> StoreResult<Catalog> {
        let question_id = question_id.to_string();
        self.mutate(move |catalog| {
            catalog.remove_note(&question_id);
            Ok(())
        })
        .await
    }

    /// Replace the catalog with the seeded default set, discarding all
    /// notes
    pub async fn reset_to_defaults(&self) -> StoreResult<Catalog> {
        self.mutate(|catalog| {
            *catalog = Catalog::seeded();
            Ok(())
        })
        .await
    }

    /// Discard all notes, leaving the question set untouched
    pub async fn clear_all_data(&self) -> StoreResult<Catalog> {
        self.mutate(|catalog| {
            catalog.clear_notes();
            Ok(())
        })
        .await
    }

    /// Serialize the current snapshot for backup
    pub async fn export(&self) -> StoreResult<Vec<u8>> {
        let catalog = self.read().await;
        store::encode(&catalog)
    }

    /// Replace the catalog wholesale from exported bytes.
    ///
    /// Runs through the same serialized commit path as every other
    /// mutation; per-note validation is intentionally skipped.
    pub async fn import(&self, bytes: &[u8]) -> StoreResult<Catalog> {
        let imported = store::decode(bytes)?;
        self.mutate(move |catalog| {
            *catalog = imported;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{seed_ids, Category};
    use crate::store::{BlobStore, SqliteBlobStore, CATALOG_KEY};

    async fn test_gateway() -> StoreGateway {
        let blobs = SqliteBlobStore::new_in_memory().await.unwrap();
        let store = AnswerStore::new(Arc::new(blobs));
        StoreGateway::connect(store).await.unwrap()
    }

    #[tokio::test]
    async fn test_read_returns_seeded_snapshot() {
        let gateway = test_gateway().await;
        let catalog = gateway.read().await;
        assert_eq!(catalog.questions.len(), 7);
        assert!(catalog.notes.is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_sees_every_snapshot_in_commit_order() {
        let gateway = test_gateway().await;
        let (initial, mut updates) = gateway.subscribe().await;
        assert!(initial.notes.is_empty());

        gateway
            .save_or_update_note(seed_ids::RESIDENT_NAME, "Alex", None)
            .await
            .unwrap();
        gateway
            .save_or_update_note(seed_ids::TEMPERATURE_UNIT, "Celsius", None)
            .await
            .unwrap();
        gateway.delete_note(seed_ids::RESIDENT_NAME).await.unwrap();

        let first = updates.recv().await.unwrap();
        assert_eq!(first.notes.len(), 1);
        assert!(first.note(seed_ids::RESIDENT_NAME).is_some());

        let second = updates.recv().await.unwrap();
        assert_eq!(second.notes.len(), 2);

        let third = updates.recv().await.unwrap();
        assert_eq!(third.notes.len(), 1);
        assert!(third.note(seed_ids::RESIDENT_NAME).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_mutations_lose_nothing() {
        let gateway = test_gateway().await;
        let catalog = gateway.read().await;
        let ids: Vec<String> = catalog.questions.iter().map(|q| q.id.clone()).collect();

        let mut handles = Vec::new();
        for id in &ids {
            let gateway = gateway.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                gateway
                    .save_or_update_note(&id, format!("answer for {}", id), None)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let final_catalog = gateway.read().await;
        assert_eq!(final_catalog.notes.len(), ids.len());
        for id in &ids {
            assert!(final_catalog.is_answered(id));
        }
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_and_stream_untouched() {
        let gateway = test_gateway().await;
        let (_, mut updates) = gateway.subscribe().await;

        let err = gateway
            .save_or_update_note("no-such-question", "answer", None)
            .await;
        assert!(matches!(err, Err(StoreError::QuestionNotFound { .. })));

        assert!(gateway.read().await.notes.is_empty());
        assert!(matches!(
            updates.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_clear_all_data_vs_reset_to_defaults() {
        let gateway = test_gateway().await;
        let extra = Question::new("Extra question?", Category::Other, 42);
        let extra_id = extra.id.clone();
        gateway.add_question(extra).await.unwrap();
        gateway
            .save_or_update_note(&extra_id, "extra answer", None)
            .await
            .unwrap();

        // clear_all_data drops notes, keeps all questions including added
        let cleared = gateway.clear_all_data().await.unwrap();
        assert!(cleared.notes.is_empty());
        assert_eq!(cleared.questions.len(), 8);

        // reset_to_defaults drops both back to the seeded set
        let reset = gateway.reset_to_defaults().await.unwrap();
        assert!(reset.notes.is_empty());
        assert_eq!(reset.questions.len(), 7);
        assert!(reset.question(&extra_id).is_none());
    }

    #[tokio::test]
    async fn test_import_export_round_trip_through_gateway() {
        let gateway = test_gateway().await;
        gateway
            .save_or_update_note(seed_ids::RESIDENT_NAME, "Alex", None)
            .await
            .unwrap();

        let bytes = gateway.export().await.unwrap();

        gateway.reset_to_defaults().await.unwrap();
        assert!(gateway.read().await.notes.is_empty());

        let restored = gateway.import(&bytes).await.unwrap();
        assert_eq!(restored, gateway.read().await);
        assert!(restored.is_answered(seed_ids::RESIDENT_NAME));
    }

    #[tokio::test]
    async fn test_connect_recovers_from_corruption() {
        let blobs = Arc::new(SqliteBlobStore::new_in_memory().await.unwrap());
        blobs.set(CATALOG_KEY, b"definitely not json").await.unwrap();

        let store = AnswerStore::new(blobs.clone());
        let gateway = StoreGateway::connect(store).await.unwrap();

        // Reset-to-defaults recovery, persisted
        let catalog = gateway.read().await;
        assert_eq!(catalog.questions.len(), 7);

        let persisted = AnswerStore::new(blobs).load().await.unwrap();
        assert_eq!(persisted, catalog);
    }
}
