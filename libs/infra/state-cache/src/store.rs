// [libs/infra/state-cache/src/store.rs]
/*!
 * =================================================================
 * APARATO: WARDROBE STATE CACHE (V1.0 - SPINE GENESIS)
 * CLASIFICACION: APPLICATION STATE (ESTRATO L3)
 * RESPONSABILIDAD: DOCUMENTO-POR-CUBO EN MEMORIA Y DIFUSION DE CAMBIOS
 *
 * HashMap<CubeDocumentKey, WardrobeCubeDocument> bajo RwLock, con un
 * canal de difusion que entrega {prior, current} en lugar de un evento
 * plano: los suscriptores del wardrobe necesitan el delta para
 * reconciliar su vista local.
 * =================================================================
 */

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use spine_domain_models::Facet;
use tokio::sync::broadcast;
use tracing::{debug, instrument, trace, warn};

use crate::document::{AgenticState, BiometricSync, CubeDocumentKey, FaceEntry, WardrobeCubeDocument};
use crate::mutation::{apply_patch, FieldValue};

const CHANGE_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub key: CubeDocumentKey,
    pub kind: ChangeKind,
    pub prior: Option<WardrobeCubeDocument>,
    pub current: Option<WardrobeCubeDocument>,
}

#[derive(Debug, Clone, Default)]
pub struct FacePatch {
    pub visibility: Option<String>,
    pub agentic_state: Option<AgenticState>,
    pub data_ops: Vec<(String, FieldValue)>,
}

/// Documento-por-cubo en memoria. Cada entrada vive bajo `(owner_id,
/// cube_id)`; el acceso concurrente se protege con un `RwLock`.
pub struct StateCacheStore {
    documents: RwLock<HashMap<CubeDocumentKey, WardrobeCubeDocument>>,
    change_channel: broadcast::Sender<ChangeEvent>,
}

impl StateCacheStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { documents: RwLock::new(HashMap::new()), change_channel: sender }
    }

    /// Nuevo receptor del canal de cambios. Un suscriptor lento que se
    /// rezaga mas alla de la capacidad del canal pierde sus entradas
    /// mas antiguas (`RecvError::Lagged`), no las mas recientes.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.change_channel.subscribe()
    }

    pub fn get(&self, key: &CubeDocumentKey) -> Option<WardrobeCubeDocument> {
        self.documents.read().expect("state cache lock poisoned").get(key).cloned()
    }

    #[instrument(skip(self, patch))]
    pub fn upsert_face(&self, key: &CubeDocumentKey, facet: Facet, patch: FacePatch) -> WardrobeCubeDocument {
        let now = Utc::now();
        let mut guard = self.documents.write().expect("state cache lock poisoned");
        let prior = guard.get(key).cloned();
        let is_new_document = prior.is_none();

        let doc = guard
            .entry(key.clone())
            .or_insert_with(|| WardrobeCubeDocument::new(key.owner_id.clone(), key.cube_id.clone()));

        let face = doc.faces.entry(facet).or_insert_with(|| FaceEntry {
            visibility: "private".to_string(),
            data: serde_json::json!({}),
            pending_sync: false,
            agentic_state: AgenticState::Idle,
            updated_at: now,
        });

        if let Some(visibility) = patch.visibility {
            face.visibility = visibility;
        }
        if let Some(state) = patch.agentic_state {
            face.agentic_state = state;
        }
        if !patch.data_ops.is_empty() {
            apply_patch(&mut face.data, &patch.data_ops, now);
        }
        face.pending_sync = true;
        face.updated_at = now;

        let current = doc.clone();
        drop(guard);

        self.publish(key.clone(), if is_new_document { ChangeKind::Added } else { ChangeKind::Modified }, prior, Some(current.clone()));
        current
    }

    /// Marca una cara como sincronizada con el almacen relacional,
    /// satisfaciendo el invariante de `pending_sync`.
    #[instrument(skip(self))]
    pub fn mark_face_synced(&self, key: &CubeDocumentKey, facet: Facet) -> Option<WardrobeCubeDocument> {
        let mut guard = self.documents.write().expect("state cache lock poisoned");
        let prior = guard.get(key).cloned();
        let doc = guard.get_mut(key)?;
        if let Some(face) = doc.faces.get_mut(&facet) {
            face.pending_sync = false;
        }
        let current = doc.clone();
        drop(guard);
        self.publish(key.clone(), ChangeKind::Modified, prior, Some(current.clone()));
        Some(current)
    }

    #[instrument(skip(self))]
    pub fn set_agentic_state(&self, key: &CubeDocumentKey, state: AgenticState) -> WardrobeCubeDocument {
        let now = Utc::now();
        let mut guard = self.documents.write().expect("state cache lock poisoned");
        let prior = guard.get(key).cloned();
        let is_new_document = prior.is_none();
        let doc = guard
            .entry(key.clone())
            .or_insert_with(|| WardrobeCubeDocument::new(key.owner_id.clone(), key.cube_id.clone()));
        doc.agentic_state = state;
        let current = doc.clone();
        drop(guard);
        self.publish(key.clone(), if is_new_document { ChangeKind::Added } else { ChangeKind::Modified }, prior, Some(current.clone()));
        current
    }

    #[instrument(skip(self, mutate))]
    pub fn update_biometric_sync(&self, key: &CubeDocumentKey, mutate: impl FnOnce(&mut BiometricSync)) -> WardrobeCubeDocument {
        let mut guard = self.documents.write().expect("state cache lock poisoned");
        let prior = guard.get(key).cloned();
        let is_new_document = prior.is_none();
        let doc = guard
            .entry(key.clone())
            .or_insert_with(|| WardrobeCubeDocument::new(key.owner_id.clone(), key.cube_id.clone()));
        mutate(&mut doc.biometric_sync);
        let current = doc.clone();
        drop(guard);
        self.publish(key.clone(), if is_new_document { ChangeKind::Added } else { ChangeKind::Modified }, prior, Some(current.clone()));
        current
    }

    #[instrument(skip(self))]
    pub fn remove(&self, key: &CubeDocumentKey) -> Option<WardrobeCubeDocument> {
        let mut guard = self.documents.write().expect("state cache lock poisoned");
        let removed = guard.remove(key);
        drop(guard);
        if removed.is_some() {
            self.publish(key.clone(), ChangeKind::Removed, removed.clone(), None);
        }
        removed
    }

    fn publish(&self, key: CubeDocumentKey, kind: ChangeKind, prior: Option<WardrobeCubeDocument>, current: Option<WardrobeCubeDocument>) {
        match self.change_channel.send(ChangeEvent { key, kind, prior, current }) {
            Ok(subscriber_count) => trace!(subscriber_count, "wardrobe change published"),
            Err(_) => debug!("wardrobe change discarded, no active subscribers"),
        }
    }
}

impl Default for StateCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::FieldValue;

    fn key() -> CubeDocumentKey {
        CubeDocumentKey::new("owner-1", "cube-1")
    }

    #[test]
    fn upsert_face_marks_pending_sync() {
        let store = StateCacheStore::new();
        let doc = store.upsert_face(
            &key(),
            Facet::MaterialComposition,
            FacePatch { visibility: Some("public".to_string()), agentic_state: None, data_ops: vec![] },
        );
        let face = doc.faces.get(&Facet::MaterialComposition).expect("face present");
        assert!(face.pending_sync);
        assert_eq!(face.visibility, "public");
    }

    #[test]
    fn mark_face_synced_clears_flag() {
        let store = StateCacheStore::new();
        store.upsert_face(&key(), Facet::RepairLog, FacePatch::default());
        let doc = store.mark_face_synced(&key(), Facet::RepairLog).expect("document exists");
        assert!(!doc.faces.get(&Facet::RepairLog).unwrap().pending_sync);
    }

    #[test]
    fn increment_patch_accumulates_across_calls() {
        let store = StateCacheStore::new();
        let patch = FacePatch { visibility: None, agentic_state: None, data_ops: vec![("views".to_string(), FieldValue::Increment(1.0))] };
        store.upsert_face(&key(), Facet::OwnershipHistory, patch.clone());
        let doc = store.upsert_face(&key(), Facet::OwnershipHistory, patch);
        let views = doc.faces.get(&Facet::OwnershipHistory).unwrap().data["views"].as_f64().unwrap();
        assert_eq!(views, 2.0);
    }

    #[tokio::test]
    async fn subscribers_receive_prior_and_current() {
        let store = StateCacheStore::new();
        let mut rx = store.subscribe();
        store.upsert_face(&key(), Facet::CareInstructions, FacePatch::default());
        let event = rx.recv().await.expect("change delivered");
        assert_eq!(event.kind, ChangeKind::Added);
        assert!(event.prior.is_none());
        assert!(event.current.is_some());
    }

    #[test]
    fn removal_publishes_prior_only() {
        let store = StateCacheStore::new();
        store.upsert_face(&key(), Facet::AuthenticityProof, FacePatch::default());
        let removed = store.remove(&key());
        assert!(removed.is_some());
        assert!(store.get(&key()).is_none());
    }
}
