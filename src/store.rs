//! Whole-document persistence.
//!
//! The document is one JSON value under [`DOCUMENT_KEY`]. Every mutation
//! goes through [`DocumentStore::update`], which overwrites the stored value
//! before the in-memory copy changes, so the two never drift apart.

use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::model::Document;
use crate::storage::{KeyValueStore, DOCUMENT_KEY};

/// Suggested file name for exports.
pub const DEFAULT_EXPORT_FILE: &str = "trade-trackr-export.json";

/// Owner of the live document.
pub struct DocumentStore<S: KeyValueStore + ?Sized> {
  backend: Arc<S>,
  document: Document,
}

impl<S: KeyValueStore + ?Sized> DocumentStore<S> {
  /// Create a store and load the current document from `backend`.
  pub fn new(backend: Arc<S>) -> Result<Self> {
    let document = load(backend.as_ref())?;
    Ok(Self { backend, document })
  }

  /// The live document.
  pub fn document(&self) -> &Document {
    &self.document
  }

  /// Apply `f` to a copy of the document and persist it. The live document
  /// only changes once the write succeeds.
  pub fn update<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> Result<R> {
    let mut next = self.document.clone();
    let result = f(&mut next);
    save(self.backend.as_ref(), &next)?;
    self.document = next;
    Ok(result)
  }

  /// Replace the whole document and persist it.
  pub fn replace(&mut self, document: Document) -> Result<()> {
    save(self.backend.as_ref(), &document)?;
    self.document = document;
    Ok(())
  }

  /// Re-read the persisted document, discarding the in-memory copy.
  pub fn reload(&mut self) -> Result<()> {
    self.document = load(self.backend.as_ref())?;
    Ok(())
  }

  /// Drop the stored document and start again from the seed.
  pub fn clear(&mut self) -> Result<()> {
    self.backend.remove(DOCUMENT_KEY)?;
    self.reload()
  }

  /// Write the document to `path` as indented JSON.
  pub fn export_to(&self, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&self.document)
      .map_err(|e| eyre!("Failed to serialize document: {}", e))?;
    std::fs::write(path, json)
      .map_err(|e| eyre!("Failed to write export {}: {}", path.display(), e))?;

    info!(path = %path.display(), "exported document");
    Ok(())
  }

  /// Replace the document with the contents of the JSON file at `path`.
  ///
  /// On any read or parse failure the current document is left untouched.
  pub fn import_from(&mut self, path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;
    let document: Document = serde_json::from_str(&contents)
      .map_err(|e| eyre!("Invalid JSON in {}: {}", path.display(), e))?;

    self.replace(document)?;
    info!(path = %path.display(), "imported document");
    Ok(())
  }
}

/// Read the stored document, seeding (and persisting the seed) when nothing
/// is stored or the stored value does not parse.
pub fn load<S: KeyValueStore + ?Sized>(backend: &S) -> Result<Document> {
  match backend.get(DOCUMENT_KEY)? {
    Some(raw) => match serde_json::from_str(&raw) {
      Ok(document) => Ok(document),
      Err(e) => {
        warn!(error = %e, "stored document is unreadable, reseeding");
        reseed(backend)
      }
    },
    None => reseed(backend),
  }
}

/// Overwrite the stored document.
pub fn save<S: KeyValueStore + ?Sized>(backend: &S, document: &Document) -> Result<()> {
  let json =
    serde_json::to_string(document).map_err(|e| eyre!("Failed to serialize document: {}", e))?;
  backend.set(DOCUMENT_KEY, &json)
}

fn reseed<S: KeyValueStore + ?Sized>(backend: &S) -> Result<Document> {
  let seed = Document::seed();
  save(backend, &seed)?;
  Ok(seed)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{JobStatus, Settings};
  use crate::storage::MemoryStorage;
  use std::sync::atomic::{AtomicBool, Ordering};

  /// Memory storage whose writes can be switched off
  #[derive(Default)]
  struct FlakyStorage {
    inner: MemoryStorage,
    fail_writes: AtomicBool,
  }

  impl KeyValueStore for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
      self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
      if self.fail_writes.load(Ordering::SeqCst) {
        return Err(eyre!("disk full"));
      }
      self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
      self.inner.remove(key)
    }
  }

  fn store() -> (Arc<MemoryStorage>, DocumentStore<MemoryStorage>) {
    let backend = Arc::new(MemoryStorage::new());
    let store = DocumentStore::new(backend.clone()).unwrap();
    (backend, store)
  }

  #[test]
  fn test_empty_storage_loads_and_persists_seed() {
    let backend = MemoryStorage::new();
    let doc = load(&backend).unwrap();

    assert_eq!(doc.clients.len(), 1);
    assert_eq!(doc.materials.len(), 1);
    assert_eq!(doc.jobs.len(), 1);
    assert_eq!(
      doc.jobs[0].client_id.as_deref(),
      Some(doc.clients[0].id.as_str())
    );
    assert_eq!(doc.jobs[0].materials[0].material_id, doc.materials[0].id);

    // Seed was written, so a second load returns the same document
    assert_eq!(load(&backend).unwrap(), doc);
  }

  #[test]
  fn test_unparseable_value_is_replaced_by_seed() {
    let backend = MemoryStorage::new();
    backend.set(DOCUMENT_KEY, "{not json").unwrap();

    let doc = load(&backend).unwrap();
    assert_eq!(doc.jobs[0].title, "Kitchen Tap Replacement");

    let stored = backend.get(DOCUMENT_KEY).unwrap().unwrap();
    assert!(serde_json::from_str::<Document>(&stored).is_ok());
  }

  #[test]
  fn test_save_then_load_round_trips() {
    let backend = MemoryStorage::new();
    let mut doc = Document::seed();
    doc.settings = Settings {
      biz_name: "Pipes & Co".to_string(),
      vat: 20.0,
      hourly_rate: 42.5,
    };
    doc.jobs[0].status = JobStatus::Completed;
    doc.jobs[0].photos.push("data:image/png;base64,AAAA".to_string());

    save(&backend, &doc).unwrap();
    assert_eq!(load(&backend).unwrap(), doc);
  }

  #[test]
  fn test_update_persists_immediately() {
    let (backend, mut store) = store();
    store
      .update(|doc| doc.settings.biz_name = "Updated".to_string())
      .unwrap();

    let persisted = load(backend.as_ref()).unwrap();
    assert_eq!(persisted.settings.biz_name, "Updated");
    assert_eq!(store.document(), &persisted);
  }

  #[test]
  fn test_failed_write_keeps_live_document() {
    let backend = Arc::new(FlakyStorage::default());
    let mut store = DocumentStore::new(backend.clone()).unwrap();
    let before = store.document().clone();

    backend.fail_writes.store(true, Ordering::SeqCst);
    let result = store.update(|doc| doc.jobs.clear());

    assert!(result.is_err());
    assert_eq!(store.document(), &before);
    assert_eq!(store.document().jobs.len(), 1);

    // Writes recover and the next update applies normally
    backend.fail_writes.store(false, Ordering::SeqCst);
    store.update(|doc| doc.jobs.clear()).unwrap();
    assert!(load(backend.as_ref()).unwrap().jobs.is_empty());
  }

  #[test]
  fn test_import_accepts_null_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nulls.json");
    std::fs::write(
      &path,
      r#"{"materials":[{"id":"mat_a","name":"Pipe","unitPrice":null,"createdAt":"2024-03-01T09:00:00Z"}]}"#,
    )
    .unwrap();

    let (_backend, mut store) = store();
    store.import_from(&path).unwrap();
    assert_eq!(store.document().materials[0].unit_price, 0.0);
    assert!(store.document().jobs.is_empty());
  }

  #[test]
  fn test_clear_reseeds() {
    let (_backend, mut store) = store();
    store.update(|doc| doc.jobs.clear()).unwrap();
    store.clear().unwrap();
    assert_eq!(store.document().jobs.len(), 1);
  }

  #[test]
  fn test_export_then_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_EXPORT_FILE);

    let (_backend, mut source) = store();
    source
      .update(|doc| doc.settings.vat = 17.5)
      .unwrap();
    source.export_to(&path).unwrap();

    let exported = std::fs::read_to_string(&path).unwrap();
    assert!(exported.contains("\n  \"clients\""));

    let (backend, mut target) = store();
    target.import_from(&path).unwrap();
    assert_eq!(target.document(), source.document());
    assert_eq!(load(backend.as_ref()).unwrap(), *source.document());
  }

  #[test]
  fn test_malformed_import_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "[1, 2").unwrap();

    let (backend, mut store) = store();
    let before = store.document().clone();

    assert!(store.import_from(&path).is_err());
    assert_eq!(store.document(), &before);
    assert_eq!(load(backend.as_ref()).unwrap(), before);
  }

  #[test]
  fn test_missing_import_file_is_error() {
    let (_backend, mut store) = store();
    assert!(store.import_from(Path::new("/nonexistent/file.json")).is_err());
  }
}
