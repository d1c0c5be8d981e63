//! Durable storage backends for the cart.
//!
//! The cart is persisted as a single JSON document:
//!
//! ```json
//! {"version": 1, "items": [{"product_id": 1, "name": "Wagyu Burger", ...}]}
//! ```
//!
//! There is exactly one "current cart" per installation; the document is not
//! keyed by user or session.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bistro_core::CartState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current layout version of the persisted cart document.
const CART_FORMAT_VERSION: u32 = 1;

/// Errors reading or writing the persisted cart.
///
/// These are logged and never surfaced to the customer; the in-memory cart
/// stays authoritative.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document was written by an incompatible version.
    #[error("unsupported cart format version {0}")]
    UnsupportedVersion(u32),

    /// The backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A place the cart can be saved to and restored from.
///
/// Implementations are called from a blocking thread, never from the task
/// that mutates the cart.
pub trait CartStorage: Send + Sync + 'static {
    /// Load the persisted cart, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document cannot be read or decoded.
    fn load(&self) -> Result<Option<CartState>, PersistenceError>;

    /// Replace the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or written.
    fn save(&self, cart: &CartState) -> Result<(), PersistenceError>;
}

#[derive(Serialize)]
struct CartDocumentRef<'a> {
    version: u32,
    items: &'a CartState,
}

#[derive(Deserialize)]
struct CartDocument {
    version: u32,
    #[serde(default)]
    items: CartState,
}

fn encode(cart: &CartState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&CartDocumentRef {
        version: CART_FORMAT_VERSION,
        items: cart,
    })?)
}

fn decode(raw: &str) -> Result<CartState, PersistenceError> {
    let document: CartDocument = serde_json::from_str(raw)?;
    if document.version != CART_FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(document.version));
    }
    Ok(document.items)
}

// =============================================================================
// FileCartStorage
// =============================================================================

/// Stores the cart as a JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write never leaves a truncated cart behind. The
/// temporary name carries the process id, so concurrent processes never
/// rename each other's partial writes.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    /// Create a storage backed by `path`. Parent directories are created on
    /// first save.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The file the cart is stored in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Option<CartState>, PersistenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, cart: &CartState) -> Result<(), PersistenceError> {
        let raw = encode(cart)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        std::fs::write(&temp, raw)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

// =============================================================================
// MemoryCartStorage
// =============================================================================

/// Keeps the encoded cart in memory.
///
/// Clones share the same slot, so a clone handed to a second [`CartStore`]
/// behaves like the same device after a restart. Writes can be switched to
/// fail to exercise the non-fatal persistence path.
///
/// [`CartStore`]: super::CartStore
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryCartStorage {
    /// Create an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The raw stored document, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Overwrite the raw stored document.
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw.into());
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<CartState>, PersistenceError> {
        self.raw().as_deref().map(decode).transpose()
    }

    fn save(&self, cart: &CartState) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "writes disabled".to_string(),
            ));
        }
        self.set_raw(encode(cart)?);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bistro_core::{Price, Product, ProductId};

    fn cart() -> CartState {
        let mut cart = CartState::new();
        cart.add(&Product {
            id: ProductId::new(3),
            name: "Tuna Tartare".to_string(),
            description: "Fresh and spicy".to_string(),
            price: Price::from_cents(1600),
            image_url: None,
            category: "Starters".to_string(),
            available: true,
        });
        cart
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bistro-cart-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_storage_missing_file_loads_none() {
        let storage = FileCartStorage::new(temp_dir("missing").join("cart.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_roundtrip_creates_parent_dirs() {
        let dir = temp_dir("roundtrip");
        let storage = FileCartStorage::new(dir.join("nested").join("cart.json"));

        storage.save(&cart()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(cart()));
        assert!(!storage.temp_path().exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_temp_file_is_per_process_sibling() {
        let storage = FileCartStorage::new("/var/lib/bistro/cart.json");
        let temp = storage.temp_path();

        assert_eq!(temp.parent(), storage.path().parent());
        assert_eq!(
            temp.file_name().unwrap().to_str().unwrap(),
            format!("cart.json.{}.tmp", std::process::id())
        );
    }

    #[test]
    fn test_file_storage_corrupt_document_is_an_error() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cart.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = FileCartStorage::new(&path);
        assert!(matches!(
            storage.load(),
            Err(PersistenceError::Serialization(_))
        ));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let storage = MemoryCartStorage::new();
        storage.set_raw(r#"{"version": 9, "items": []}"#);
        assert!(matches!(
            storage.load(),
            Err(PersistenceError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_memory_storage_clones_share_slot() {
        let storage = MemoryCartStorage::new();
        let other = storage.clone();
        storage.save(&cart()).unwrap();
        assert_eq!(other.load().unwrap(), Some(cart()));
    }

    #[test]
    fn test_memory_storage_failing_writes_keep_old_document() {
        let storage = MemoryCartStorage::new();
        storage.save(&CartState::new()).unwrap();
        storage.set_fail_writes(true);

        assert!(storage.save(&cart()).is_err());
        assert_eq!(storage.load().unwrap(), Some(CartState::new()));
    }
}
