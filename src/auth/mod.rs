//! PIN gate.
//!
//! The gate is a local screen lock: it decides whether the UI shows anything
//! beyond the login screen. The document itself is stored in plain JSON.
//!
//! Digests are PBKDF2-HMAC-SHA256 with a random salt, encoded as
//! `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`. Bare SHA-256 hex
//! digests written by older versions still verify and are rewritten in the
//! salted format after the first successful unlock.

pub mod session;

pub use session::SessionFlag;

use color_eyre::Result;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::storage::{KeyValueStore, PIN_DIGEST_KEY};
use crate::store::DocumentStore;

pub const DEFAULT_PIN_ITERATIONS: u32 = 100_000;
const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Why a PIN was rejected at entry time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PinError {
  #[error("Enter and confirm PIN")]
  Missing,
  #[error("PINs do not match")]
  Mismatch,
  #[error("PIN should be 4-6 digits")]
  Format,
}

/// Check the accepted PIN format: 4 to 6 ASCII digits.
pub fn validate_pin(pin: &str) -> Result<(), PinError> {
  if (4..=6).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit()) {
    Ok(())
  } else {
    Err(PinError::Format)
  }
}

/// A new PIN entered twice. Construction validates both entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSetup(String);

impl PinSetup {
  pub fn new(pin: &str, confirm: &str) -> Result<Self, PinError> {
    let pin = pin.trim();
    let confirm = confirm.trim();
    if pin.is_empty() || confirm.is_empty() {
      return Err(PinError::Missing);
    }
    if pin != confirm {
      return Err(PinError::Mismatch);
    }
    validate_pin(pin)?;
    Ok(Self(pin.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

/// Stores and checks the PIN digest.
pub struct CredentialGate<S: KeyValueStore + ?Sized> {
  backend: Arc<S>,
  iterations: u32,
}

impl<S: KeyValueStore + ?Sized> CredentialGate<S> {
  pub fn new(backend: Arc<S>) -> Self {
    Self {
      backend,
      iterations: DEFAULT_PIN_ITERATIONS,
    }
  }

  /// Set the PBKDF2 iteration count used for new digests.
  pub fn with_iterations(mut self, iterations: u32) -> Self {
    self.iterations = iterations.max(1);
    self
  }

  /// Whether a PIN digest is stored.
  pub fn is_configured(&self) -> Result<bool> {
    Ok(self.backend.get(PIN_DIGEST_KEY)?.is_some())
  }

  /// Store the digest of `pin`, replacing any previous one.
  pub fn set_pin(&self, pin: &str) -> Result<()> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let record = DigestRecord::Salted {
      iterations: self.iterations,
      salt: salt.to_vec(),
      hash: derive(pin, &salt, self.iterations).to_vec(),
    };
    self.backend.set(PIN_DIGEST_KEY, &record.encode())
  }

  /// Check `pin` against the stored digest. False when no PIN is set.
  pub fn verify(&self, pin: &str) -> Result<bool> {
    let Some(stored) = self.backend.get(PIN_DIGEST_KEY)? else {
      return Ok(false);
    };
    let Some(record) = DigestRecord::decode(&stored) else {
      warn!("stored PIN digest is unreadable");
      return Ok(false);
    };

    let matches = record.matches(pin);
    if matches && matches!(record, DigestRecord::Legacy(_)) {
      info!("upgrading legacy PIN digest");
      self.set_pin(pin)?;
    }
    Ok(matches)
  }

  /// Forget the PIN. Used only as part of [`reset_app`].
  fn clear(&self) -> Result<()> {
    self.backend.remove(PIN_DIGEST_KEY)
  }
}

/// Erase the PIN and every stored record, and end the session.
///
/// This is the recovery path for a forgotten PIN; it cannot be undone.
pub fn reset_app<S, T>(
  gate: &CredentialGate<S>,
  store: &mut DocumentStore<S>,
  session: &SessionFlag<T>,
) -> Result<()>
where
  S: KeyValueStore + ?Sized,
  T: KeyValueStore + ?Sized,
{
  gate.clear()?;
  store.clear()?;
  session.set_active(false)?;
  info!("app reset: PIN and data cleared");
  Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DigestRecord {
  Salted {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
  },
  /// Unsalted SHA-256 from older versions
  Legacy(Vec<u8>),
}

impl DigestRecord {
  fn encode(&self) -> String {
    match self {
      DigestRecord::Salted {
        iterations,
        salt,
        hash,
      } => format!(
        "{}${}${}${}",
        SCHEME,
        iterations,
        hex::encode(salt),
        hex::encode(hash)
      ),
      DigestRecord::Legacy(hash) => hex::encode(hash),
    }
  }

  fn decode(raw: &str) -> Option<Self> {
    let raw = raw.trim();
    if !raw.contains('$') {
      let hash = hex::decode(raw).ok()?;
      return (hash.len() == HASH_LEN).then_some(DigestRecord::Legacy(hash));
    }

    let mut parts = raw.split('$');
    if parts.next()? != SCHEME {
      return None;
    }
    let iterations: u32 = parts.next()?.parse().ok()?;
    let salt = hex::decode(parts.next()?).ok()?;
    let hash = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() || iterations == 0 || hash.len() != HASH_LEN {
      return None;
    }

    Some(DigestRecord::Salted {
      iterations,
      salt,
      hash,
    })
  }

  fn matches(&self, pin: &str) -> bool {
    match self {
      DigestRecord::Salted {
        iterations,
        salt,
        hash,
      } => derive(pin, salt, *iterations)
        .as_slice()
        .ct_eq(hash.as_slice())
        .into(),
      DigestRecord::Legacy(hash) => Sha256::digest(pin.as_bytes())
        .as_slice()
        .ct_eq(hash.as_slice())
        .into(),
    }
  }
}

fn derive(pin: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
  let mut out = [0u8; HASH_LEN];
  pbkdf2::pbkdf2_hmac::<Sha256>(pin.as_bytes(), salt, iterations, &mut out);
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::{MemoryStorage, DOCUMENT_KEY};

  fn gate() -> (Arc<MemoryStorage>, CredentialGate<MemoryStorage>) {
    let backend = Arc::new(MemoryStorage::new());
    let gate = CredentialGate::new(backend.clone()).with_iterations(1_000);
    (backend, gate)
  }

  #[test]
  fn test_verify_without_pin_is_false() {
    let (_backend, gate) = gate();
    assert!(!gate.is_configured().unwrap());
    assert!(!gate.verify("1234").unwrap());
    assert!(!gate.verify("").unwrap());
  }

  #[test]
  fn test_verify_accepts_only_latest_pin() {
    let (_backend, gate) = gate();
    gate.set_pin("1234").unwrap();
    assert!(gate.is_configured().unwrap());
    assert!(gate.verify("1234").unwrap());
    assert!(!gate.verify("4321").unwrap());

    gate.set_pin("987654").unwrap();
    assert!(gate.verify("987654").unwrap());
    assert!(!gate.verify("1234").unwrap());
  }

  #[test]
  fn test_digest_is_salted() {
    let (backend, gate) = gate();
    gate.set_pin("1234").unwrap();
    let first = backend.get(PIN_DIGEST_KEY).unwrap().unwrap();
    gate.set_pin("1234").unwrap();
    let second = backend.get(PIN_DIGEST_KEY).unwrap().unwrap();

    assert!(first.starts_with("pbkdf2-sha256$1000$"));
    assert_ne!(first, second);
    assert!(!first.contains("1234$"));
  }

  #[test]
  fn test_legacy_digest_verifies_and_upgrades() {
    let (backend, gate) = gate();
    let legacy = hex::encode(Sha256::digest(b"2468"));
    backend.set(PIN_DIGEST_KEY, &legacy).unwrap();

    assert!(!gate.verify("1357").unwrap());
    assert_eq!(backend.get(PIN_DIGEST_KEY).unwrap().unwrap(), legacy);

    assert!(gate.verify("2468").unwrap());
    let upgraded = backend.get(PIN_DIGEST_KEY).unwrap().unwrap();
    assert!(upgraded.starts_with("pbkdf2-sha256$"));
    assert!(gate.verify("2468").unwrap());
  }

  #[test]
  fn test_digest_match_compares_every_byte() {
    let salt = [7u8; SALT_LEN];
    let mut hash = derive("1234", &salt, 1_000).to_vec();
    let record = DigestRecord::Salted {
      iterations: 1_000,
      salt: salt.to_vec(),
      hash: hash.clone(),
    };
    assert!(record.matches("1234"));

    hash[HASH_LEN - 1] ^= 1;
    let tampered = DigestRecord::Salted {
      iterations: 1_000,
      salt: salt.to_vec(),
      hash,
    };
    assert!(!tampered.matches("1234"));

    let mut legacy = Sha256::digest(b"1234").to_vec();
    assert!(DigestRecord::Legacy(legacy.clone()).matches("1234"));
    legacy[0] ^= 1;
    assert!(!DigestRecord::Legacy(legacy).matches("1234"));
  }

  #[test]
  fn test_garbage_digest_never_verifies() {
    let (backend, gate) = gate();
    backend.set(PIN_DIGEST_KEY, "pbkdf2-sha256$x$zz$yy").unwrap();
    assert!(!gate.verify("1234").unwrap());
  }

  #[test]
  fn test_validate_pin() {
    assert!(validate_pin("1234").is_ok());
    assert!(validate_pin("123456").is_ok());
    assert_eq!(validate_pin("123"), Err(PinError::Format));
    assert_eq!(validate_pin("1234567"), Err(PinError::Format));
    assert_eq!(validate_pin("12a4"), Err(PinError::Format));
    assert_eq!(validate_pin("١٢٣٤"), Err(PinError::Format));
  }

  #[test]
  fn test_pin_setup() {
    assert_eq!(PinSetup::new("", "1234"), Err(PinError::Missing));
    assert_eq!(PinSetup::new("1234", "1235"), Err(PinError::Mismatch));
    assert_eq!(PinSetup::new("12", "12"), Err(PinError::Format));
    assert_eq!(PinSetup::new(" 1234 ", "1234").unwrap().as_str(), "1234");
  }

  #[test]
  fn test_reset_clears_pin_data_and_session() {
    let (backend, gate) = gate();
    let mut store = DocumentStore::new(backend.clone()).unwrap();
    let session = SessionFlag::new(Arc::new(MemoryStorage::new()));

    gate.set_pin("1234").unwrap();
    store.update(|doc| doc.jobs.clear()).unwrap();
    session.set_active(true).unwrap();

    reset_app(&gate, &mut store, &session).unwrap();

    assert!(!gate.is_configured().unwrap());
    assert!(!gate.verify("1234").unwrap());
    assert!(!session.is_active().unwrap());
    // Reseeded document is both live and persisted
    assert_eq!(store.document().jobs.len(), 1);
    assert!(backend.get(DOCUMENT_KEY).unwrap().is_some());
  }
}
