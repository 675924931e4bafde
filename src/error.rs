//! Error types and the integrity-fault hook
//!
//! Two classes of failure exist. Integrity faults describe a document that
//! references records it does not contain; they are reported through
//! [`report`], which logs them and, depending on the process-wide
//! [`IntegrityPolicy`], either lets the query continue with a null/default
//! result or turns the fault into an `Err` that aborts the current query.
//! Contract violations (bad cursor indices and the like) are caller bugs and
//! panic.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::models::{Cmper, EntryNumber, LayerIndex};

/// Integrity faults found while reading a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A record referenced by another record does not exist
    #[error("{kind} record {key} referenced by {referrer} does not exist")]
    MissingRecord {
        kind: &'static str,
        key: String,
        referrer: String,
    },

    /// A frame hold layer points at a frame that does not exist
    #[error("frame hold for staff {staff} measure {measure} layer {} points to non-existent frame {frame}", .layer + 1)]
    MissingFrame {
        staff: Cmper,
        measure: Cmper,
        layer: LayerIndex,
        frame: Cmper,
    },

    /// The composite staff for a position could not be constructed
    #[error("unable to construct staff {staff} for measure {measure} in part {part}")]
    UnconstructibleStaff {
        part: Cmper,
        staff: Cmper,
        measure: Cmper,
    },

    /// Required document-wide options are missing
    #[error("document contains no {0}")]
    MissingOptions(&'static str),

    /// A record exists but its contents are inconsistent
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl IntegrityError {
    pub fn missing_entry(entry: EntryNumber, referrer: impl Into<String>) -> Self {
        IntegrityError::MissingRecord {
            kind: "entry",
            key: entry.to_string(),
            referrer: referrer.into(),
        }
    }
}

/// Failure to load a document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Result type for every query that can meet an integrity fault
pub type Result<T> = std::result::Result<T, IntegrityError>;

/// What happens after an integrity fault has been logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum IntegrityPolicy {
    /// Log and keep going with a null, empty or default result
    #[default]
    Tolerate = 0,
    /// Log and abort the current top-level query with `Err`
    Escalate = 1,
}

static POLICY: AtomicU8 = AtomicU8::new(IntegrityPolicy::Tolerate as u8);

pub type IntegrityObserver = Box<dyn Fn(&IntegrityError) + Send + Sync>;

static OBSERVER: Lazy<RwLock<Option<IntegrityObserver>>> = Lazy::new(|| RwLock::new(None));

/// Set the process-wide integrity policy
pub fn set_integrity_policy(policy: IntegrityPolicy) {
    POLICY.store(policy as u8, Ordering::SeqCst);
}

pub fn integrity_policy() -> IntegrityPolicy {
    match POLICY.load(Ordering::SeqCst) {
        1 => IntegrityPolicy::Escalate,
        _ => IntegrityPolicy::Tolerate,
    }
}

/// Install an observer that sees every reported integrity fault.
/// Passing `None` removes the current observer.
pub fn set_integrity_observer(observer: Option<IntegrityObserver>) {
    match OBSERVER.write() {
        Ok(mut slot) => *slot = observer,
        Err(poisoned) => *poisoned.into_inner() = observer,
    }
}

/// Report an integrity fault.
///
/// Returns `Ok(())` when the fault is tolerated, so call sites read
/// `report(err)?;` followed by their fallback result.
pub fn report(err: IntegrityError) -> Result<()> {
    log::warn!("integrity error: {}", err);
    if let Ok(slot) = OBSERVER.read() {
        if let Some(observer) = slot.as_ref() {
            observer(&err);
        }
    }
    match integrity_policy() {
        IntegrityPolicy::Tolerate => Ok(()),
        IntegrityPolicy::Escalate => Err(err),
    }
}
