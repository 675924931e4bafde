//! Notation Core
//!
//! Reconstructs written notation from a serialized score document: the time
//! position of every entry, how tuplets nest and close, how entries group
//! into beams, and how ties connect notes.
//!
//! Layers build on each other bottom-up and never mutate what lies below:
//! records ([`models`]) → frames ([`frame`]) → cursors ([`navigator`]) →
//! beams and stems ([`beam`]) → ties ([`tie`]).

pub mod beam;
pub mod error;
pub mod frame;
pub mod models;
pub mod navigator;
pub mod tie;

// Re-export commonly used types
pub use error::{
    integrity_policy, report, set_integrity_observer, set_integrity_policy, DocumentError,
    IntegrityError, IntegrityObserver, IntegrityPolicy, Result,
};
pub use frame::{build_frame, iterate_entries, EntryFrame, EntryFramePtr, EntryInfo, FrameHoldContext, TupletInfo};
pub use models::{Document, DocumentPtr, RawDocument};
pub use navigator::{EntryCursor, NoteCursor};
pub use tie::{TieConnection, TieDirection, DEFAULT_TIE_SEARCH_LIMIT};
