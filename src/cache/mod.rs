//! Cache Module
//!
//! Expiration and read-only metadata layered over a raw storage engine.

mod clock;
mod entry;
mod options;
pub mod record;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::Entry;
pub use options::SetOptions;
pub use store::EntryStore;
