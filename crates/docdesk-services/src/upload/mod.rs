//! Batch uploads into object store collections.

pub mod guard;
pub mod selection;
pub mod tracker;

pub use guard::CollectionGuard;
pub use selection::FileSelection;
pub use tracker::UploadTracker;
