//! Data models for the application
//!
//! Upload tracking types, stored-object listings, metadata tags, and the JSON
//! documents kept in the extraction-field registries.

mod persona;
mod quality;
mod query_set;
mod results;
mod storage;
mod tags;
mod upload;

pub use persona::*;
pub use quality::*;
pub use query_set::*;
pub use results::*;
pub use storage::*;
pub use tags::*;
pub use upload::*;
