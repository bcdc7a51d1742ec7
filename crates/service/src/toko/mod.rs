//! Store ("toko") records, the positional collection that owns them and the
//! nearby query over it.
//!
//! A record's identifier is its position in the collection. Removing index `k`
//! shifts every later record down by one, so indices are not stable IDs.

pub mod collection;
pub mod model;
pub mod service;

pub use collection::TokoCollection;
pub use model::Toko;
pub use service::TokoService;
