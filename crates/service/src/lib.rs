//! Core of the toko API.
//! - `geo`: geodesic distance on the WGS-84 ellipsoid.
//! - `toko`: the record model, the positional collection and the nearby query.
//! - `storage`: the whole-document persistence gateway and its backends.

pub mod errors;
pub mod geo;
pub mod storage;
pub mod toko;
