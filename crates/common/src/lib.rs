//! Shared plumbing for the toko API crates: logging setup, Prometheus
//! metrics and small wire types used by more than one crate.

pub mod metrics;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }
}
