//! No public API; see `tests/` for the end-to-end scenarios this crate hosts.
