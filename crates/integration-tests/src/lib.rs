//! HTTP-level tests live under `tests/`; this crate exports nothing.
