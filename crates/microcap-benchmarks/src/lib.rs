//! Smoke benchmarks for the capture store; see `tests/nfr_smoke.rs`.
