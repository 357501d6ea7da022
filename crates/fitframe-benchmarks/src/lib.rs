//! Performance smoke checks for the deterministic widget pipeline.
//!
//! All checks live in `tests/`; this library target is intentionally empty.
