//! Wire-contract regression tests for the try-on service.
//!
//! All checks live in `tests/`; this library target is intentionally empty.
