//! Source invariant checks for the flare-attestation workspace.
//!
//! All checks live in `tests/security_invariants.rs`.
