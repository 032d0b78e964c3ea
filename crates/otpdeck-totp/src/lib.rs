//! # otpdeck: TOTP Authenticator Core
//!
//! Time-based one-time password subsystem:
//!
//! - **RFC 4226 / 6238**: TOTP generation with SHA-1, SHA-256, SHA-512
//! - **otpauth:// URIs**: Parsing with strict label/issuer validation, and URI building
//! - **Entry store**: Persisted, insertion-ordered URI collection (JSON file or memory)
//! - **Refresh loop**: Periodic regeneration of every displayed code on tokio
//! - **Host capabilities**: Time source and message catalog are supplied as traits

pub mod totp;
