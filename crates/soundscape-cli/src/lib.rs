//! Library surface of the soundscape CLI.
//!
//! The binary in `main.rs` parses arguments and dispatches into
//! [`commands`]; keeping the command implementations in the library makes
//! them testable without spawning the binary.

pub mod commands;
