//! Soundscape Render Adapter
//!
//! This crate is the external-collaborator boundary: it translates a mix
//! specification (timing + gain, produced by `soundscape-engine`) into
//! invocations of an external audio tool. The core requires exactly four
//! operations (trim, pitch shift, time stretch, mix), captured by the
//! [`Renderer`] trait; [`SoxRenderer`] implements them by spawning SoX
//! as a blocking subprocess per operation.
//!
//! Rendering is atomic per soundscape: either the full mixture is
//! produced or a [`RenderError`] names the failing operation. The core
//! never retries a render (external process invocation is not
//! idempotent), and a render failure does not invalidate the annotation
//! or mix specification that produced it.

pub mod adapter;
pub mod error;
pub mod sox;

// Re-export main types at crate root
pub use adapter::{render, MixTrack, RenderBuffer, Renderer};
pub use error::{RenderError, RenderResult};
pub use sox::{find_sox, SoxConfig, SoxRenderer, DEFAULT_TIMEOUT_SECS};
