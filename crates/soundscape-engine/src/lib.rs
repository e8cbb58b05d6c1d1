//! Soundscape Placement Engine
//!
//! This crate turns declarative scenes into concrete soundscapes:
//!
//! - [`sampler`] - the single dispatch evaluating distribution
//!   descriptors against a seeded generator
//! - [`placement`] - constraint-checked event placement with a counted
//!   trial budget
//! - [`assembly`] - mix specification construction (timing and gain
//!   only; DSP stays with the external render collaborator)
//! - [`source`] - the catalog seam for source folders and durations
//! - [`rng`] - deterministic PCG32 construction
//!
//! # Determinism
//!
//! Generation is deterministic: given the same scene and seed, the
//! produced soundscape is identical, bit for bit. All randomness flows
//! through one PCG32 generator created from the caller's seed; there is
//! no global random state. Independent soundscapes generated from
//! independently derived seeds can safely run on separate threads; no
//! state is shared.
//!
//! # Example
//!
//! ```
//! use soundscape_engine::{instantiate, MemoryCatalog};
//! use soundscape_spec::{DistributionSpec, EventSpec, Scene};
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog.add_file("fg/siren", "fg/siren/wail.wav", 5.0);
//!
//! let scene = Scene::builder(10.0)
//!     .max_polyphony(1)
//!     .event(EventSpec::foreground(
//!         DistributionSpec::constant("siren"),
//!         DistributionSpec::choose_file("fg/siren"),
//!         DistributionSpec::constant(0.0),
//!         DistributionSpec::uniform(0.0, 8.0),
//!         DistributionSpec::constant(2.0),
//!         DistributionSpec::constant(6.0),
//!     ))
//!     .build();
//!
//! let result = instantiate(&scene, 42, &catalog).unwrap();
//! assert_eq!(result.soundscape.events.len(), 1);
//! ```

pub mod assembly;
pub mod error;
pub mod placement;
pub mod rng;
pub mod sampler;
pub mod source;

// Re-export main types at crate root
pub use assembly::{build_mix, MixSegment, MixSpec};
pub use error::{Constraint, EngineError, EngineResult};
pub use placement::{instantiate, InstantiateResult, SkippedEvent};
pub use rng::create_rng;
pub use sampler::{sample, sample_f64, sample_text, MAX_REJECTION_DRAWS};
pub use source::{FsCatalog, MemoryCatalog, SourceCatalog};
