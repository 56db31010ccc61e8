//! Orbital probability sampling and caching engine.
//!
//! Turns the closed-form probability density of hydrogen-like atomic
//! orbitals into discrete particle samples and scalar density fields fit for
//! real-time visualization, without re-running the quantum mechanics on
//! every frame:
//!
//! 1. **Evaluation** – radial (associated Laguerre) and angular (associated
//!    Legendre / real spherical harmonic) wavefunctions by iterative
//!    recurrence, for arbitrary quantum numbers.
//! 2. **Distributions** – normalized radial and angular CDFs for
//!    inverse-transform sampling, memoized per quantum state in bounded
//!    LRU caches.
//! 3. **Sampling** – pooled Cartesian particle draws, nodal surface
//!    descriptors, isosurface density grids, and a two-center LCAO variant.
//!
//! Work runs on background computation workers ([`worker::WorkerHandle`]),
//! each owning a private engine instance, spoken to through correlated
//! request/response messages.

pub mod cache;
pub mod distribution;
pub mod engine;
pub mod field;
pub mod molecular;
pub mod nodal;
pub mod quantum;
pub mod sampler;
pub mod worker;

pub use cache::{DistributionCache, OrbitalDistribution};
pub use distribution::{AngularDistribution, Flavor, RadialDistribution};
pub use engine::{
    DensityFieldResult, EngineConfig, OrbitalEngine, OrbitalSamplingResult, Request, Response,
};
pub use molecular::{Combination, MolecularOrbitalSampler};
pub use nodal::NodalSurfaces;
pub use quantum::{QuantumNumbers, Spin};
pub use sampler::ParticleSampler;
pub use worker::{ResponseEnvelope, WorkerHandle};
