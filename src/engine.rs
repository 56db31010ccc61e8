/// Engine facade: one sampling engine instance owning all caches, plus the
/// request/response types spoken over the worker boundary.
///
/// Engines are constructor-injected rather than global so every worker holds
/// a private instance and no locking is needed anywhere in the sampling
/// path. Invalid quantum states never error out of `sample`; the renderer
/// always gets something inert to display.

use crate::cache::DistributionCache;
use crate::distribution::Flavor;
use crate::field::DensityFieldCache;
use crate::nodal::{self, NodalSurfaces};
use crate::quantum::QuantumNumbers;
use crate::sampler::ParticleSampler;
use serde::{Deserialize, Serialize};

/// Extent handed back for unsampleable states so the scene keeps a sane
/// camera framing.
const FALLBACK_EXTENT: f64 = 3.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub flavor: Flavor,
    /// Attach a default-resolution density field to every sample response.
    pub include_density_field: bool,
    pub radial_capacity: usize,
    pub angular_capacity: usize,
    pub orbital_capacity: usize,
    pub field_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            flavor: Flavor::Exact,
            include_density_field: false,
            radial_capacity: 64,
            angular_capacity: 64,
            orbital_capacity: 64,
            field_capacity: 16,
        }
    }
}

/// Requests accepted by a computation worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Request {
    Sample {
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        count: usize,
        is_dark: bool,
    },
    OutlineField {
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        extent: f64,
        max_probability: f64,
        resolution: Option<usize>,
    },
    NodalData {
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        extent: f64,
    },
    ClearCaches,
}

/// Responses, one success and one message-only error variant per request
/// kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Response {
    Sample(OrbitalSamplingResult),
    SampleError { message: String },
    OutlineField(DensityFieldResult),
    OutlineFieldError { message: String },
    NodalData(NodalSurfaces),
    NodalDataError { message: String },
    ClearCachesAck,
    ClearCachesError { message: String },
}

/// Everything the renderer needs for one orbital. Buffers transfer
/// ownership; only `all_valid_positions` is meant to outlive the first
/// frame, as the teleport-target pool for animated rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitalSamplingResult {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub base_positions: Vec<[f32; 3]>,
    pub all_valid_positions: Vec<[f32; 3]>,
    pub extent: f64,
    pub max_probability: f64,
    pub nodal: NodalSurfaces,
    pub density_field: Option<DensityFieldResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityFieldResult {
    pub extent: f64,
    pub resolution: usize,
    pub field: Vec<f32>,
    pub max_sample: f64,
    pub max_probability: f64,
    pub iso_level: f64,
}

pub struct OrbitalEngine {
    config: EngineConfig,
    distributions: DistributionCache,
    fields: DensityFieldCache,
    sampler: ParticleSampler,
}

impl OrbitalEngine {
    pub fn new(config: EngineConfig) -> Self {
        let distributions = DistributionCache::new(
            config.flavor,
            config.radial_capacity,
            config.angular_capacity,
            config.orbital_capacity,
        );
        let fields = DensityFieldCache::new(config.flavor, config.field_capacity);
        OrbitalEngine {
            config,
            distributions,
            fields,
            sampler: ParticleSampler::new(),
        }
    }

    /// Dispatch one protocol request to the matching operation.
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::Sample {
                z,
                n,
                l,
                m,
                count,
                is_dark,
            } => Response::Sample(self.sample(z, n, l, m, count, is_dark)),
            Request::OutlineField {
                z,
                n,
                l,
                m,
                extent,
                max_probability,
                resolution,
            } => match self.outline_field(z, n, l, m, extent, max_probability, resolution) {
                Ok(result) => Response::OutlineField(result),
                Err(message) => Response::OutlineFieldError { message },
            },
            Request::NodalData { z, n, l, m, extent } => {
                match self.nodal_data(z, n, l, m, extent) {
                    Ok(result) => Response::NodalData(result),
                    Err(message) => Response::NodalDataError { message },
                }
            }
            Request::ClearCaches => {
                self.clear_caches();
                Response::ClearCachesAck
            }
        }
    }

    /// Sample `count` particles for one quantum state. Invalid states come
    /// back as an inert zero-filled result rather than an error, so the
    /// rendering layer always has something to display.
    pub fn sample(
        &mut self,
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        count: usize,
        is_dark: bool,
    ) -> OrbitalSamplingResult {
        let qn = match QuantumNumbers::new(n, l, m) {
            Some(qn) => qn,
            None => {
                log::warn!("rejecting invalid quantum state n={n} l={l} m={m}");
                return OrbitalSamplingResult {
                    positions: Vec::new(),
                    colors: Vec::new(),
                    base_positions: Vec::new(),
                    all_valid_positions: Vec::new(),
                    extent: FALLBACK_EXTENT,
                    max_probability: 1.0,
                    nodal: NodalSurfaces::default(),
                    density_field: None,
                };
            }
        };

        let z = z.max(1);
        let dist = self.distributions.orbital(z, qn);
        let mut rng = rand::thread_rng();
        let buffers = self
            .sampler
            .draw(z, n, l, m, &dist, count, is_dark, &mut rng);

        let nodal = nodal::nodal_surfaces(n, l, m, z, dist.extent);

        let density_field = if self.config.include_density_field {
            let field = self
                .fields
                .field(z, n, l, m, dist.extent, dist.max_probability, None);
            Some(field_result(&field))
        } else {
            None
        };

        OrbitalSamplingResult {
            positions: buffers.positions,
            colors: buffers.colors,
            base_positions: buffers.base_positions,
            all_valid_positions: buffers.all_valid_positions,
            extent: dist.extent,
            max_probability: dist.max_probability,
            nodal,
            density_field,
        }
    }

    /// Density grid for isosurface extraction, keyed by state and validated
    /// against the caller-provided extent and normalization.
    pub fn outline_field(
        &mut self,
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        extent: f64,
        max_probability: f64,
        resolution: Option<usize>,
    ) -> Result<DensityFieldResult, String> {
        if QuantumNumbers::new(n, l, m).is_none() {
            return Err(format!("invalid quantum state n={n} l={l} m={m}"));
        }
        if !(extent.is_finite() && extent > 0.0) {
            return Err(format!("invalid extent {extent}"));
        }
        if !(max_probability.is_finite() && max_probability > 0.0) {
            return Err(format!("invalid max probability {max_probability}"));
        }

        let field = self
            .fields
            .field(z.max(1), n, l, m, extent, max_probability, resolution);
        Ok(field_result(&field))
    }

    pub fn nodal_data(
        &mut self,
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        extent: f64,
    ) -> Result<NodalSurfaces, String> {
        if QuantumNumbers::new(n, l, m).is_none() {
            return Err(format!("invalid quantum state n={n} l={l} m={m}"));
        }
        Ok(nodal::nodal_surfaces(n, l, m, z.max(1), extent))
    }

    /// Drop every cached distribution, pool, and grid.
    pub fn clear_caches(&mut self) {
        self.distributions.clear();
        self.fields.clear();
        self.sampler.clear();
    }

    pub fn cached_entry_count(&self) -> usize {
        self.distributions.entry_count() + self.fields.entry_count()
    }
}

fn field_result(field: &crate::field::DensityField) -> DensityFieldResult {
    DensityFieldResult {
        extent: field.extent,
        resolution: field.resolution,
        field: field.values.clone(),
        max_sample: field.max_sample,
        max_probability: field.max_probability,
        iso_level: field.iso_level,
    }
}
