/// Scalar density fields for isosurface extraction.
///
/// Samples the probability density on a cubic grid spanning
/// [-extent, extent]^3, normalized against the orbital's max probability.
/// Grids are cached per quantum state and reused while the request stays
/// within the cached resolution and drift tolerances; cost grows with
/// resolution^3, so the resolution policy clamps requests hard.

use crate::cache::BoundedCache;
use crate::distribution::Flavor;
use crate::quantum;
use std::sync::Arc;

/// Smallest grid side the policy will compute.
const RESOLUTION_FLOOR: usize = 36;
/// Default grid side when the request leaves resolution unspecified.
const RESOLUTION_DEFAULT: usize = 72;

const EXTENT_TOLERANCE: f64 = 1e-3;
const MAX_PROBABILITY_TOLERANCE: f64 = 0.02;

/// Resolve a requested grid side against the policy: floor 36, flavor-capped
/// upper bound (Stylized 150, Exact 180).
pub fn resolve_resolution(requested: Option<usize>, flavor: Flavor) -> usize {
    requested
        .unwrap_or(RESOLUTION_DEFAULT)
        .clamp(RESOLUTION_FLOOR, flavor.resolution_cap())
}

/// A cubic grid of normalized density samples. Values are laid out
/// x-fastest: index = x + resolution*y + resolution^2*z.
#[derive(Debug, Clone)]
pub struct DensityField {
    pub resolution: usize,
    pub values: Vec<f32>,
    pub max_sample: f64,
    pub max_probability: f64,
    pub extent: f64,
    pub iso_level: f64,
}

impl DensityField {
    /// Sample the grid and derive the isosurface threshold from the observed
    /// maximum.
    pub fn build(
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        extent: f64,
        max_probability: f64,
        resolution: usize,
    ) -> Self {
        let resolution = resolution.max(2);
        let norm = max_probability.max(f64::MIN_POSITIVE);
        let step = 2.0 * extent / (resolution - 1) as f64;

        let mut values = Vec::with_capacity(resolution * resolution * resolution);
        let mut max_sample = 0.0_f64;

        for iz in 0..resolution {
            let pz = -extent + step * iz as f64;
            for iy in 0..resolution {
                let py = -extent + step * iy as f64;
                for ix in 0..resolution {
                    let px = -extent + step * ix as f64;
                    let d = quantum::density(n, l, m, z, px, py, pz) / norm;
                    if d > max_sample {
                        max_sample = d;
                    }
                    values.push(d as f32);
                }
            }
        }

        let iso_level = (max_sample * 0.45).clamp(0.05, 0.36);

        DensityField {
            resolution,
            values,
            max_sample,
            max_probability,
            extent,
            iso_level,
        }
    }
}

/// Caches density fields by quantum state. A cached grid satisfies a request
/// when its resolution is at least the effective requested one and neither
/// extent nor max probability drifted past tolerance.
pub struct DensityFieldCache {
    flavor: Flavor,
    grids: BoundedCache<(u32, u32, u32, i32), Arc<DensityField>>,
}

impl DensityFieldCache {
    pub fn new(flavor: Flavor, capacity: usize) -> Self {
        DensityFieldCache {
            flavor,
            grids: BoundedCache::new(capacity),
        }
    }

    pub fn field(
        &mut self,
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        extent: f64,
        max_probability: f64,
        requested_resolution: Option<usize>,
    ) -> Arc<DensityField> {
        let resolution = resolve_resolution(requested_resolution, self.flavor);
        let key = (z, n, l, m);

        if let Some(cached) = self.grids.get(&key) {
            if is_fresh(cached, extent, max_probability, resolution) {
                return Arc::clone(cached);
            }
        }

        log::debug!(
            "building {resolution}^3 density field for z={z} n={n} l={l} m={m} extent={extent:.3}"
        );
        let built = Arc::new(DensityField::build(
            z,
            n,
            l,
            m,
            extent,
            max_probability,
            resolution,
        ));
        self.grids.insert(key, Arc::clone(&built));
        built
    }

    pub fn clear(&mut self) {
        self.grids.clear();
    }

    pub fn entry_count(&self) -> usize {
        self.grids.len()
    }
}

fn is_fresh(cached: &DensityField, extent: f64, max_probability: f64, resolution: usize) -> bool {
    if cached.resolution < resolution {
        return false;
    }
    if (cached.extent - extent).abs() > EXTENT_TOLERANCE {
        return false;
    }
    let reference = max_probability.max(f64::MIN_POSITIVE);
    (cached.max_probability - max_probability).abs() / reference <= MAX_PROBABILITY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_policy_clamps() {
        assert_eq!(resolve_resolution(None, Flavor::Exact), 72);
        assert_eq!(resolve_resolution(Some(10), Flavor::Exact), 36);
        assert_eq!(resolve_resolution(Some(200), Flavor::Stylized), 150);
        assert_eq!(resolve_resolution(Some(200), Flavor::Exact), 180);
        assert_eq!(resolve_resolution(Some(100), Flavor::Stylized), 100);
    }

    #[test]
    fn test_field_shape_and_normalization() {
        // 1s with its true peak density: normalized samples stay within [0, 1].
        let field = DensityField::build(1, 1, 0, 0, 6.0, 1.0 / std::f64::consts::PI, 36);
        assert_eq!(field.values.len(), 36 * 36 * 36);
        assert!(field.max_sample <= 1.0 + 1e-9);
        assert!(field.max_sample > 0.0);
        assert!(field.iso_level >= 0.05 && field.iso_level <= 0.36);
    }

    #[test]
    fn test_field_center_sample_is_peak_for_1s() {
        let res = 37; // odd, so one sample lands exactly at the origin
        let field = DensityField::build(1, 1, 0, 0, 6.0, 1.0 / std::f64::consts::PI, res);
        let mid = res / 2;
        let center = field.values[mid + res * mid + res * res * mid] as f64;
        assert!((center - field.max_sample).abs() < 1e-6);
    }

    #[test]
    fn test_cache_reuses_higher_resolution_grid() {
        let mut cache = DensityFieldCache::new(Flavor::Exact, 4);
        let high = cache.field(1, 1, 0, 0, 6.0, 0.3, Some(48));
        let low = cache.field(1, 1, 0, 0, 6.0, 0.3, Some(36));
        assert!(Arc::ptr_eq(&high, &low));
        assert_eq!(low.resolution, 48);
    }

    #[test]
    fn test_cache_rebuilds_on_extent_drift() {
        let mut cache = DensityFieldCache::new(Flavor::Exact, 4);
        let first = cache.field(1, 2, 1, 0, 10.0, 0.01, Some(36));
        let second = cache.field(1, 2, 1, 0, 10.5, 0.01, Some(36));
        assert!(!Arc::ptr_eq(&first, &second));
        assert!((second.extent - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_cache_rebuilds_on_probability_drift() {
        let mut cache = DensityFieldCache::new(Flavor::Exact, 4);
        let first = cache.field(1, 2, 1, 0, 10.0, 0.01, Some(36));
        let second = cache.field(1, 2, 1, 0, 10.0, 0.02, Some(36));
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_stylized_request_never_runs_at_raw_resolution() {
        let mut cache = DensityFieldCache::new(Flavor::Stylized, 4);
        let field = cache.field(1, 1, 0, 0, 6.0, 0.3, Some(200));
        assert!(field.resolution <= 150);
    }
}
