/// Particle sampling via inverse-CDF lookup.
///
/// Draws Cartesian positions from an assembled orbital distribution and
/// maintains an oversized, reusable pool so repeated requests for the same
/// state resample instead of rebuilding. Pool freshness is a tolerance
/// predicate on extent and max probability, applied after the exact-keyed
/// state match.

use crate::cache::OrbitalDistribution;
use rand::Rng;
use std::f64::consts::PI;

/// Pool oversize factor relative to the requested particle count.
const POOL_OVERSIZE: f64 = 1.15;
/// Absolute tolerance on extent drift before the pool is rebuilt.
const EXTENT_TOLERANCE: f64 = 1e-3;
/// Relative tolerance on max-probability drift before the pool is rebuilt.
const MAX_PROBABILITY_TOLERANCE: f64 = 0.02;

/// Inverse-transform draw: binary search for the bracketing CDF interval,
/// then interpolate linearly inside it.
pub fn draw_from_cdf<R: Rng>(values: &[f64], cdf: &[f64], rng: &mut R) -> f64 {
    if values.is_empty() || cdf.is_empty() {
        return 0.0;
    }
    let u = rng.gen::<f64>();
    let idx = match cdf.binary_search_by(|v| v.partial_cmp(&u).unwrap()) {
        Ok(i) => i,
        Err(i) => i.min(cdf.len() - 1),
    };
    if idx == 0 {
        return values[0];
    }
    let c0 = cdf[idx - 1];
    let c1 = cdf[idx];
    let v0 = values[idx - 1];
    let v1 = values[idx];
    let t = if c1 > c0 { (u - c0) / (c1 - c0) } else { 0.0 };
    v0 + (v1 - v0) * t
}

/// One Cartesian draw from the orbital distribution: r and theta through
/// their CDFs, phi through its CDF when one exists, uniformly otherwise.
pub fn sample_position<R: Rng>(dist: &OrbitalDistribution, rng: &mut R) -> [f64; 3] {
    let r = draw_from_cdf(&dist.radial.radii, &dist.radial.cdf, rng);
    let theta = draw_from_cdf(&dist.angular.theta.values, &dist.angular.theta.cdf, rng);
    let phi = match &dist.angular.phi {
        Some(table) => draw_from_cdf(&table.values, &table.cdf, rng),
        None => rng.gen::<f64>() * 2.0 * PI,
    };

    let (sin_theta, cos_theta) = theta.sin_cos();
    [
        r * sin_theta * phi.cos(),
        r * sin_theta * phi.sin(),
        r * cos_theta,
    ]
}

/// Base particle color for the active theme.
pub fn base_color(is_dark: bool) -> [f32; 3] {
    if is_dark {
        [0.62, 0.76, 1.0]
    } else {
        [0.17, 0.32, 0.6]
    }
}

/// Reusable set of Cartesian points drawn from one orbital distribution.
pub struct SamplePool {
    state: (u32, u32, u32, i32),
    points: Vec<[f64; 3]>,
    extent: f64,
    max_probability: f64,
}

/// Buffers handed to the renderer. Positions are duplicated into a base
/// buffer the renderer can animate against; the full pool rides along as the
/// teleport-target set.
pub struct SampleBuffers {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub base_positions: Vec<[f32; 3]>,
    pub all_valid_positions: Vec<[f32; 3]>,
}

#[derive(Default)]
pub struct ParticleSampler {
    pool: Option<SamplePool>,
}

impl ParticleSampler {
    pub fn new() -> Self {
        ParticleSampler { pool: None }
    }

    /// Drop the cached pool (used by cache clearing).
    pub fn clear(&mut self) {
        self.pool = None;
    }

    /// Number of points currently pooled, if any.
    pub fn pool_len(&self) -> usize {
        self.pool.as_ref().map_or(0, |p| p.points.len())
    }

    /// Produce `count` output samples for the given state, reusing the pool
    /// when it is big enough and neither extent nor max probability drifted
    /// past tolerance.
    pub fn draw<R: Rng>(
        &mut self,
        z: u32,
        n: u32,
        l: u32,
        m: i32,
        dist: &OrbitalDistribution,
        count: usize,
        is_dark: bool,
        rng: &mut R,
    ) -> SampleBuffers {
        let state = (z, n, l, m);
        if !self.pool_is_fresh(state, dist, count) {
            self.rebuild_pool(state, dist, count, rng);
        }
        let pool = match &self.pool {
            Some(pool) => pool,
            None => {
                return SampleBuffers {
                    positions: Vec::new(),
                    colors: Vec::new(),
                    base_positions: Vec::new(),
                    all_valid_positions: Vec::new(),
                }
            }
        };

        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let base = base_color(is_dark);
        let pool_len = pool.points.len();

        for i in 0..count {
            // Controlled resampling with replacement when the pool is
            // strictly larger; exhaustive modulo reuse otherwise.
            let idx = if pool_len > count {
                rng.gen_range(0..pool_len)
            } else {
                i % pool_len
            };
            let p = pool.points[idx];
            positions.push([p[0] as f32, p[1] as f32, p[2] as f32]);

            let brightness = 0.85 + 0.15 * rng.gen::<f32>();
            colors.push([
                base[0] * brightness,
                base[1] * brightness,
                base[2] * brightness,
            ]);
        }

        let base_positions = positions.clone();
        let all_valid_positions = pool
            .points
            .iter()
            .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
            .collect();

        SampleBuffers {
            positions,
            colors,
            base_positions,
            all_valid_positions,
        }
    }

    fn pool_is_fresh(&self, state: (u32, u32, u32, i32), dist: &OrbitalDistribution, count: usize) -> bool {
        let pool = match &self.pool {
            Some(pool) => pool,
            None => return false,
        };
        if pool.state != state || pool.points.is_empty() || pool.points.len() < count {
            return false;
        }
        if (pool.extent - dist.extent).abs() > EXTENT_TOLERANCE {
            return false;
        }
        let reference = dist.max_probability.max(f64::MIN_POSITIVE);
        (pool.max_probability - dist.max_probability).abs() / reference
            <= MAX_PROBABILITY_TOLERANCE
    }

    fn rebuild_pool<R: Rng>(
        &mut self,
        state: (u32, u32, u32, i32),
        dist: &OrbitalDistribution,
        count: usize,
        rng: &mut R,
    ) {
        let pool_count = count.max((count as f64 * POOL_OVERSIZE).floor() as usize);
        if pool_count == 0 {
            self.pool = None;
            return;
        }
        let mut points = Vec::with_capacity(pool_count);
        for _ in 0..pool_count {
            points.push(sample_position(dist, rng));
        }
        self.pool = Some(SamplePool {
            state,
            points,
            extent: dist.extent,
            max_probability: dist.max_probability,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DistributionCache;
    use crate::distribution::Flavor;
    use crate::quantum::QuantumNumbers;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn orbital(z: u32, n: u32, l: u32, m: i32) -> crate::cache::OrbitalDistribution {
        let mut cache = DistributionCache::new(Flavor::Exact, 8, 8, 8);
        let qn = QuantumNumbers::new(n, l, m).expect("valid state");
        (*cache.orbital(z, qn)).clone()
    }

    #[test]
    fn test_samples_stay_within_extent() {
        let dist = orbital(1, 3, 2, 1);
        let mut sampler = ParticleSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let buffers = sampler.draw(1, 3, 2, 1, &dist, 2000, true, &mut rng);
        assert_eq!(buffers.positions.len(), 2000);
        for p in &buffers.all_valid_positions {
            let r = ((p[0] as f64).powi(2) + (p[1] as f64).powi(2) + (p[2] as f64).powi(2)).sqrt();
            assert!(r <= dist.extent * (1.0 + 1e-6), "r={r} extent={}", dist.extent);
        }
    }

    #[test]
    fn test_pool_oversized_and_reused() {
        let dist = orbital(1, 2, 1, 0);
        let mut sampler = ParticleSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        sampler.draw(1, 2, 1, 0, &dist, 100, true, &mut rng);
        assert_eq!(sampler.pool_len(), 115);
        // A second draw at the same count must not rebuild.
        sampler.draw(1, 2, 1, 0, &dist, 100, true, &mut rng);
        assert_eq!(sampler.pool_len(), 115);
    }

    #[test]
    fn test_modulo_cycle_is_deterministic() {
        let dist = orbital(1, 2, 1, 0);
        let mut sampler = ParticleSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        sampler.draw(1, 2, 1, 0, &dist, 100, true, &mut rng);
        let pool_size = sampler.pool_len();
        // count == pool size forces the modulo mapping, so back-to-back
        // draws return identical positions.
        let first = sampler.draw(1, 2, 1, 0, &dist, pool_size, true, &mut rng);
        let second = sampler.draw(1, 2, 1, 0, &dist, pool_size, true, &mut rng);
        assert_eq!(sampler.pool_len(), pool_size);
        assert_eq!(first.positions, second.positions);
        assert_eq!(first.positions, first.base_positions);
    }

    #[test]
    fn test_pool_invalidated_on_state_change() {
        let dist_a = orbital(1, 2, 1, 0);
        let dist_b = orbital(1, 3, 0, 0);
        let mut sampler = ParticleSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        sampler.draw(1, 2, 1, 0, &dist_a, 50, true, &mut rng);
        let buffers = sampler.draw(1, 3, 0, 0, &dist_b, 50, true, &mut rng);
        for p in &buffers.all_valid_positions {
            let r = ((p[0] as f64).powi(2) + (p[1] as f64).powi(2) + (p[2] as f64).powi(2)).sqrt();
            assert!(r <= dist_b.extent * (1.0 + 1e-6));
        }
    }

    #[test]
    fn test_color_jitter_range() {
        let dist = orbital(1, 1, 0, 0);
        let mut sampler = ParticleSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let buffers = sampler.draw(1, 1, 0, 0, &dist, 500, true, &mut rng);
        let base = base_color(true);
        for c in &buffers.colors {
            for k in 0..3 {
                assert!(c[k] <= base[k] * 1.0 + 1e-6);
                assert!(c[k] >= base[k] * 0.85 - 1e-6);
            }
        }
    }

    #[test]
    fn test_zero_count_draw() {
        let dist = orbital(1, 1, 0, 0);
        let mut sampler = ParticleSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let buffers = sampler.draw(1, 1, 0, 0, &dist, 0, true, &mut rng);
        assert!(buffers.positions.is_empty());
        assert!(buffers.colors.is_empty());
    }
}
