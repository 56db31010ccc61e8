/// Distribution caching and orbital assembly.
///
/// Distributions are memoized per quantum state so repeated sampling requests
/// never re-run the radial march or the angular tabulation. Keys are the
/// exact integer inputs; floating quantities (extent, max probability) are
/// never part of a key and only enter tolerance-based freshness checks
/// downstream. Every store is bounded with least-recently-used eviction.

use crate::distribution::{AngularDistribution, Flavor, RadialDistribution, heuristic_extent};
use crate::quantum::{self, QuantumNumbers};
use std::collections::{HashMap, VecDeque};
use std::f64::consts::PI;
use std::hash::Hash;
use std::sync::Arc;

/// Floor applied to the assembled maximum probability so downstream
/// acceptance ratios never divide by zero.
pub const MAX_PROBABILITY_EPSILON: f64 = 1e-10;

/// A HashMap with least-recently-used eviction at a fixed capacity.
/// Small capacities, so the touch bookkeeping stays a plain deque.
pub struct BoundedCache<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        BoundedCache {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.map.contains_key(key) {
            self.touch(key);
        }
        self.map.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.map.insert(key.clone(), value).is_none() {
            while self.map.len() > self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.map.remove(&oldest);
                } else {
                    break;
                }
            }
        } else {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn touch(&mut self, key: &K) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.clone());
    }
}

/// A radial and an angular distribution combined into one sampleable orbital,
/// with the padded bounding radius and the normalization maximum.
#[derive(Debug, Clone)]
pub struct OrbitalDistribution {
    pub radial: Arc<RadialDistribution>,
    pub angular: Arc<AngularDistribution>,
    pub extent: f64,
    pub max_probability: f64,
}

/// Memoizes radial distributions by (Z, n, l), angular by (l, m), and
/// assembled orbitals by (Z, n, l, m). The radial shape is independent of m,
/// so p_x/p_y/p_z share one radial table.
pub struct DistributionCache {
    flavor: Flavor,
    radial: BoundedCache<(u32, u32, u32), Arc<RadialDistribution>>,
    angular: BoundedCache<(u32, i32), Arc<AngularDistribution>>,
    orbital: BoundedCache<(u32, u32, u32, i32), Arc<OrbitalDistribution>>,
}

impl DistributionCache {
    pub fn new(flavor: Flavor, radial_cap: usize, angular_cap: usize, orbital_cap: usize) -> Self {
        DistributionCache {
            flavor,
            radial: BoundedCache::new(radial_cap),
            angular: BoundedCache::new(angular_cap),
            orbital: BoundedCache::new(orbital_cap),
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn radial(&mut self, z: u32, n: u32, l: u32) -> Arc<RadialDistribution> {
        let key = (z, n, l);
        if let Some(hit) = self.radial.get(&key) {
            return Arc::clone(hit);
        }
        let built = Arc::new(RadialDistribution::build(n, l, z, self.flavor));
        self.radial.insert(key, Arc::clone(&built));
        built
    }

    pub fn angular(&mut self, l: u32, m: i32) -> Arc<AngularDistribution> {
        let key = (l, m);
        if let Some(hit) = self.angular.get(&key) {
            return Arc::clone(hit);
        }
        let built = Arc::new(AngularDistribution::build(l, m));
        self.angular.insert(key, Arc::clone(&built));
        built
    }

    /// Assembled orbital distribution for one quantum state, built on demand.
    pub fn orbital(&mut self, z: u32, qn: QuantumNumbers) -> Arc<OrbitalDistribution> {
        let key = (z, qn.n, qn.l, qn.m);
        if let Some(hit) = self.orbital.get(&key) {
            return Arc::clone(hit);
        }

        let radial = self.radial(z, qn.n, qn.l);
        let angular = self.angular(qn.l, qn.m);
        let built = Arc::new(assemble(z, qn, self.flavor, radial, angular));
        self.orbital.insert(key, Arc::clone(&built));
        built
    }

    pub fn clear(&mut self) {
        self.radial.clear();
        self.angular.clear();
        self.orbital.clear();
    }

    pub fn entry_count(&self) -> usize {
        self.radial.len() + self.angular.len() + self.orbital.len()
    }
}

/// Combine radial and angular tables into an orbital distribution.
///
/// The analytic peak product can drift from the true maximum because both
/// factors were found on discrete grids, so a sparse probe over
/// radius/theta/phi re-evaluates the density directly and the larger value
/// wins.
fn assemble(
    z: u32,
    qn: QuantumNumbers,
    flavor: Flavor,
    radial: Arc<RadialDistribution>,
    angular: Arc<AngularDistribution>,
) -> OrbitalDistribution {
    let analytic = radial.peak * angular.peak;
    let observed = probe_max_density(z, qn, radial.max_radius);

    let mut max_probability = analytic.max(observed);
    if !max_probability.is_finite() || max_probability <= 0.0 {
        log::warn!(
            "clamping degenerate max probability for z={z} n={} l={} m={}",
            qn.n,
            qn.l,
            qn.m
        );
        max_probability = MAX_PROBABILITY_EPSILON;
    }

    let padded = (radial.max_radius + 4.0 * radial.step).max(radial.max_radius * 1.08);
    let extent = padded.max(heuristic_extent(qn.n, z, flavor));

    OrbitalDistribution {
        radial,
        angular,
        extent,
        max_probability,
    }
}

/// Sparse stride probe of the density over the radial span. A few hundred
/// evaluations, plus a near-origin sample that catches the s-orbital peak.
fn probe_max_density(z: u32, qn: QuantumNumbers, max_radius: f64) -> f64 {
    const R_STRIDES: usize = 16;
    const THETA_STRIDES: usize = 10;

    let phi_strides = if qn.m == 0 { 1 } else { 6 };
    let mut max_seen = 0.0_f64;

    for i in 0..R_STRIDES {
        let r = max_radius * (i as f64 + 0.5) / R_STRIDES as f64;
        for j in 0..THETA_STRIDES {
            let theta = PI * (j as f64 + 0.5) / THETA_STRIDES as f64;
            for k in 0..phi_strides {
                let phi = 2.0 * PI * k as f64 / phi_strides as f64;
                let d = quantum::density_spherical(qn.n, qn.l, qn.m, z, r, theta, phi);
                if d > max_seen {
                    max_seen = d;
                }
            }
        }
    }

    let near_origin =
        quantum::density_spherical(qn.n, qn.l, qn.m, z, max_radius * 1e-4, PI / 2.0, 0.0);
    max_seen.max(near_origin)
}
