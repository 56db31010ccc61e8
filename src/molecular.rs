/// Two-center molecular orbitals (LCAO of two 1s atoms).
///
/// Combines a pair of hydrogen-like 1s wavefunctions centered on the bond
/// axis into sigma (bonding) or sigma* (antibonding) orbitals. Sampling
/// draws from each center's single-atom distribution as an importance
/// proposal and tags every point with the signed combined amplitude so the
/// renderer can color by phase.

use crate::cache::{DistributionCache, OrbitalDistribution};
use crate::distribution::Flavor;
use crate::quantum::{self, QuantumNumbers, Spin};
use crate::sampler::sample_position;
use rand::Rng;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combination {
    Bonding,
    Antibonding,
}

impl Combination {
    fn sign(self) -> f64 {
        match self {
            Combination::Bonding => 1.0,
            Combination::Antibonding => -1.0,
        }
    }
}

/// Closed-form 1s-1s overlap integral S(R) for nuclear charge Z,
/// S = exp(-ZR) (1 + ZR + (ZR)^2 / 3).
pub fn overlap_integral(z: u32, bond_length: f64) -> f64 {
    let zr = z.max(1) as f64 * bond_length.max(0.0);
    (-zr).exp() * (1.0 + zr + zr * zr / 3.0)
}

/// LCAO normalization N = 1 / sqrt(2 +- 2S). The antibonding combination at
/// zero separation is identically zero, so its normalization collapses to 0
/// instead of dividing by zero.
pub fn lcao_normalization(overlap: f64, combination: Combination) -> f64 {
    let denom = 2.0 + combination.sign() * 2.0 * overlap;
    if denom <= 0.0 {
        return 0.0;
    }
    1.0 / denom.sqrt()
}

/// A sampled point with its signed molecular amplitude.
#[derive(Debug, Clone, Copy)]
pub struct MolecularSample {
    pub position: [f64; 3],
    pub amplitude: f64,
}

pub struct MolecularOrbitalSampler {
    z: u32,
    bond_length: f64,
    combination: Combination,
    normalization: f64,
    atomic: Arc<OrbitalDistribution>,
}

impl MolecularOrbitalSampler {
    /// Build the per-center 1s distribution and the LCAO constants for two
    /// identical nuclei a bond length apart on the z axis.
    pub fn new(z: u32, bond_length: f64, combination: Combination) -> Self {
        let mut cache = DistributionCache::new(Flavor::Exact, 2, 2, 2);
        let ground = QuantumNumbers {
            n: 1,
            l: 0,
            m: 0,
            spin: Spin::Up,
        };
        let atomic = cache.orbital(z, ground);
        let overlap = overlap_integral(z, bond_length);

        MolecularOrbitalSampler {
            z,
            bond_length: bond_length.max(0.0),
            combination,
            normalization: lcao_normalization(overlap, combination),
            atomic,
        }
    }

    pub fn overlap(&self) -> f64 {
        overlap_integral(self.z, self.bond_length)
    }

    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    /// Bounding radius covering both centers and their atomic extents.
    pub fn extent(&self) -> f64 {
        self.atomic.extent + self.bond_length / 2.0
    }

    fn centers(&self) -> ([f64; 3], [f64; 3]) {
        let half = self.bond_length / 2.0;
        ([0.0, 0.0, -half], [0.0, 0.0, half])
    }

    /// Signed molecular amplitude N (psi_A +- psi_B) at a Cartesian point.
    pub fn amplitude(&self, x: f64, y: f64, zc: f64) -> f64 {
        let (a, b) = self.centers();
        let psi_a = quantum::amplitude(1, 0, 0, self.z, x - a[0], y - a[1], zc - a[2]);
        let psi_b = quantum::amplitude(1, 0, 0, self.z, x - b[0], y - b[1], zc - b[2]);
        self.normalization * (psi_a + self.combination.sign() * psi_b)
    }

    pub fn density(&self, x: f64, y: f64, zc: f64) -> f64 {
        let a = self.amplitude(x, y, zc);
        a * a
    }

    /// Draw `count` phase-tagged samples. Each draw picks a center with
    /// equal probability and pulls a point from its 1s inverse-CDF tables.
    pub fn sample<R: Rng>(&self, count: usize, rng: &mut R) -> Vec<MolecularSample> {
        let (center_a, center_b) = self.centers();
        let mut samples = Vec::with_capacity(count);

        for _ in 0..count {
            let local = sample_position(&self.atomic, rng);
            let center = if rng.gen_bool(0.5) { center_a } else { center_b };
            let position = [
                local[0] + center[0],
                local[1] + center[1],
                local[2] + center[2],
            ];
            let amplitude = self.amplitude(position[0], position[1], position[2]);
            samples.push(MolecularSample {
                position,
                amplitude,
            });
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_overlap_at_zero_separation() {
        assert_eq!(overlap_integral(1, 0.0), 1.0);
    }

    #[test]
    fn test_overlap_decays_monotonically() {
        let mut prev = overlap_integral(1, 0.0);
        for i in 1..20 {
            let s = overlap_integral(1, i as f64 * 0.5);
            assert!(s < prev);
            assert!(s > 0.0);
            prev = s;
        }
    }

    #[test]
    fn test_bonding_normalization_at_contact() {
        // S(0) = 1, so N = 1 / sqrt(4) = 1/2.
        let n = lcao_normalization(overlap_integral(1, 0.0), Combination::Bonding);
        assert!((n - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_antibonding_collapses_at_contact() {
        let n = lcao_normalization(overlap_integral(1, 0.0), Combination::Antibonding);
        assert_eq!(n, 0.0);
    }

    #[test]
    fn test_antibonding_amplitude_is_antisymmetric() {
        let sampler = MolecularOrbitalSampler::new(1, 1.4, Combination::Antibonding);
        for (x, y, z) in [(0.3, -0.2, 0.9), (1.0, 0.5, 0.1), (0.0, 0.0, 2.0)] {
            let above = sampler.amplitude(x, y, z);
            let below = sampler.amplitude(x, y, -z);
            assert!((above + below).abs() < 1e-12, "({x},{y},{z})");
        }
        // The bond midplane is a node.
        assert!(sampler.amplitude(0.7, -0.3, 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_bonding_amplitude_is_symmetric() {
        let sampler = MolecularOrbitalSampler::new(1, 1.4, Combination::Bonding);
        let above = sampler.amplitude(0.3, 0.4, 1.1);
        let below = sampler.amplitude(0.3, 0.4, -1.1);
        assert!((above - below).abs() < 1e-12);
    }

    #[test]
    fn test_samples_tagged_and_bounded() {
        let sampler = MolecularOrbitalSampler::new(1, 1.4, Combination::Bonding);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let samples = sampler.sample(500, &mut rng);
        assert_eq!(samples.len(), 500);
        let extent = sampler.extent();
        for s in &samples {
            let r = (s.position[0].powi(2) + s.position[1].powi(2) + s.position[2].powi(2)).sqrt();
            assert!(r <= extent * (1.0 + 1e-6));
            let expected = sampler.density(s.position[0], s.position[1], s.position[2]);
            assert!((s.amplitude * s.amplitude - expected).abs() < 1e-12);
        }
        // Bonding phase is positive everywhere between the nuclei.
        let mid = sampler.amplitude(0.0, 0.0, 0.0);
        assert!(mid > 0.0);
    }
}
