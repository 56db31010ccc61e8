/// Distribution tables for inverse-transform sampling.
///
/// The radial builder marches outward from the nucleus integrating
/// R(r)^2 r^2 dr into a normalized CDF; the angular builder tabulates the
/// theta and (for m != 0) phi marginals of |Y_lm|^2. Both track the peak
/// squared amplitude so the orbital assembly can estimate the maximum
/// probability density without rescanning.

use crate::quantum::{angular_amplitude, associated_legendre, radial_amplitude};
use std::f64::consts::PI;

/// Display-fidelity flavor of a distribution. Exact keeps the full physical
/// envelope; Stylized trades tail coverage for tighter framing and cheaper
/// density fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Exact,
    Stylized,
}

impl Flavor {
    /// Multiplier applied to the n^2/Z characteristic radius when deriving
    /// the fallback visualization extent.
    pub fn extent_scale(self) -> f64 {
        match self {
            Flavor::Exact => 3.0,
            Flavor::Stylized => 2.2,
        }
    }

    /// Hard cap for density-field grid resolution.
    pub fn resolution_cap(self) -> usize {
        match self {
            Flavor::Exact => 180,
            Flavor::Stylized => 150,
        }
    }
}

/// Expected orbital scale in Bohr radii.
pub fn characteristic_radius(n: u32, z: u32) -> f64 {
    (n * n) as f64 / z.max(1) as f64
}

/// Bounding radius to fall back on when the radial march degenerates, and
/// the floor under the assembled extent.
pub fn heuristic_extent(n: u32, z: u32, flavor: Flavor) -> f64 {
    (characteristic_radius(n, z) * flavor.extent_scale()).max(3.0)
}

const MIN_STEPS: usize = 512;
const MAX_STEPS: usize = 12_000;
const TARGET_COVERAGE: f64 = 0.9995;

/// Integration step for the radial march, balancing resolution against
/// orbital size.
pub fn radial_step(n: u32, z: u32) -> f64 {
    let scale = (n * n) as f64 / 120.0_f64.max(z as f64 * 420.0);
    scale.clamp(0.012, 0.12)
}

/// Radial CDF over [0, max_radius], normalized so the last entry is 1.
#[derive(Debug, Clone)]
pub struct RadialDistribution {
    pub radii: Vec<f64>,
    pub cdf: Vec<f64>,
    pub max_radius: f64,
    /// Peak of R(r)^2 over the marched range (including r = 0).
    pub peak: f64,
    pub step: f64,
}

impl RadialDistribution {
    /// March outward accumulating the trapezoidal integral of R^2 r^2 until
    /// the cumulative mass covers the target, with a floor and a cap on the
    /// step count. R_nl is normalized, so the accumulated mass approaches 1.
    pub fn build(n: u32, l: u32, z: u32, flavor: Flavor) -> Self {
        let step = radial_step(n, z);

        let amp0 = radial_amplitude(n, l, z, 0.0);
        let mut peak = amp0 * amp0;
        let mut radii = vec![0.0];
        let mut cdf = vec![0.0];
        let mut total = 0.0_f64;
        let mut prev_integrand = 0.0_f64;

        let mut i = 0usize;
        while i < MAX_STEPS {
            i += 1;
            let r = step * i as f64;
            let amp = radial_amplitude(n, l, z, r);
            let sq = amp * amp;
            if sq > peak {
                peak = sq;
            }
            let integrand = sq * r * r;
            total += 0.5 * (prev_integrand + integrand) * step;
            prev_integrand = integrand;
            radii.push(r);
            cdf.push(total);

            if i >= MIN_STEPS && total >= TARGET_COVERAGE {
                break;
            }
        }

        if total <= 0.0 || !total.is_finite() {
            // Degenerate state: return a two-point uniform span so samplers
            // still have a bounded domain to draw from.
            log::warn!("radial march degenerate for n={n} l={l} z={z}");
            let extent = heuristic_extent(n, z, flavor);
            return RadialDistribution {
                radii: vec![0.0, extent],
                cdf: vec![0.0, 1.0],
                max_radius: extent,
                peak: peak.max(f64::MIN_POSITIVE),
                step,
            };
        }

        for v in &mut cdf {
            *v /= total;
        }
        // Pin the endpoint so inverse lookups can rely on full coverage.
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }

        let max_radius = radii.last().copied().unwrap_or(step);
        RadialDistribution {
            radii,
            cdf,
            max_radius,
            peak,
            step,
        }
    }
}

/// A sampled axis paired with its normalized CDF.
#[derive(Debug, Clone)]
pub struct CdfTable {
    pub values: Vec<f64>,
    pub cdf: Vec<f64>,
}

impl CdfTable {
    /// Tabulate `weight` over [lo, hi] in `steps` intervals and integrate it
    /// into a CDF; falls back to a uniform ramp when the integral collapses.
    fn build(lo: f64, hi: f64, steps: usize, weight: impl Fn(f64) -> f64) -> Self {
        let steps = steps.max(2);
        let mut values = Vec::with_capacity(steps + 1);
        let mut cdf = Vec::with_capacity(steps + 1);
        let dx = (hi - lo) / steps as f64;

        let mut total = 0.0_f64;
        let mut prev = weight(lo);
        values.push(lo);
        cdf.push(0.0);
        for i in 1..=steps {
            let x = lo + dx * i as f64;
            let w = weight(x);
            total += 0.5 * (prev + w) * dx;
            prev = w;
            values.push(x);
            cdf.push(total);
        }

        if total <= 0.0 || !total.is_finite() {
            for (i, v) in cdf.iter_mut().enumerate() {
                *v = i as f64 / steps as f64;
            }
            return CdfTable { values, cdf };
        }

        for v in &mut cdf {
            *v /= total;
        }
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        CdfTable { values, cdf }
    }
}

/// Angular marginals for (l, m). The phi table exists only when m != 0;
/// otherwise phi is drawn uniformly at sample time.
#[derive(Debug, Clone)]
pub struct AngularDistribution {
    pub theta: CdfTable,
    pub phi: Option<CdfTable>,
    /// Peak of |Y_lm(theta, phi)|^2 found by coarse grid search.
    pub peak: f64,
}

impl AngularDistribution {
    pub fn build(l: u32, m: i32) -> Self {
        let m_abs = m.unsigned_abs();

        // Theta marginal: |P_l^|m||^2 weighted by the sin(theta) Jacobian.
        let theta_steps = ((l + m_abs + 1) * 60) as usize;
        let theta = CdfTable::build(0.0, PI, theta_steps, |t| {
            let p = associated_legendre(t.cos(), l, m_abs);
            p * p * t.sin()
        });

        let phi = if m != 0 {
            let phi_steps = (m_abs * 240) as usize;
            let table = if m > 0 {
                CdfTable::build(0.0, 2.0 * PI, phi_steps, |p| {
                    let c = (m as f64 * p).cos();
                    c * c
                })
            } else {
                CdfTable::build(0.0, 2.0 * PI, phi_steps, |p| {
                    let s = (m_abs as f64 * p).sin();
                    s * s
                })
            };
            Some(table)
        } else {
            None
        };

        let peak = peak_angular_density(l, m);

        AngularDistribution { theta, phi, peak }
    }
}

/// Brute-force maximum of |Y_lm|^2 over a coarse theta x phi grid, with the
/// grid density scaled up for higher multipoles. Same epsilon floor as the
/// rest of the normalization path.
fn peak_angular_density(l: u32, m: i32) -> f64 {
    let m_abs = m.unsigned_abs();
    let theta_steps = ((l + 1) * 90) as usize;
    // m = 0 has no azimuthal dependence; a single phi sample suffices.
    let phi_steps = if m == 0 { 1 } else { (m_abs * 24) as usize };

    let mut max_val = 0.0_f64;
    for i in 0..theta_steps {
        let theta = (i as f64 + 0.5) / theta_steps as f64 * PI;
        for j in 0..phi_steps {
            let phi = (j as f64 + 0.5) / phi_steps as f64 * 2.0 * PI;
            let a = angular_amplitude(l, m, theta, phi);
            let p = a * a;
            if p > max_val {
                max_val = p;
            }
        }
    }

    max_val.max(1e-10)
}

/// Convenience check used by tests and the assembly cross-check.
pub fn is_monotonic_unit_cdf(cdf: &[f64]) -> bool {
    if cdf.is_empty() {
        return false;
    }
    if cdf[0] != 0.0 || (cdf.last().copied().unwrap_or(0.0) - 1.0).abs() > 1e-12 {
        return false;
    }
    cdf.windows(2).all(|w| w[1] >= w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radial_step_clamps() {
        assert_eq!(radial_step(1, 1), 0.012);
        assert_eq!(radial_step(10, 1), 0.12);
        let mid = radial_step(5, 1);
        assert!(mid > 0.012 && mid < 0.12);
        // Heavier nuclei shrink the step.
        assert!(radial_step(5, 10) < radial_step(5, 1));
    }

    #[test]
    fn test_radial_cdf_shape() {
        for (z, n, l) in [(1, 1, 0), (1, 2, 0), (1, 2, 1), (1, 4, 2), (3, 3, 1), (8, 2, 1)] {
            let dist = RadialDistribution::build(n, l, z, Flavor::Exact);
            assert!(
                is_monotonic_unit_cdf(&dist.cdf),
                "bad cdf for z={z} n={n} l={l}"
            );
            assert_eq!(dist.radii.len(), dist.cdf.len());
            assert!(dist.peak > 0.0);
            assert!(dist.max_radius > 0.0);
        }
    }

    #[test]
    fn test_radial_minimum_march_length() {
        let dist = RadialDistribution::build(1, 0, 1, Flavor::Exact);
        assert!(dist.radii.len() > MIN_STEPS);
        // 1s mass is concentrated well inside the marched range.
        assert!(dist.max_radius >= 2.0);
    }

    #[test]
    fn test_radial_march_cap() {
        let dist = RadialDistribution::build(12, 0, 1, Flavor::Exact);
        assert!(dist.radii.len() <= MAX_STEPS + 1);
        assert!(is_monotonic_unit_cdf(&dist.cdf));
    }

    #[test]
    fn test_angular_theta_cdf_normalized() {
        for (l, m) in [(0, 0), (1, 0), (1, 1), (2, -1), (3, 2), (4, -4)] {
            let dist = AngularDistribution::build(l, m);
            assert!(
                is_monotonic_unit_cdf(&dist.theta.cdf),
                "bad theta cdf for l={l} m={m}"
            );
            assert!(dist.peak > 0.0);
        }
    }

    #[test]
    fn test_phi_table_only_for_nonzero_m() {
        assert!(AngularDistribution::build(2, 0).phi.is_none());
        let with_phi = AngularDistribution::build(2, 1).phi.expect("phi table");
        assert!(is_monotonic_unit_cdf(&with_phi.cdf));
        let with_neg = AngularDistribution::build(2, -2).phi.expect("phi table");
        assert!(is_monotonic_unit_cdf(&with_neg.cdf));
    }

    #[test]
    fn test_angular_peak_close_to_analytic_s() {
        // |Y_00|^2 = 1/(4 pi) everywhere.
        let dist = AngularDistribution::build(0, 0);
        let expected = 1.0 / (4.0 * PI);
        assert!((dist.peak - expected).abs() < 1e-6);
    }

    #[test]
    fn test_heuristic_extent_floor() {
        assert_eq!(heuristic_extent(1, 1, Flavor::Exact), 3.0);
        assert!(heuristic_extent(3, 1, Flavor::Exact) > heuristic_extent(3, 1, Flavor::Stylized));
    }
}
