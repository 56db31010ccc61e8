/// Analytic nodal surfaces: radii, cones, and planes where the wavefunction
/// is exactly zero. Everything here is cheap closed-form bookkeeping, so no
/// caching is involved.

use crate::distribution::characteristic_radius;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Spacing multiplier for the approximate radial node radii, applied to the
/// n^2/Z characteristic radius.
const RADIAL_NODE_SPREAD: f64 = 1.6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodalSurfaces {
    /// Approximate radii of the n - l - 1 spherical nodes.
    pub radial_nodes: Vec<f64>,
    /// Polar angles of conical nodes, horizontal plane excluded.
    pub cone_angles: Vec<f64>,
    /// Azimuths of vertical nodal planes (each plane covers phi and phi + pi).
    pub phi_angles: Vec<f64>,
    /// Whether the z = 0 plane is itself a node.
    pub include_horizontal_plane: bool,
}

/// Nodal descriptors for one quantum state. Radii are clamped to `extent` so
/// the renderer never draws a node outside the bounding volume.
pub fn nodal_surfaces(n: u32, l: u32, m: i32, z: u32, extent: f64) -> NodalSurfaces {
    if n == 0 || l >= n || m.abs() > l as i32 {
        return NodalSurfaces::default();
    }

    let count = (n - l - 1) as usize;
    let characteristic = characteristic_radius(n, z);
    let radial_nodes: Vec<f64> = (1..=count)
        .map(|i| characteristic * RADIAL_NODE_SPREAD * i as f64 / (count + 1) as f64)
        .filter(|r| *r < extent)
        .collect();

    let m_abs = m.unsigned_abs();
    let cone_angles: Vec<f64> = legendre_zero_cosines(l, m_abs)
        .iter()
        .flat_map(|x| [x.acos(), (-x).acos()])
        .collect();

    let phi_angles: Vec<f64> = if m > 0 {
        // Zeros of cos(m phi).
        (0..m_abs)
            .map(|k| FRAC_PI_2 / m_abs as f64 + k as f64 * PI / m_abs as f64)
            .collect()
    } else if m < 0 {
        // Zeros of sin(|m| phi).
        (0..m_abs).map(|k| k as f64 * PI / m_abs as f64).collect()
    } else {
        Vec::new()
    };

    NodalSurfaces {
        radial_nodes,
        cone_angles,
        phi_angles,
        // cos(theta) = 0 is a zero of P_l^|m| exactly when l - |m| is odd.
        include_horizontal_plane: (l - m_abs) % 2 == 1,
    }
}

/// Positive zeros of P_l^m(x) on (0, 1), tabulated for the orbitals the
/// visualization exposes (l <= 3). The x = 0 zero is reported through the
/// horizontal-plane flag instead, and each entry mirrors to -x.
fn legendre_zero_cosines(l: u32, m_abs: u32) -> Vec<f64> {
    match (l, m_abs) {
        (2, 0) => vec![1.0 / 3.0_f64.sqrt()],
        (3, 0) => vec![(3.0_f64 / 5.0).sqrt()],
        (3, 1) => vec![1.0 / 5.0_f64.sqrt()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::{angular_amplitude, radial_amplitude};

    #[test]
    fn test_radial_node_counts() {
        assert_eq!(nodal_surfaces(1, 0, 0, 1, 10.0).radial_nodes.len(), 0);
        assert_eq!(nodal_surfaces(2, 0, 0, 1, 10.0).radial_nodes.len(), 1);
        assert_eq!(nodal_surfaces(2, 1, 0, 1, 10.0).radial_nodes.len(), 0);
        assert_eq!(nodal_surfaces(4, 1, 0, 1, 100.0).radial_nodes.len(), 2);
    }

    #[test]
    fn test_invalid_state_is_empty() {
        let surfaces = nodal_surfaces(2, 2, 0, 1, 10.0);
        assert!(surfaces.radial_nodes.is_empty());
        assert!(surfaces.cone_angles.is_empty());
        assert!(surfaces.phi_angles.is_empty());
        assert!(!surfaces.include_horizontal_plane);
    }

    #[test]
    fn test_pz_has_horizontal_plane_only() {
        let surfaces = nodal_surfaces(2, 1, 0, 1, 10.0);
        assert!(surfaces.include_horizontal_plane);
        assert!(surfaces.cone_angles.is_empty());
        assert!(surfaces.phi_angles.is_empty());
    }

    #[test]
    fn test_dz2_cone_angles() {
        let surfaces = nodal_surfaces(3, 2, 0, 1, 50.0);
        assert!(!surfaces.include_horizontal_plane);
        assert_eq!(surfaces.cone_angles.len(), 2);
        // The amplitude really vanishes on the reported cones.
        for theta in &surfaces.cone_angles {
            let a = angular_amplitude(2, 0, *theta, 0.0);
            assert!(a.abs() < 1e-12, "theta={theta} amplitude={a}");
        }
    }

    #[test]
    fn test_diagonal_planes_for_m2() {
        let surfaces = nodal_surfaces(3, 2, 2, 1, 50.0);
        assert_eq!(surfaces.phi_angles.len(), 2);
        assert!((surfaces.phi_angles[0] - PI / 4.0).abs() < 1e-12);
        assert!((surfaces.phi_angles[1] - 3.0 * PI / 4.0).abs() < 1e-12);
        // sin-combination planes sit on the axes instead.
        let negative = nodal_surfaces(3, 2, -2, 1, 50.0);
        assert!((negative.phi_angles[0] - 0.0).abs() < 1e-12);
        assert!((negative.phi_angles[1] - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_azimuths_zero_the_amplitude() {
        for m in [1, 2, -1, -3] {
            let l = 3;
            let surfaces = nodal_surfaces(4, l, m, 1, 100.0);
            for phi in &surfaces.phi_angles {
                let a = angular_amplitude(l, m, 1.0, *phi);
                assert!(a.abs() < 1e-12, "m={m} phi={phi} amplitude={a}");
            }
        }
    }

    #[test]
    fn test_radial_nodes_bracket_sign_changes_for_2s() {
        // 2s has its true node at r = 2; the approximation lands in the same
        // region and inside the extent.
        let surfaces = nodal_surfaces(2, 0, 0, 1, 10.0);
        let r = surfaces.radial_nodes[0];
        assert!(r > 0.0 && r < 10.0);
        let true_node = 2.0;
        assert!((r - true_node).abs() < true_node);
        // Exact node for reference.
        assert!(radial_amplitude(2, 0, 1, true_node).abs() < 1e-12);
    }
}
