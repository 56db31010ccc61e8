/// Hydrogen-like atom quantum mechanics
/// Closed-form solutions of the Schrödinger equation for a single electron
/// bound to a nucleus of charge Z. All distances are in Bohr radii.

use once_cell::sync::Lazy;
use std::f64::consts::PI;

/// Electron spin projection. Carried on the quantum state for completeness;
/// the spatial wavefunction does not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spin {
    #[default]
    Up,
    Down,
}

/// Represents quantum numbers (n, l, m)
/// n: Principal quantum number (1, 2, 3, ...)
/// l: Azimuthal quantum number (0 to n-1)
/// m: Magnetic quantum number (-l to l)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantumNumbers {
    pub n: u32,
    pub l: u32,
    pub m: i32,
    pub spin: Spin,
}

impl QuantumNumbers {
    pub fn new(n: u32, l: u32, m: i32) -> Option<Self> {
        // Validate quantum numbers
        if n == 0 || l >= n || m.abs() > l as i32 {
            return None;
        }
        Some(QuantumNumbers {
            n,
            l,
            m,
            spin: Spin::Up,
        })
    }

    /// Spectroscopic label, e.g. "2p".
    pub fn label(&self) -> String {
        let letter = match self.l {
            0 => "s",
            1 => "p",
            2 => "d",
            3 => "f",
            4 => "g",
            5 => "h",
            6 => "i",
            _ => "?",
        };
        format!("{}{letter}", self.n)
    }
}

/// Largest k for which k! fits in an f64.
const MAX_FACTORIAL: usize = 170;

static FACTORIALS: Lazy<Vec<f64>> = Lazy::new(|| {
    let mut table = Vec::with_capacity(MAX_FACTORIAL + 1);
    let mut acc = 1.0_f64;
    table.push(acc);
    for k in 1..=MAX_FACTORIAL {
        acc *= k as f64;
        table.push(acc);
    }
    table
});

/// k! from the memoized table. Saturates to +inf past 170!, which downstream
/// normalization constants turn into a zero amplitude rather than a panic.
pub fn factorial(k: u32) -> f64 {
    FACTORIALS
        .get(k as usize)
        .copied()
        .unwrap_or(f64::INFINITY)
}

/// Spherical coordinates (r, theta, phi) from Cartesian, with theta pinned
/// to 0 at the origin instead of NaN.
pub fn spherical_from_cartesian(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let r = (x * x + y * y + z * z).sqrt();
    if r <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let cos_theta = (z / r).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    let phi = y.atan2(x);
    (r, theta, phi)
}

/// Generalized Laguerre polynomial L^a_k(x) by the three-term recurrence.
/// Iterative with an accumulator pair so large k stays O(1) in stack.
pub fn laguerre_polynomial(x: f64, k: u32, alpha: u32) -> f64 {
    if k == 0 {
        return 1.0;
    }

    let alpha_f = alpha as f64;
    let mut l0 = 1.0;
    let mut l1 = 1.0 + alpha_f - x;

    if k == 1 {
        return l1;
    }

    for i in 2..=k {
        let i_f = i as f64;
        let l_new = ((2.0 * i_f - 1.0 + alpha_f - x) * l1 - (i_f - 1.0 + alpha_f) * l0) / i_f;
        l0 = l1;
        l1 = l_new;
    }

    l1
}

/// Legendre polynomial P_l(x)
pub fn legendre_polynomial(x: f64, l: u32) -> f64 {
    match l {
        0 => 1.0,
        1 => x,
        _ => {
            let mut p0 = 1.0;
            let mut p1 = x;

            for i in 2..=l {
                let i_f = i as f64;
                let p_new = ((2.0 * i_f - 1.0) * x * p1 - (i_f - 1.0) * p0) / i_f;
                p0 = p1;
                p1 = p_new;
            }

            p1
        }
    }
}

/// Double factorial n!! = n * (n-2) * (n-4) * ... * 1 or 2
fn factorial_double(n: u32) -> f64 {
    let mut result = 1.0_f64;
    let mut i = n as i64;
    while i > 0 {
        result *= i as f64;
        i -= 2;
    }
    result
}

/// Associated Legendre polynomial P^m_l(x) by upward recurrence in l.
pub fn associated_legendre(x: f64, l: u32, m: u32) -> f64 {
    if m > l {
        return 0.0;
    }
    if m == 0 {
        return legendre_polynomial(x, l);
    }

    let m_f = m as f64;
    let x_sq = x * x;

    // Seed P^m_m with the Condon-Shortley phase, then climb to l.
    let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
    let pmm = sign * (1.0 - x_sq).powf(m_f / 2.0) * factorial_double(2 * m - 1);

    if l == m {
        return pmm;
    }

    let pm1m = x * (2.0 * m_f + 1.0) * pmm;

    if l == m + 1 {
        return pm1m;
    }

    let mut prev = pmm;
    let mut curr = pm1m;

    for i in (m + 2)..=l {
        let i_f = i as f64;
        let next = ((2.0 * i_f - 1.0) * x * curr - (i_f + m_f - 1.0) * prev) / (i_f - m_f);
        prev = curr;
        curr = next;
    }

    curr
}

/// Radial wavefunction R_nl(r) for a hydrogen-like atom with nuclear charge z.
///
/// R_nl = norm * rho^l * exp(-rho/2) * L^{2l+1}_{n-l-1}(rho), rho = 2Zr/n.
pub fn radial_amplitude(n: u32, l: u32, z: u32, r: f64) -> f64 {
    if n == 0 || l >= n || r < 0.0 {
        return 0.0;
    }

    let n_f = n as f64;
    let z_f = z.max(1) as f64;
    let rho = 2.0 * z_f * r / n_f;

    // (2Z/n)^(3/2) * sqrt((n-l-1)! / (2n (n+l)!))
    let norm = (2.0 * z_f / n_f).powf(1.5)
        * (factorial(n - l - 1) / (2.0 * n_f * factorial(n + l))).sqrt();

    let poly = laguerre_polynomial(rho, n - l - 1, 2 * l + 1);

    norm * rho.powi(l as i32) * (-rho / 2.0).exp() * poly
}

/// Real spherical harmonic amplitude for (l, m) at (theta, phi).
///
/// m > 0 pairs the Legendre part with cos(m phi), m < 0 with sin(|m| phi),
/// m = 0 has no azimuthal dependence.
pub fn angular_amplitude(l: u32, m: i32, theta: f64, phi: f64) -> f64 {
    if m.abs() > l as i32 {
        return 0.0;
    }

    let m_abs = m.unsigned_abs();
    let l_f = l as f64;

    let norm = ((2.0 * l_f + 1.0) / (4.0 * PI) * factorial(l - m_abs) / factorial(l + m_abs))
        .sqrt();
    let legendre = associated_legendre(theta.cos(), l, m_abs);

    let azimuthal = if m > 0 {
        (m as f64 * phi).cos()
    } else if m < 0 {
        (m_abs as f64 * phi).sin()
    } else {
        1.0
    };

    norm * legendre * azimuthal
}

/// Signed wavefunction value at a Cartesian point.
pub fn amplitude(n: u32, l: u32, m: i32, z: u32, x: f64, y: f64, zc: f64) -> f64 {
    if n == 0 || l >= n || m.abs() > l as i32 {
        return 0.0;
    }
    let (r, theta, phi) = spherical_from_cartesian(x, y, zc);
    radial_amplitude(n, l, z, r) * angular_amplitude(l, m, theta, phi)
}

/// Probability density |psi|^2 at a Cartesian point. Invalid quantum numbers
/// contribute zero so downstream samplers never have to special-case them.
pub fn density(n: u32, l: u32, m: i32, z: u32, x: f64, y: f64, zc: f64) -> f64 {
    let a = amplitude(n, l, m, z, x, y, zc);
    a * a
}

/// Probability density in spherical coordinates.
pub fn density_spherical(n: u32, l: u32, m: i32, z: u32, r: f64, theta: f64, phi: f64) -> f64 {
    if n == 0 || l >= n || m.abs() > l as i32 {
        return 0.0;
    }
    let a = radial_amplitude(n, l, z, r) * angular_amplitude(l, m, theta, phi);
    a * a
}
