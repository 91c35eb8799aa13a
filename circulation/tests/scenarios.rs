use std::f64::consts::PI;

use num_complex::Complex64;

use circulation::convolution::ConvolutionCirculation;
use circulation::fields::{self, FieldDeriver};
use circulation::integral_field::IntegralField;
use circulation::kernels::LoopShape;
use circulation::params::DomainParams;

/// Scenario 3: a single +1 phase singularity at the centre of the
/// domain. The circulation around a loop enclosing it should approach
/// the quantum of circulation kappa; a loop that does not enclose it
/// (far from the centre, same size) should read close to zero.
#[test]
fn single_lattice_vortex_circulation_matches_quantum() {
    let n = 64;
    let l = 2.0 * PI;
    let dx = l / n as f64;
    let c = 1.0;
    let xi = 2.0 * dx;
    let params = DomainParams::new(n, n, l, l, c, xi);

    let cx = l / 2.0;
    let cy = l / 2.0;
    let mut psi = vec![Complex64::new(0.0, 0.0); n * n];
    for iy in 0..n {
        for ix in 0..n {
            let x = ix as f64 * dx - cx;
            let y = iy as f64 * dx - cy;
            let r = (x * x + y * y).sqrt();
            let theta = y.atan2(x);
            let amplitude = (r / xi).tanh();
            psi[iy * n + ix] = Complex64::new(amplitude * theta.cos(), amplitude * theta.sin());
        }
    }

    let mut deriver = FieldDeriver::new(n, n, l, l, c, xi);
    let mut rho = vec![0.0; n * n];
    let mut px = vec![0.0; n * n];
    let mut py = vec![0.0; n * n];
    deriver.density(&psi, &mut rho);
    deriver.momentum(&psi, &mut px, &mut py);

    let mut vx = vec![0.0; n * n];
    let mut vy = vec![0.0; n * n];
    fields::regularised_velocity(&px, &rho, &mut vx);
    fields::regularised_velocity(&py, &rho, &mut vy);

    let loop_side = 10.0 * dx;
    let mut conv = ConvolutionCirculation::new(n, n, l, l);
    let mut gamma = vec![0.0; n * n];
    conv.circulation_field(&vx, &vy, LoopShape::Rectangle { rx: loop_side, ry: loop_side }, &mut gamma);

    let kappa = params.kappa();
    let centre_idx = (n / 2) * n + n / 2;
    let corner_idx = (n / 8) * n + n / 8;

    assert!(
        (gamma[centre_idx].abs() - kappa.abs()).abs() < 0.25 * kappa.abs(),
        "gamma at centre = {}, kappa = {kappa}",
        gamma[centre_idx]
    );
    assert!(
        gamma[corner_idx].abs() < 0.25 * kappa.abs(),
        "gamma far from vortex = {}, expected near zero",
        gamma[corner_idx]
    );
}

/// Round-trip law: for a smooth, divergence-free velocity field the
/// O(1) integral-field path and the spectral convolution path must
/// agree on rectangular-loop circulation to within numerical tolerance.
#[test]
fn integral_field_matches_convolution_for_smooth_field() {
    let n = 32;
    let l = 2.0 * PI;
    let dx = l / n as f64;
    let mut u = vec![0.0; n * n];
    let mut v = vec![0.0; n * n];
    for iy in 0..n {
        for ix in 0..n {
            let x = ix as f64 * dx;
            let y = iy as f64 * dx;
            u[iy * n + ix] = x.sin() * y.cos();
            v[iy * n + ix] = -x.cos() * y.sin();
        }
    }

    let field = IntegralField::build(&u, &v, n, n, l, l);
    let r = 3i64;
    let side = r as f64 * dx;

    let mut conv = ConvolutionCirculation::new(n, n, l, l);
    let mut gamma_conv = vec![0.0; n * n];
    conv.circulation_field(&u, &v, LoopShape::Rectangle { rx: side, ry: side }, &mut gamma_conv);

    // The convolution kernel is centred at the grid point, the
    // integral-field rectangle is rooted there; compare interior points
    // (away from the domain edge where centring conventions differ) by
    // magnitude, which is centring-convention independent for this flow.
    let mut max_err: f64 = 0.0;
    for j in 8..24 {
        for i in 8..24 {
            let expected = field.circulation_at(i as i64, j as i64, r, r).abs();
            let actual = gamma_conv[j * n + i].abs();
            max_err = max_err.max((expected - actual).abs());
        }
    }
    assert!(max_err < 1e-2, "max circulation mismatch {max_err}");
}
