// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]
#![allow(dead_code)]

/// Projected gradient on the dual `min_{|z| <= lambda} 0.5 * |x - D^T z|^2`,
/// where `D` is the forward-difference operator. Returns `x - D^T z`.
///
/// Slow and approximate; only for cross-checking short inputs.
pub fn dual_projected_gradient(input: &[f64], lambda: f64, iterations: usize) -> Vec<f64> {
    let n = input.len();
    if n < 2 {
        return input.to_vec();
    }

    // ||D D^T|| <= 4
    let step = 0.25;
    let mut z = vec![0.0; n - 1];
    let mut y = input.to_vec();

    for _ in 0..iterations {
        for (i, zi) in z.iter_mut().enumerate() {
            *zi = (*zi + step * (y[i + 1] - y[i])).clamp(-lambda, lambda);
        }
        primal_from_dual(input, &z, &mut y);
    }

    y
}

fn primal_from_dual(input: &[f64], z: &[f64], y: &mut [f64]) {
    let n = input.len();
    for i in 0..n {
        let left = if i > 0 { z[i - 1] } else { 0.0 };
        let right = if i + 1 < n { z[i] } else { 0.0 };
        y[i] = input[i] - (left - right);
    }
}
