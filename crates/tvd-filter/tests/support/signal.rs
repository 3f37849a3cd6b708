// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]
#![allow(dead_code)]

pub const HOLD: usize = 30;
pub const NOISE: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoakProfile {
    PrSmoke,
    Nightly,
}

impl SoakProfile {
    /// Signal lengths exercised under this profile; all multiples of [`HOLD`].
    pub fn lengths(self) -> &'static [usize] {
        match self {
            Self::PrSmoke => &[HOLD, 10 * HOLD, 100 * HOLD, 1_000 * HOLD],
            Self::Nightly => &[10_000 * HOLD, 100_000 * HOLD],
        }
    }

    pub fn seeds(self) -> u64 {
        match self {
            Self::PrSmoke => 4,
            Self::Nightly => 8,
        }
    }
}

pub fn profile_from_env() -> SoakProfile {
    match std::env::var("TVD_SOAK_PROFILE")
        .ok()
        .as_deref()
        .unwrap_or("pr_smoke")
    {
        "nightly" => SoakProfile::Nightly,
        _ => SoakProfile::PrSmoke,
    }
}

fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

fn uniform(state: &mut u64) -> f64 {
    (lcg_next(state) >> 11) as f64 / (1u64 << 53) as f64
}

/// Piecewise-constant signal plus bounded noise.
#[derive(Clone, Debug, PartialEq)]
pub struct SteppedSignal {
    /// Integer level in [-10, 10] underlying each sample.
    pub levels: Vec<f64>,
    pub samples: Vec<f64>,
}

/// Integer levels in [-10, 10], each held for [`HOLD`] samples, with uniform
/// noise in `[-NOISE, NOISE]`.
pub fn stepped_signal(len: usize, seed: u64) -> SteppedSignal {
    let mut state = seed ^ 0x9e37_79b9_7f4a_7c15;
    let mut levels = Vec::with_capacity(len);
    let mut samples = Vec::with_capacity(len);
    let mut level = 0.0;

    for idx in 0..len {
        if idx % HOLD == 0 {
            level = (lcg_next(&mut state) % 21) as f64 - 10.0;
        }
        levels.push(level);
        samples.push(level + (uniform(&mut state) * 2.0 - 1.0) * NOISE);
    }

    SteppedSignal { levels, samples }
}
