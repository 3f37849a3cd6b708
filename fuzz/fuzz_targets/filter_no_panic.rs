// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use tvd_core::ExecutionContext;
use tvd_filter::{EdgeOffset, StreamingTvFilter, TvFilter, TvFilterConfig};

struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next_u8(&mut self) -> u8 {
        let value = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos = self.pos.saturating_add(1);
        value
    }

    fn next_i16(&mut self) -> i16 {
        i16::from_le_bytes([self.next_u8(), self.next_u8()])
    }

    fn next_f64_bits(&mut self) -> f64 {
        let mut bytes = [0u8; 8];
        for byte in &mut bytes {
            *byte = self.next_u8();
        }
        f64::from_le_bytes(bytes)
    }
}

fn build_lambda(seed: u8) -> f64 {
    match seed % 8 {
        0 => 0.0,
        1 => -1.0,
        2 => f64::NAN,
        3 => 1.0e6,
        _ => f64::from(seed) / 32.0,
    }
}

fn build_sample(cursor: &mut ByteCursor<'_>) -> f64 {
    match cursor.next_u8() % 16 {
        0 => {
            let raw = cursor.next_f64_bits();
            if raw.is_finite() {
                raw.clamp(-1.0e12, 1.0e12)
            } else {
                raw
            }
        }
        1 => f64::NAN,
        2 => f64::INFINITY,
        _ => f64::from(cursor.next_i16()) / 64.0,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = ByteCursor::new(data);

    let config = TvFilterConfig {
        lambda: build_lambda(cursor.next_u8()),
        edge_offset: if cursor.next_u8() & 1 == 0 {
            EdgeOffset::FullLambda
        } else {
            EdgeOffset::HalfLambda
        },
        progress_every: usize::from(cursor.next_u8() % 8),
    };

    let len = usize::from(cursor.next_u8());
    let samples = (0..len)
        .map(|_| build_sample(&mut cursor))
        .collect::<Vec<_>>();
    let ctx = ExecutionContext::new();

    let Ok(filter) = TvFilter::new(config.clone()) else {
        return;
    };
    let Ok(batch) = filter.filter(&samples, &ctx) else {
        return;
    };

    assert_eq!(batch.values.len(), samples.len());
    let input_sum = samples.iter().sum::<f64>();
    let output_sum = batch.values.iter().sum::<f64>();
    let scale = samples.iter().map(|x| x.abs()).sum::<f64>().max(1.0);
    assert!(batch.values.iter().all(|y| y.is_finite()));
    assert!(
        (input_sum - output_sum).abs() <= 1.0e-9 * scale * (samples.len() as f64 + 1.0),
        "sum drifted: {input_sum} vs {output_sum}"
    );

    let Ok(mut stream) = StreamingTvFilter::<f64>::new(config) else {
        return;
    };
    let mut streamed = Vec::with_capacity(samples.len());
    for &x in &samples {
        if stream.push(x, &mut streamed).is_err() {
            return;
        }
    }
    if stream.finish(&mut streamed, &ctx).is_err() {
        return;
    }
    assert_eq!(streamed, batch.values);
});
