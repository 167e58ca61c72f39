//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Every output point is defined, so callers enforce their own lookback.

pub fn smoothing_factor(length: usize) -> f64 {
    2.0 / (length as f64 + 1.0)
}

pub fn calculate_ema(closes: &[f64], length: usize) -> Vec<f64> {
    if length == 0 || closes.is_empty() {
        return Vec::new();
    }

    let k = smoothing_factor(length);
    let mut values = Vec::with_capacity(closes.len());
    let mut ema = closes[0];
    values.push(ema);

    for &close in &closes[1..] {
        ema = close * k + ema * (1.0 - k);
        values.push(ema);
    }

    values
}
