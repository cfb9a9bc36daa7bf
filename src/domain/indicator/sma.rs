//! Simple moving average.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) entries are undefined.

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut values = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i + 1 < period {
            values.push(None);
        } else {
            let window = &closes[i + 1 - period..=i];
            values.push(Some(window.iter().sum::<f64>() / period as f64));
        }
    }
    values
}
