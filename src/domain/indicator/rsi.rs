//! RSI (Relative Strength Index) over a rolling window.
//!
//! Average gain and average loss are simple means of the last n close-to-close
//! changes. RSI = 100 - (100 / (1 + avg_gain / avg_loss)).
//! If avg_loss == 0: RSI = 100, unless there was no movement at all, then 50.
//!
//! Warmup: first n entries are undefined (n changes need n+1 closes).

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < 2 {
        return vec![None; closes.len()];
    }

    let mut gains: Vec<f64> = Vec::with_capacity(closes.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(closes.len() - 1);
    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut values = vec![None; closes.len()];
    for i in period..closes.len() {
        let range = i - period..i;
        let avg_gain = gains[range.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[range].iter().sum::<f64>() / period as f64;
        values[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    values
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
