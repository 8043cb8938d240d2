use crate::types::MacdPoint;

/// RSI over closing prices, Wilder smoothing after an SMA seed.
///
/// Warm-up entries are filled with a neutral 50.0 rather than omitted, and
/// the seed window itself is consumed rather than re-emitted, so for inputs
/// longer than `period + 1` the series runs one entry shorter than `prices`.
/// Downstream chart code indexes positionally against this output shape.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.len() < period + 1 {
        return vec![50.0; prices.len()];
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);
    for pair in prices.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let period_f = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / period_f;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period_f;

    let mut rsi = vec![50.0; period];

    let rs = avg_gain / if avg_loss == 0.0 { 1.0 } else { avg_loss };
    rsi.push(100.0 - 100.0 / (1.0 + rs));

    for i in period + 1..gains.len() {
        avg_gain = (avg_gain * (period_f - 1.0) + gains[i]) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + losses[i]) / period_f;
        let rs = avg_gain / if avg_loss == 0.0 { 0.001 } else { avg_loss };
        rsi.push(100.0 - 100.0 / (1.0 + rs));
    }

    rsi
}

/// EMA seeded with the first data point, not the textbook SMA-of-period seed.
/// The dashboard's historical outputs were produced this way; changing the
/// seeding would shift every downstream MACD series.
pub fn calculate_ema(data: &[f64], period: usize) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = data[0];
    let mut ema = Vec::with_capacity(data.len());
    ema.push(prev);

    for &value in &data[1..] {
        prev = value * k + prev * (1.0 - k);
        ema.push(prev);
    }

    ema
}

/// MACD(12, 26, 9): one point per input price, `date` left empty for the
/// caller to fill positionally.
pub fn calculate_macd(prices: &[f64]) -> Vec<MacdPoint> {
    if prices.len() < 2 {
        return Vec::new();
    }

    let ema12 = calculate_ema(prices, 12);
    let ema26 = calculate_ema(prices, 26);

    let macd_line: Vec<f64> = ema12
        .iter()
        .zip(ema26.iter())
        .map(|(fast, slow)| fast - slow)
        .collect();

    let signal_line = calculate_ema(&macd_line, 9);

    macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(macd, signal)| MacdPoint {
            date: String::new(),
            macd: *macd,
            signal: *signal,
            histogram: macd - signal,
        })
        .collect()
}
