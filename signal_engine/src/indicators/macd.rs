/// indicators/macd.rs — MACD histogram
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// EMA (recursive, seeded with the first observation):
///
///   α      = 2 / (n + 1)
///   EMA_0  = x_0
///   EMA_t  = α·x_t + (1 − α)·EMA_{t−1}
///
///   A value is reported only once n observations have been folded in
///   (warm-up of n − 1 bars).
///
/// MACD:
///
///   line_t   = EMA_fast(close)_t − EMA_slow(close)_t      valid t ≥ slow − 1
///   signal_t = EMA_signal(line)_t, seeded at t = slow − 1  valid t ≥ slow + signal − 2
///   hist_t   = line_t − signal_t
///
/// A sign change of hist_t marks the MACD line crossing its signal line.
/// ─────────────────────────────────────────────────────────────────────────

/// Raw EMA recursion over every input, without warm-up masking.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &x in values {
        let v = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(v);
        prev = Some(v);
    }
    out
}

/// MACD histogram aligned with `closes`; warm-up bars are `None`.
pub fn histogram(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut hist = vec![None; n];
    if slow == 0 || signal == 0 || n < slow {
        return hist;
    }

    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);

    // MACD line from its first valid bar onward
    let line: Vec<f64> = (slow - 1..n).map(|t| ema_fast[t] - ema_slow[t]).collect();
    let sig = ema(&line, signal);

    for (j, (&l, &s)) in line.iter().zip(sig.iter()).enumerate() {
        if j + 1 >= signal {
            hist[slow - 1 + j] = Some(l - s);
        }
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeds_with_first_value() {
        let out = ema(&[10.0, 10.0, 10.0], 3);
        assert_eq!(out, vec![10.0, 10.0, 10.0]);

        // α = 0.5 for period 3
        let out = ema(&[0.0, 4.0], 3);
        assert!((out[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn warmup_length_is_slow_plus_signal_minus_two() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let hist = histogram(&closes, 12, 26, 9);
        let first = hist.iter().position(|h| h.is_some());
        assert_eq!(first, Some(26 + 9 - 2));
        assert!(hist[33..].iter().all(|h| h.is_some()));
    }

    #[test]
    fn flat_prices_give_zero_histogram() {
        let hist = histogram(&[42.0; 50], 12, 26, 9);
        assert!(hist.iter().flatten().all(|h| h.abs() < 1e-12));
    }

    #[test]
    fn reversal_flips_histogram_sign() {
        // Long decline followed by a sharp rally: hist ends positive
        let mut closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        closes.extend((0..15).map(|i| 141.0 + 4.0 * i as f64));
        let hist = histogram(&closes, 12, 26, 9);
        assert!(hist[59].unwrap() < 0.0);
        assert!(hist.last().copied().flatten().unwrap() > 0.0);
    }

    #[test]
    fn short_series_is_all_warmup() {
        let hist = histogram(&[1.0, 2.0, 3.0], 12, 26, 9);
        assert!(hist.iter().all(|h| h.is_none()));
    }
}
