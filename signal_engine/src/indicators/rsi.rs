/// indicators/rsi.rs — Relative Strength Index
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
///   Δ_t    = close_t − close_{t−1}                    t ≥ 1
///   gain_t = max(Δ_t, 0),   loss_t = max(−Δ_t, 0)
///
/// Wilder smoothing (α = 1/n), seeded with the first delta:
///
///   G_t = α·gain_t + (1 − α)·G_{t−1}
///   L_t = α·loss_t + (1 − α)·L_{t−1}
///
///   RSI_t = 100 − 100 / (1 + G_t / L_t)      (L_t = 0 → 100)
///
/// Valid once n deltas have been folded in, i.e. from t = n.
/// RSI < 25 reads as oversold and RSI > 75 as overbought in this engine.
/// ─────────────────────────────────────────────────────────────────────────

pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for t in 1..closes.len() {
        let change = closes[t] - closes[t - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if t == 1 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        }

        if t >= period {
            out[t] = Some(if avg_loss == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::rsi;

    #[test]
    fn defined_from_period_onward() {
        let closes: Vec<f64> = (0..12).map(|i| 10.0 + (i % 4) as f64).collect();
        let out = rsi(&closes, 6);
        assert!(out[..6].iter().all(|v| v.is_none()));
        assert!(out[6..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn monotonic_rise_saturates_at_100() {
        let closes: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let out = rsi(&closes, 6);
        assert_eq!(out.last().copied().flatten(), Some(100.0));
    }

    #[test]
    fn monotonic_fall_goes_to_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let v = rsi(&closes, 6).last().copied().flatten().unwrap();
        assert!(v.abs() < 1e-9, "rsi = {v}");
    }

    #[test]
    fn stays_within_bounds() {
        let closes: Vec<f64> = (0..200).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        for v in rsi(&closes, 6).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn too_short_is_undefined() {
        assert!(rsi(&[1.0, 2.0, 3.0], 6).iter().all(|v| v.is_none()));
        assert!(rsi(&[1.0, 2.0], 0).iter().all(|v| v.is_none()));
    }
}
