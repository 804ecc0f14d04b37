//! Derived status and return fields for a raw price panel.
//!
//! [`add_status_fields`] turns a panel of raw daily quotes into one the factors
//! and the evaluator can consume: trading status flags plus realized and forward
//! returns that never span a suspension or a pre-listing period.

use ronda_traits::{Panel, Result};

/// Forward return horizons, in trading days, with their column names.
const FORWARD_HORIZONS: [(usize, &str); 2] = [(1, "ret_fwd_1d"), (5, "ret_fwd_5d")];

/// Append status and return fields, computed per asset in chronological order.
///
/// - `suspended`: 1 when `volume` is zero or missing, else 0
/// - `listed`: 1 from the asset's first non-missing `close` onward, else 0
/// - `limit_up` / `limit_down`: 1 when `close` equals `high` / `low`, NaN when either
///   is missing; only added when the panel has `high` / `low`
/// - `ret_1d`: `close(t) / close(t-1) - 1`, bridging a missing previous close with
///   the last available one; NaN when suspended or not listed
/// - `ret_fwd_1d`, `ret_fwd_5d`: `close(t+h) / close(t) - 1`, NaN unless the asset is
///   listed and trading on day t and on each of the next h days
///
/// # Errors
///
/// Returns [`ronda_traits::RondaError::MissingColumn`] if `close` or `volume` is
/// absent.
pub fn add_status_fields(panel: &Panel) -> Result<Panel> {
    let index = panel.index();
    let close = panel.float_column("close")?;
    let volume = panel.float_column("volume")?;
    let n = panel.len();

    let suspended: Vec<f64> = volume
        .iter()
        .map(|&v| if v.is_nan() || v == 0.0 { 1.0 } else { 0.0 })
        .collect();
    let mut listed = vec![0.0; n];
    let mut ret_1d = vec![f64::NAN; n];
    let mut forward: Vec<Vec<f64>> = FORWARD_HORIZONS.iter().map(|_| vec![f64::NAN; n]).collect();

    for rows in index.asset_rows() {
        let mut seen_close = false;
        for &row in rows {
            seen_close |= !close[row].is_nan();
            if seen_close {
                listed[row] = 1.0;
            }
        }
        let trading = |row: usize| listed[row] == 1.0 && suspended[row] == 0.0;

        let mut last_close = f64::NAN;
        for (i, &row) in rows.iter().enumerate() {
            if i > 0 && trading(row) {
                let previous = close[rows[i - 1]];
                let base = if previous.is_nan() { last_close } else { previous };
                ret_1d[row] = simple_return(base, close[row]);
            }
            if !close[row].is_nan() {
                last_close = close[row];
            }

            for ((horizon, _), out) in FORWARD_HORIZONS.iter().zip(forward.iter_mut()) {
                let Some(window) = rows.get(i..=i + horizon) else {
                    continue;
                };
                if window.iter().all(|&r| trading(r)) {
                    out[row] = simple_return(close[row], close[window[*horizon]]);
                }
            }
        }
    }

    let trading_days = suspended.iter().filter(|&&s| s == 0.0).count();
    log::debug!("status fields: {trading_days} of {n} rows trading");

    let mut columns = vec![
        ("suspended", suspended),
        ("listed", listed),
        ("ret_1d", ret_1d),
    ];
    for ((_, name), values) in FORWARD_HORIZONS.iter().zip(forward) {
        columns.push((*name, values));
    }
    for (bound, name) in [("high", "limit_up"), ("low", "limit_down")] {
        if let Some(limit) = panel.optional_float_column(bound)? {
            columns.push((name, at_limit(&close, &limit)));
        }
    }

    panel.with_float_columns(columns)
}

fn simple_return(from: f64, to: f64) -> f64 {
    let r = to / from - 1.0;
    if r.is_finite() { r } else { f64::NAN }
}

fn at_limit(close: &[f64], limit: &[f64]) -> Vec<f64> {
    close
        .iter()
        .zip(limit)
        .map(|(&c, &l)| {
            if c.is_nan() || l.is_nan() {
                f64::NAN
            } else if c == l {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use polars::prelude::*;
    use ronda_traits::RondaError;

    fn single_asset(close: &[Option<f64>], volume: &[Option<f64>]) -> Panel {
        let dates: Vec<String> = (0..close.len())
            .map(|i| format!("2024-02-{:02}", i + 1))
            .collect();
        let df = DataFrame::new(vec![
            Column::new("date".into(), dates),
            Column::new("code".into(), vec!["600000.SH"; close.len()]),
            Column::new("close".into(), close.to_vec()),
            Column::new("volume".into(), volume.to_vec()),
        ])
        .unwrap();
        Panel::new(df).unwrap()
    }

    #[test]
    fn test_status_flags_and_daily_return() {
        let close = [None, Some(10.0), Some(11.0), None, Some(12.1), Some(12.1)];
        let volume = [None, Some(5.0), Some(5.0), Some(0.0), Some(5.0), Some(5.0)];
        let panel = add_status_fields(&single_asset(&close, &volume)).unwrap();

        assert_eq!(panel.float_column("listed").unwrap(), vec![0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(panel.float_column("suspended").unwrap(), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

        let ret = panel.float_column("ret_1d").unwrap();
        assert!(ret[0].is_nan());
        // First listed day has no earlier close.
        assert!(ret[1].is_nan());
        assert_abs_diff_eq!(ret[2], 0.1, epsilon = 1e-12);
        assert!(ret[3].is_nan());
        // Bridged over the suspension from the last close.
        assert_abs_diff_eq!(ret[4], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(ret[5], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_one_day() {
        let close = [Some(10.0), Some(11.0), None, Some(12.1), Some(13.31)];
        let volume = [Some(5.0), Some(5.0), Some(0.0), Some(5.0), Some(5.0)];
        let panel = add_status_fields(&single_asset(&close, &volume)).unwrap();
        let fwd = panel.float_column("ret_fwd_1d").unwrap();

        assert_abs_diff_eq!(fwd[0], 0.1, epsilon = 1e-12);
        // Next day suspended.
        assert!(fwd[1].is_nan());
        assert!(fwd[2].is_nan());
        assert_abs_diff_eq!(fwd[3], 0.1, epsilon = 1e-12);
        // No next day.
        assert!(fwd[4].is_nan());
    }

    #[test]
    fn test_forward_five_days() {
        let close: Vec<Option<f64>> = (1..=8).map(|c| Some(f64::from(c))).collect();
        let mut volume = vec![Some(1.0); 8];
        volume[7] = Some(0.0);
        let panel = add_status_fields(&single_asset(&close, &volume)).unwrap();
        let fwd = panel.float_column("ret_fwd_5d").unwrap();

        assert_abs_diff_eq!(fwd[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fwd[1], 2.5, epsilon = 1e-12);
        // The window reaches the suspended last day.
        assert!(fwd[2].is_nan());
        assert!(fwd[3..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_limit_flags_only_with_bounds() {
        let panel = single_asset(&[Some(1.0)], &[Some(1.0)]);
        let out = add_status_fields(&panel).unwrap();
        assert!(!out.has_column("limit_up"));

        let df = df! {
            "date" => &["2024-02-01", "2024-02-01", "2024-02-01"],
            "code" => &["A", "B", "C"],
            "close" => &[Some(11.0), Some(9.0), None],
            "high" => &[Some(11.0), Some(9.5), Some(1.0)],
            "low" => &[Some(10.0), Some(9.0), Some(1.0)],
            "volume" => &[1.0, 1.0, 1.0],
        }
        .unwrap();
        let out = add_status_fields(&Panel::new(df).unwrap()).unwrap();
        let up = out.float_column("limit_up").unwrap();
        let down = out.float_column("limit_down").unwrap();
        assert_eq!(&up[..2], &[1.0, 0.0]);
        assert_eq!(&down[..2], &[0.0, 1.0]);
        assert!(up[2].is_nan() && down[2].is_nan());
    }

    #[test]
    fn test_requires_volume() {
        let df = df! {
            "date" => &["2024-02-01"],
            "code" => &["A"],
            "close" => &[1.0],
        }
        .unwrap();
        let err = add_status_fields(&Panel::new(df).unwrap()).unwrap_err();
        assert!(matches!(err, RondaError::MissingColumn(c) if c == "volume"));
    }
}
