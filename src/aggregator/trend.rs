use crate::error::{KpiError, KpiResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated observation of a score or KPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Movement between the earliest and latest points of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendChange {
    pub from: TrendPoint,
    pub to: TrendPoint,
    pub delta: f64,
    pub window_days: i64,
}

/// Compares the earliest and the latest point of `points` by date. Input
/// order does not matter.
pub fn trend_change(points: &[TrendPoint]) -> KpiResult<TrendChange> {
    let from = *points
        .iter()
        .min_by_key(|p| p.date)
        .ok_or(KpiError::EmptyInput)?;
    let to = *points
        .iter()
        .max_by_key(|p| p.date)
        .ok_or(KpiError::EmptyInput)?;

    Ok(TrendChange {
        from,
        to,
        delta: to.value - from.value,
        window_days: (to.date - from.date).num_days(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(m: u32, d: u32, value: f64) -> TrendPoint {
        TrendPoint {
            date: NaiveDate::from_ymd_opt(2024, m, d).unwrap(),
            value,
        }
    }

    #[test]
    fn test_trend_change_over_outlet_series() {
        let series = [
            point(5, 1, 82.5),
            point(5, 8, 84.2),
            point(5, 15, 86.1),
            point(6, 5, 89.4),
            point(6, 12, 92.5),
        ];
        let change = trend_change(&series).unwrap();

        assert_eq!(change.from.value, 82.5);
        assert_eq!(change.to.value, 92.5);
        assert!((change.delta - 10.0).abs() < 1e-9);
        assert_eq!(change.window_days, 42);
    }

    #[test]
    fn test_trend_change_ignores_input_order() {
        let series = [point(6, 12, 92.5), point(5, 1, 82.5), point(5, 29, 87.3)];
        let change = trend_change(&series).unwrap();

        assert_eq!(change.from.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(change.to.date, NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
    }

    #[test]
    fn test_trend_change_single_point() {
        let change = trend_change(&[point(6, 12, 92.5)]).unwrap();
        assert_eq!(change.delta, 0.0);
        assert_eq!(change.window_days, 0);
    }

    #[test]
    fn test_trend_change_empty_series() {
        assert_eq!(trend_change(&[]), Err(KpiError::EmptyInput));
    }
}
