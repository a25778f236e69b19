//! Turns polled series into chart-ready point lists.

use crate::metric::{MetricSeries, SeriesKey, SeriesMap};
use crate::palette::{color_for, Rgb};
use crate::selection::TimeRange;
use chrono::{Local, TimeZone};

/// One dataset of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub key: SeriesKey,
    pub label: String,
    pub color: Rgb,
    /// `(unix seconds, value)`, oldest first.
    pub points: Vec<(f64, f64)>,
}

/// Axis bounds covering a set of datasets. The y axis always starts at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

/// `(unix seconds, value)` for samples at or after `cutoff_ms`. Non-finite
/// values are dropped since they cannot be plotted.
fn points_since(series: &MetricSeries, cutoff_ms: Option<i64>) -> Vec<(f64, f64)> {
    series
        .samples()
        .filter(|(ts, value)| value.is_finite() && cutoff_ms.is_none_or(|c| *ts >= c))
        .map(|(ts, value)| (ts as f64 / 1000.0, value))
        .collect()
}

/// One dataset per series, limited to `window` before the newest sample of
/// the whole map.
pub fn chart_series(map: &SeriesMap, window: Option<TimeRange>) -> Vec<ChartSeries> {
    let newest = map
        .values()
        .filter_map(MetricSeries::latest)
        .map(|(ts, _)| ts)
        .max();
    let cutoff = match (window, newest) {
        (Some(range), Some(newest)) => {
            Some(newest.saturating_sub(range.duration().as_millis() as i64))
        }
        _ => None,
    };

    map.iter()
        .map(|(key, series)| ChartSeries {
            key: key.clone(),
            label: series.label(),
            color: color_for(key.as_str()),
            points: points_since(series, cutoff),
        })
        .collect()
}

/// `None` when no dataset has a point.
pub fn bounds(datasets: &[ChartSeries]) -> Option<ChartBounds> {
    let mut points = datasets
        .iter()
        .flat_map(|d| d.points.iter().copied())
        .filter(|(x, y)| x.is_finite() && y.is_finite());
    let (x0, y0) = points.next()?;
    let (mut x_min, mut x_max, mut y_max) = (x0, x0, y0);
    for (x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_max = y_max.max(y);
    }
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    Some(ChartBounds {
        x: [x_min, x_max],
        y: [0.0, y_max.max(1.0)],
    })
}

/// Local wall-clock label for an x-axis position.
pub fn time_label(unix_secs: f64, range: TimeRange) -> String {
    let fmt = match range {
        TimeRange::Hour1 | TimeRange::Hours6 => "%H:%M",
        TimeRange::Hours24 => "%d %H:%M",
        TimeRange::Days7 => "%m-%d %H:%M",
    };
    match Local.timestamp_opt(unix_secs.floor() as i64, 0) {
        chrono::LocalResult::Single(dt) => dt.format(fmt).to_string(),
        _ => String::from("--:--"),
    }
}
