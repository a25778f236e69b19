//! Metrics export format: one JSON object per line.
//!
//! The export endpoint answers a `match[]` selector with JSONL:
//! ```jsonl
//! {"metric":{"__name__":"up","job":"node","instance":"host-a:9100"},"values":[1,1],"timestamps":[1763074402660,1763074412660]}
//! {"metric":{"__name__":"up","job":"node","instance":"host-b:9100"},"values":[1,0],"timestamps":[1763074402660,1763074412660]}
//! ```
//!
//! Lines are parsed independently. A malformed line is reported in
//! [`ExportParse::skipped`] and never stops the remaining lines.
//!
//! NaN samples (staleness markers) arrive as `null`, infinities as the
//! strings `"Infinity"` and `"-Infinity"`. They are kept as non-finite
//! values and never fail the line.

use crate::metric::{MetricSeries, SeriesMap, UNKNOWN_INSTANCE};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Label holding the metric name.
pub const NAME_LABEL: &str = "__name__";

/// A single line of the export body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportLine {
    pub metric: HashMap<String, String>,
    #[serde(default)]
    pub timestamps: Vec<i64>,
    #[serde(default, deserialize_with = "sample_values")]
    pub values: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireSample {
    Number(f64),
    Text(String),
}

fn sample_values<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let raw = Vec::<Option<WireSample>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|sample| match sample {
            Some(WireSample::Number(v)) => v,
            // Rust's float parser accepts "Infinity", "-inf" and "NaN".
            Some(WireSample::Text(s)) => s.trim().parse().unwrap_or(f64::NAN),
            None => f64::NAN,
        })
        .collect())
}

impl ExportLine {
    pub fn metric_name(&self) -> Option<&str> {
        self.label(NAME_LABEL)
    }

    /// `instance`, else `job`, else `"unknown"`. Empty labels count as absent.
    pub fn instance(&self) -> &str {
        self.label("instance")
            .or_else(|| self.label("job"))
            .unwrap_or(UNKNOWN_INSTANCE)
    }

    fn label(&self, name: &str) -> Option<&str> {
        self.metric
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Why a single export line was dropped.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
    #[error("line {line} has no __name__ label")]
    MissingName { line: usize },
}

impl ExportError {
    pub fn line(&self) -> usize {
        match self {
            Self::Json { line, .. } | Self::MissingName { line } => *line,
        }
    }
}

/// Outcome of parsing one export body.
#[derive(Debug, Default)]
pub struct ExportParse {
    pub series: SeriesMap,
    pub skipped: Vec<ExportError>,
    /// Lines whose timestamp/value arrays had different lengths.
    pub truncated: Vec<usize>,
}

// Also returns the longer of the two wire arrays so callers can spot truncation.
fn parse_line(raw: &str, line: usize) -> Result<(MetricSeries, usize), ExportError> {
    let parsed: ExportLine =
        serde_json::from_str(raw).map_err(|source| ExportError::Json { line, source })?;
    let name = parsed
        .metric_name()
        .ok_or(ExportError::MissingName { line })?
        .to_string();
    let instance = parsed.instance().to_string();
    let wire_len = parsed.timestamps.len().max(parsed.values.len());
    let series = MetricSeries::new(name, instance, parsed.timestamps, parsed.values);
    Ok((series, wire_len))
}

/// Parse a whole export body. Blank bodies yield an empty map.
///
/// Later lines overwrite earlier ones that share a series key.
pub fn parse_export(body: &str) -> ExportParse {
    let mut out = ExportParse::default();

    for (idx, raw) in body.lines().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let line = idx + 1;
        match parse_line(raw, line) {
            Ok((series, wire_len)) => {
                if series.len() != wire_len {
                    out.truncated.push(line);
                }
                out.series.insert(series.key(), series);
            }
            Err(err) => out.skipped.push(err),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::SeriesKey;

    #[test]
    fn single_line_yields_keyed_series() {
        let body = "{\"metric\":{\"__name__\":\"up\",\"instance\":\"a\"},\"timestamps\":[1,2],\"values\":[1,1]}\n";
        let parsed = parse_export(body);

        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.series.len(), 1);
        let series = &parsed.series[&SeriesKey::new("up", "a")];
        assert_eq!(series.timestamps(), &[1, 2]);
        assert_eq!(series.values(), &[1.0, 1.0]);
    }

    #[test]
    fn empty_and_blank_bodies_are_empty() {
        assert!(parse_export("").series.is_empty());
        assert!(parse_export("  \n\n \t\n").series.is_empty());
        assert!(parse_export("\n").skipped.is_empty());
    }

    #[test]
    fn malformed_line_does_not_hide_others() {
        let body = concat!(
            "{\"metric\":{\"__name__\":\"up\",\"instance\":\"a\"},\"timestamps\":[1],\"values\":[1]}\n",
            "{not json\n",
            "{\"metric\":{\"__name__\":\"up\",\"instance\":\"b\"},\"timestamps\":[1],\"values\":[0]}\n",
        );
        let parsed = parse_export(body);

        assert_eq!(parsed.series.len(), 2);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].line(), 2);
        assert!(matches!(parsed.skipped[0], ExportError::Json { .. }));
    }

    #[test]
    fn instance_falls_back_to_job_then_unknown() {
        let body = concat!(
            "{\"metric\":{\"__name__\":\"m\",\"job\":\"vmagent\"},\"timestamps\":[1],\"values\":[2]}\n",
            "{\"metric\":{\"__name__\":\"n\"},\"timestamps\":[1],\"values\":[2]}\n",
            "{\"metric\":{\"__name__\":\"o\",\"instance\":\"\",\"job\":\"j\"}}\n",
        );
        let parsed = parse_export(body);

        assert!(parsed.series.contains_key(&SeriesKey::new("m", "vmagent")));
        assert!(parsed.series.contains_key(&SeriesKey::new("n", "unknown")));
        let o = &parsed.series[&SeriesKey::new("o", "j")];
        assert!(o.is_empty());
    }

    #[test]
    fn missing_name_is_skipped() {
        let body = "{\"metric\":{\"instance\":\"a\"},\"timestamps\":[1],\"values\":[1]}";
        let parsed = parse_export(body);

        assert!(parsed.series.is_empty());
        assert!(matches!(
            parsed.skipped.as_slice(),
            [ExportError::MissingName { line: 1 }]
        ));
    }

    #[test]
    fn duplicate_keys_keep_the_last_line() {
        let body = concat!(
            "{\"metric\":{\"__name__\":\"up\",\"instance\":\"a\"},\"timestamps\":[1],\"values\":[1]}\n",
            "{\"metric\":{\"__name__\":\"up\",\"instance\":\"a\"},\"timestamps\":[5,6],\"values\":[0,0]}\n",
        );
        let parsed = parse_export(body);

        assert_eq!(parsed.series.len(), 1);
        assert_eq!(
            parsed.series[&SeriesKey::new("up", "a")].timestamps(),
            &[5, 6]
        );
    }

    #[test]
    fn null_and_infinite_samples_keep_the_series() {
        let body = concat!(
            "{\"metric\":{\"__name__\":\"up\",\"instance\":\"a\"},\"timestamps\":[1,2,3],\"values\":[1,null,1]}\n",
            "{\"metric\":{\"__name__\":\"rate\",\"instance\":\"a\"},\"timestamps\":[1,2],\"values\":[\"Infinity\",\"-Infinity\"]}\n",
        );
        let parsed = parse_export(body);

        assert!(parsed.skipped.is_empty());
        assert!(parsed.truncated.is_empty());
        let up = &parsed.series[&SeriesKey::new("up", "a")];
        assert_eq!(up.len(), 3);
        assert_eq!(up.values()[0], 1.0);
        assert!(up.values()[1].is_nan());
        assert_eq!(up.values()[2], 1.0);

        let rate = &parsed.series[&SeriesKey::new("rate", "a")];
        assert_eq!(rate.values(), &[f64::INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn uneven_arrays_are_reported_and_truncated() {
        let body = "{\"metric\":{\"__name__\":\"up\",\"instance\":\"a\"},\"timestamps\":[1,2,3],\"values\":[1]}";
        let parsed = parse_export(body);

        assert_eq!(parsed.truncated, vec![1]);
        assert_eq!(parsed.series[&SeriesKey::new("up", "a")].len(), 1);
    }
}
