use crate::metric::{MetricSeries, SeriesMap};

/// One export line for `name` on `instance` with the given samples.
pub fn export_line(name: &str, instance: &str, samples: &[(i64, f64)]) -> String {
    let timestamps: Vec<i64> = samples.iter().map(|(ts, _)| *ts).collect();
    let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
    serde_json::json!({
        "metric": { "__name__": name, "instance": instance },
        "timestamps": timestamps,
        "values": values,
    })
    .to_string()
}

/// Export body made of the given lines, newline-terminated.
pub fn export_body<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines.into_iter().fold(String::new(), |mut body, line| {
        body.push_str(line.as_ref());
        body.push('\n');
        body
    })
}

/// Series map holding a single series.
pub fn series_map(name: &str, instance: &str, samples: &[(i64, f64)]) -> SeriesMap {
    let series = MetricSeries::new(
        name,
        instance,
        samples.iter().map(|(ts, _)| *ts).collect(),
        samples.iter().map(|(_, v)| *v).collect(),
    );
    SeriesMap::from([(series.key(), series)])
}
