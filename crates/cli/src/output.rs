use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};
use vigil_api::Agent;
use vigil_core::{MetricSeries, SeriesMap};

/// Output format for scripted commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Agents as aligned `id  name  token  created` rows.
pub fn write_agents(agents: &[Agent], format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    if format == OutputFormat::Json {
        writeln!(out, "{}", serde_json::to_string_pretty(agents)?)?;
        return Ok(());
    }
    if agents.is_empty() {
        writeln!(out, "No agents registered.")?;
        return Ok(());
    }
    let id_w = agents.iter().map(|a| a.id.len()).max().unwrap_or(2).max(2);
    let name_w = agents.iter().map(|a| a.name.len()).max().unwrap_or(4).max(4);
    let token_w = agents.iter().map(|a| a.token.len()).max().unwrap_or(5).max(5);
    writeln!(out, "{:id_w$}  {:name_w$}  {:token_w$}  CREATED", "ID", "NAME", "TOKEN")?;
    for a in agents {
        let created = a.created_at.as_deref().unwrap_or("-");
        writeln!(
            out,
            "{:id_w$}  {:name_w$}  {:token_w$}  {created}",
            a.id, a.name, a.token
        )?;
    }
    Ok(())
}

/// One line per series: label, sample count and the latest value.
pub fn write_series(series: &SeriesMap, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    if format == OutputFormat::Json {
        let list: Vec<&MetricSeries> = series.values().collect();
        writeln!(out, "{}", serde_json::to_string(&list)?)?;
        return Ok(());
    }
    if series.is_empty() {
        writeln!(out, "No series matched.")?;
        return Ok(());
    }
    for s in series.values() {
        match s.latest() {
            Some((ts, value)) => writeln!(
                out,
                "{}  {} samples  latest {} at {}",
                s.label(),
                s.len(),
                value,
                format_ts(ts)
            )?,
            None => writeln!(out, "{}  no samples", s.label())?,
        }
    }
    Ok(())
}

fn format_ts(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::testing::series_map;

    fn agent(id: &str, name: &str) -> Agent {
        Agent {
            id: id.into(),
            name: name.into(),
            token: format!("token_{id}"),
            created_at: None,
        }
    }

    fn render_agents(agents: &[Agent], format: OutputFormat) -> String {
        let mut buf = Vec::new();
        write_agents(agents, format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn agent_table_is_aligned() {
        let text = render_agents(&[agent("1", "web-01"), agent("22", "db")], OutputFormat::Text);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID  NAME    TOKEN"));
        assert!(lines[1].starts_with("1   web-01  token_1"));
        assert!(lines[2].ends_with("-"));
    }

    #[test]
    fn agent_json_round_trips() {
        let text = render_agents(&[agent("1", "web-01")], OutputFormat::Json);
        let parsed: Vec<Agent> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0].name, "web-01");
    }

    #[test]
    fn series_lines_show_latest_value() {
        let map = series_map("up", "node-1:9100", &[(1_000, 0.0), (2_000, 1.0)]);
        let mut buf = Vec::new();
        write_series(&map, OutputFormat::Text, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("up (node-1:9100)  2 samples  latest 1 at "));
    }

    #[test]
    fn empty_series_says_so() {
        let mut buf = Vec::new();
        write_series(&SeriesMap::new(), OutputFormat::Text, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "No series matched.\n");
    }
}
