//! Series selector sent as `match[]` to the export endpoint.
//!
//! Metric names are joined into a regex alternation without escaping, so a
//! name containing regex metacharacters widens the match. Names come from the
//! label-values endpoint, which keeps this in line with what the backend
//! stores.

use crate::selection::Selection;

/// `{__name__=~"m1|m2",job="X"}`, or without the job matcher when `job` is
/// `None` or empty.
pub fn build_selector<S: AsRef<str>>(metrics: &[S], job: Option<&str>) -> String {
    let names = metrics
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("|");

    match job.filter(|j| !j.is_empty()) {
        Some(job) => format!("{{__name__=~\"{names}\",job=\"{job}\"}}"),
        None => format!("{{__name__=~\"{names}\"}}"),
    }
}

/// Selector for the current selection, `None` when nothing is selected.
pub fn selector_for(selection: &Selection) -> Option<String> {
    if !selection.is_active() {
        return None;
    }
    Some(build_selector(selection.metrics(), selection.job()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_job() {
        assert_eq!(build_selector(&["up"], None), r#"{__name__=~"up"}"#);
        assert_eq!(build_selector(&["up"], Some("")), r#"{__name__=~"up"}"#);
    }

    #[test]
    fn with_job_and_many_metrics() {
        assert_eq!(
            build_selector(&["up", "node_load1", "go_goroutines"], Some("vmagent")),
            r#"{__name__=~"up|node_load1|go_goroutines",job="vmagent"}"#
        );
    }

    #[test]
    fn metacharacters_are_passed_through() {
        assert_eq!(build_selector(&["a.b+"], None), r#"{__name__=~"a.b+"}"#);
    }

    #[test]
    fn selection_without_metrics_has_no_selector() {
        let mut sel = Selection::default();
        assert_eq!(selector_for(&sel), None);
        sel.toggle_metric("up");
        sel.set_job(Some("node".to_string()));
        assert_eq!(
            selector_for(&sel).as_deref(),
            Some(r#"{__name__=~"up",job="node"}"#)
        );
    }
}
