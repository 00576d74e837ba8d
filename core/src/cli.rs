use std::fmt::Write as _;

use crate::metrics::cluster_name;
use crate::types::AnalysisOutput;

/// Tekstrapport over klyngene i et resultatsett.
pub fn format_cluster_report(output: &AnalysisOutput) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "--- Cluster Report ---");

    if let Some(err) = &output.error {
        let _ = writeln!(s, "Last recompute failed: {err}");
    }

    let (Some(sessions), Some(metrics)) = (&output.sessions, &output.cluster_metrics) else {
        let _ = writeln!(s, "No analysis yet.");
        return s;
    };

    let _ = writeln!(s, "Sessions: {}", sessions.len());
    for (id, m) in metrics {
        let label = sessions
            .iter()
            .find(|p| p.cluster == *id)
            .map(|p| p.descriptor.as_str())
            .unwrap_or("");
        let stability = output
            .stability
            .as_ref()
            .and_then(|st| st.get(id))
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".into());
        let _ = writeln!(
            s,
            "{} [{}]: runs={} good={} meanΔ={:+.2} var={:.3} breaches={} flagged={} stability={}",
            cluster_name(*id),
            label,
            m.runs,
            m.good_runs,
            m.mean_pace_delta,
            m.variance,
            m.boundary_breaches,
            m.flagged_runs,
            stability
        );
    }

    for line in output.insights.iter().flatten() {
        let _ = writeln!(s, "* {line}");
    }
    if let Some(n) = &output.narrative {
        let _ = writeln!(s, "{n}");
    }
    if let Some(last) = output.trend.as_ref().and_then(|t| t.last()) {
        let _ = writeln!(
            s,
            "Good-day ratio {}: {:.2} [{:.2}, {:.2}]",
            last.date, last.ratio, last.lower, last.upper
        );
    }
    if let Some(g) = &output.good_day_stats {
        let _ = writeln!(
            s,
            "Streak: current {} / best {}, personal best Δ {:+.2}",
            g.current_streak, g.best_streak, g.personal_best
        );
    }
    s
}

pub fn print_cluster_report(output: &AnalysisOutput) {
    print!("{}", format_cluster_report(output));
}
