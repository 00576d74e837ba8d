use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::{GoodDayStats, SessionPoint, TrendPoint};

const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DayCount {
    good: usize,
    total: usize,
}

/// Normal-approksimert 95 %-intervall for en andel, klippet til [0, 1].
/// total = 0 gir (0, 0, 0).
pub fn proportion_interval(good: usize, total: usize) -> (f64, f64, f64) {
    if total == 0 {
        return (0.0, 0.0, 0.0);
    }
    let p = good as f64 / total as f64;
    let margin = Z_95 * (p * (1.0 - p) / total as f64).sqrt();
    (p, (p - margin).max(0.0), (p + margin).min(1.0))
}

/// Rullerende andel gode økter per dato over de siste `window` dagsbøttene
/// (bøtter = datoer med økter). Falske positiver ekskluderes.
pub fn good_day_trend(points: &[SessionPoint], window: usize) -> Vec<TrendPoint> {
    let mut by_date: BTreeMap<NaiveDate, DayCount> = BTreeMap::new();
    for p in points.iter().filter(|p| !p.is_false_positive) {
        let day = by_date.entry(p.date).or_default();
        day.total += 1;
        if p.good {
            day.good += 1;
        }
    }

    let days: Vec<(NaiveDate, DayCount)> = by_date.into_iter().collect();
    let window = window.max(1);
    days.iter()
        .enumerate()
        .map(|(i, (date, _))| {
            let start = (i + 1).saturating_sub(window);
            let (good, total) = days[start..=i]
                .iter()
                .fold((0, 0), |(g, t), (_, c)| (g + c.good, t + c.total));
            let (ratio, lower, upper) = proportion_interval(good, total);
            TrendPoint { date: *date, ratio, lower, upper }
        })
        .collect()
}

/// Rekker av påfølgende kalenderdager med minst én god økt, og beste paceDelta.
pub fn good_day_stats(points: &[SessionPoint]) -> GoodDayStats {
    let mut good: Vec<&SessionPoint> = points.iter().filter(|p| p.good).collect();
    // Sorter på start (dato som fallback)
    good.sort_by_key(|p| (p.date, p.start));

    let mut stats = GoodDayStats::default();
    for p in good {
        let day = p.start.map(|t| t.date_naive()).unwrap_or(p.date);
        if p.pace_delta > stats.personal_best {
            stats.personal_best = p.pace_delta;
        }
        if let Some(last) = stats.last_date {
            if day <= last {
                continue;
            }
            stats.current_streak = if last.succ_opt() == Some(day) {
                stats.current_streak + 1
            } else {
                1
            };
        } else {
            stats.current_streak = 1;
        }
        stats.last_date = Some(day);
        stats.best_streak = stats.best_streak.max(stats.current_streak);
    }
    stats
}
