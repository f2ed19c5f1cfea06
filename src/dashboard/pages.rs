use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::charts::{decimal_value, Chart, ChartKind, Trace};
use crate::analytics::intervals::summarize as summarize_intervals;
use crate::analytics::streaks::summarize as summarize_streaks;
use crate::analytics::{
    calculate_metrics, correlation_matrix, count_hit_sequences_by, direction_distribution,
    error_vs_movement, hit_intervals, hit_rate_by_quantile, hit_rate_heatmap, hits_by_day,
    hits_by_week_and_hour, hits_per_window, misses_by_direction, misses_by_hour_day,
    overall_metrics, pair_distribution, record_streaks, sorted_by_time, streak_histogram,
    volatility_by_hour_day, BinMetrics, DirectionKind, GroupBy, GroupValue, HourDayCount,
};
use crate::config::AnalysisSettings;
use crate::dataset::{Dataset, RecordFilter};
use crate::error::Result;
use crate::types::{DayOfWeek, HitColumn, Outcome, PeriodOfDay, PredictionRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RATE_AXIS: &str = "Hit rate (%)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Summary,
    Temporal,
    HourDay,
    Pair,
    Errors,
    Advanced,
}

impl PageKind {
    pub fn all() -> [PageKind; 6] {
        [
            PageKind::Summary,
            PageKind::Temporal,
            PageKind::HourDay,
            PageKind::Pair,
            PageKind::Errors,
            PageKind::Advanced,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            PageKind::Summary => "summary",
            PageKind::Temporal => "temporal",
            PageKind::HourDay => "hour-day",
            PageKind::Pair => "pair",
            PageKind::Errors => "errors",
            PageKind::Advanced => "advanced",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PageKind::Summary => "Summary",
            PageKind::Temporal => "Temporal Analysis",
            PageKind::HourDay => "Hour and Day Analysis",
            PageKind::Pair => "Pair Analysis",
            PageKind::Errors => "Error Analysis",
            PageKind::Advanced => "Advanced Analysis",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        PageKind::all()
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub label: String,
    pub value: String,
}

impl Card {
    fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub page: PageKind,
    pub title: String,
    pub records: usize,
    pub filter: RecordFilter,
    pub column: HitColumn,
    pub cards: Vec<Card>,
    pub charts: Vec<Chart>,
}

#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub filter: RecordFilter,
    pub column: HitColumn,
}

/// Filters the dataset and assembles every card and chart of one page.
pub fn build_page(
    kind: PageKind,
    dataset: &Dataset,
    request: &PageRequest,
    settings: &AnalysisSettings,
) -> Result<Page> {
    let view = dataset.filter(&request.filter);
    let column = request.column;
    debug!("Building {} page over {} records", kind.slug(), view.len());

    let (cards, charts) = match kind {
        PageKind::Summary => summary_page(&view),
        PageKind::Temporal => temporal_page(&view, column, settings)?,
        PageKind::HourDay => hour_day_page(&view, column, settings),
        PageKind::Pair => pair_page(&view, column),
        PageKind::Errors => errors_page(&view, column, settings),
        PageKind::Advanced => advanced_page(&view, column, settings),
    };

    Ok(Page {
        page: kind,
        title: kind.title().to_string(),
        records: view.len(),
        filter: request.filter.clone(),
        column,
        cards,
        charts,
    })
}

fn summary_page(view: &[&PredictionRecord]) -> (Vec<Card>, Vec<Chart>) {
    let overall = overall_metrics(view);
    let pairs = pair_distribution(view);

    let cards = vec![
        Card::new("Total predictions", overall.total_predictions),
        Card::new("Hit rate (without delta)", format_rate(overall.hit_rate_without_delta)),
        Card::new("Hit rate (with delta)", format_rate(overall.hit_rate_with_delta)),
        Card::new("Pairs", pairs.len()),
    ];

    let chart = Chart::new("pair_distribution", "Predictions per pair", ChartKind::Pie).trace(Trace::new(
        "Predictions",
        pairs.iter().map(|p| p.label.clone()),
        pairs.iter().map(|p| p.count),
    ));

    (cards, vec![chart])
}

fn temporal_page(
    view: &[&PredictionRecord],
    column: HitColumn,
    settings: &AnalysisSettings,
) -> Result<(Vec<Card>, Vec<Chart>)> {
    let daily = calculate_metrics(view, &[GroupBy::Date]);
    let evolution = Chart::new("daily_hit_rate", "Daily hit rate", ChartKind::Line)
        .axes("Date", RATE_AXIS)
        .traces(HitColumn::all().into_iter().map(|col| {
            Trace::new(
                col.label(),
                daily.iter().map(|m| m.label.clone()),
                daily.iter().map(|m| decimal_value(m.hit_rate(col))),
            )
        }));

    let ordered = sorted_by_time(view);
    let times: Vec<String> = ordered
        .iter()
        .map(|r| r.timestamp.format(TIMESTAMP_FORMAT).to_string())
        .collect();
    let series: [(&str, fn(&PredictionRecord) -> Decimal); 3] = [
        ("Actual", |r: &PredictionRecord| r.actual_value),
        ("Predicted", |r: &PredictionRecord| r.predicted_value),
        ("Predicted with delta", |r: &PredictionRecord| r.predicted_value_with_delta),
    ];
    let prices = Chart::new("price_series", "Actual vs predicted values", ChartKind::Line)
        .axes("Time", "Value")
        .traces(series.iter().map(|(name, field)| {
            Trace::new(
                *name,
                times.clone(),
                ordered.iter().map(|r| decimal_value(field(r))),
            )
        }));

    let windows = hits_per_window(view, column, settings.window()?)?;
    let bucketed = Chart::new(
        "hits_per_window",
        format!("Hits per {} minute window ({})", settings.window_minutes, column.label()),
        ChartKind::Bar,
    )
    .axes("Window start", "Hits")
    .trace(Trace::new(
        column.label(),
        windows
            .iter()
            .map(|w| w.window_start.format(TIMESTAMP_FORMAT).to_string()),
        windows.iter().map(|w| w.hits),
    ));

    let mut cards = Vec::new();
    if let (Some(first), Some(last)) = (ordered.first(), ordered.last()) {
        cards.push(Card::new("From", first.timestamp.format(TIMESTAMP_FORMAT)));
        cards.push(Card::new("To", last.timestamp.format(TIMESTAMP_FORMAT)));
    }
    cards.push(Card::new("Days", daily.len()));

    Ok((cards, vec![evolution, prices, bucketed]))
}

fn hour_day_page(
    view: &[&PredictionRecord],
    column: HitColumn,
    settings: &AnalysisSettings,
) -> (Vec<Card>, Vec<Chart>) {
    let mut charts = vec![
        rate_by(view, GroupBy::Hour, "hit_rate_by_hour", "Hit rate by hour", "Hour"),
        rate_by(view, GroupBy::DayOfWeek, "hit_rate_by_day", "Hit rate by day of week", "Day"),
        rate_by(view, GroupBy::PeriodOfDay, "hit_rate_by_period", "Hit rate by period of day", "Period"),
    ];

    let heatmap = hit_rate_heatmap(view, column);
    charts.push(
        Chart::new(
            "hit_rate_heatmap",
            format!("Hit rate by day and hour ({})", column.label()),
            ChartKind::Heatmap,
        )
        .axes("Hour", "Day")
        .trace(Trace::heatmap(
            RATE_AXIS,
            heatmap.hours.iter().copied(),
            heatmap.days.iter().map(|d| d.as_str()),
            heatmap.values,
        )),
    );

    for (group, id, axis) in [
        (GroupBy::Hour, "sequences_by_hour", "Hour"),
        (GroupBy::DayOfWeek, "sequences_by_day", "Day"),
    ] {
        let title = format!(
            "Hit sequences of {}+ by {}",
            settings.min_sequence_length,
            axis.to_lowercase()
        );
        charts.push(
            Chart::new(id, title, ChartKind::Bar)
                .axes(axis, "Sequences")
                .grouped()
                .traces(HitColumn::all().into_iter().map(|col| {
                    let counts = count_hit_sequences_by(view, group, col, settings.min_sequence_length);
                    Trace::new(
                        col.label(),
                        counts.iter().map(|c| group_value(&c.key)),
                        counts.iter().map(|c| c.sequences),
                    )
                })),
        );
    }

    let policy = settings.interval_policy();
    let mut cards = Vec::new();
    let mut interval_traces = Vec::new();
    for col in HitColumn::all() {
        let intervals = hit_intervals(view, col, &policy);
        let summary = summarize_intervals(&intervals);
        if let Some(mean) = summary.mean_minutes {
            cards.push(Card::new(format!("Mean minutes between hits ({})", col.label()), format!("{:.1}", mean)));
        }
        interval_traces.push(Trace::new(
            col.label(),
            intervals
                .iter()
                .map(|i| i.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            intervals.iter().map(|i| i.minutes),
        ));
    }
    charts.push(
        Chart::new("hit_intervals", "Minutes between consecutive hits", ChartKind::Line)
            .axes("Hit time", "Minutes")
            .traces(interval_traces),
    );

    let mut weeks: BTreeMap<(i32, u32), (Vec<u32>, Vec<u64>)> = BTreeMap::new();
    for cell in hits_by_week_and_hour(view, column) {
        let entry = weeks.entry((cell.iso_year, cell.week)).or_default();
        entry.0.push(cell.hour);
        entry.1.push(cell.hits);
    }
    charts.push(
        Chart::new(
            "hits_by_week_hour",
            format!("Hits per hour by ISO week ({})", column.label()),
            ChartKind::Line,
        )
        .axes("Hour", "Hits")
        .traces(
            weeks
                .into_iter()
                .map(|((year, week), (hours, hits))| Trace::new(format!("{}-W{:02}", year, week), hours, hits)),
        ),
    );

    let per_day = hits_by_day(view, column);
    charts.push(
        Chart::new("hits_by_day", format!("Hits per day of week ({})", column.label()), ChartKind::Bar)
            .axes("Day", "Hits")
            .trace(Trace::new(
                column.label(),
                per_day.iter().map(|d| d.day.as_str()),
                per_day.iter().map(|d| d.count),
            )),
    );

    (cards, charts)
}

fn pair_page(view: &[&PredictionRecord], column: HitColumn) -> (Vec<Card>, Vec<Chart>) {
    let mut charts = vec![rate_by(view, GroupBy::Pair, "hit_rate_by_pair", "Hit rate by pair", "Pair")];

    let directions = direction_distribution(view);
    charts.push(
        Chart::new("direction_distribution", "Direction distribution", ChartKind::Bar)
            .axes("Direction", "Count")
            .grouped()
            .traces([DirectionKind::Actual, DirectionKind::Predicted].into_iter().map(|kind| {
                let rows: Vec<_> = directions.iter().filter(|d| d.kind == kind).collect();
                let name = match kind {
                    DirectionKind::Actual => "Actual",
                    DirectionKind::Predicted => "Predicted",
                };
                Trace::new(
                    name,
                    rows.iter().map(|d| d.direction.clone()),
                    rows.iter().map(|d| d.count),
                )
            })),
    );

    let metrics = calculate_metrics(view, &[GroupBy::Pair, GroupBy::PeriodOfDay]);
    let mut by_period: BTreeMap<PeriodOfDay, (Vec<Value>, Vec<Value>)> = BTreeMap::new();
    for m in &metrics {
        if let [pair, GroupValue::Period(period)] = m.key.as_slice() {
            let entry = by_period.entry(*period).or_default();
            entry.0.push(group_value(pair));
            entry.1.push(decimal_value(m.hit_rate(column)));
        }
    }
    charts.push(
        Chart::new(
            "hit_rate_by_pair_period",
            format!("Hit rate by pair and period ({})", column.label()),
            ChartKind::Bar,
        )
        .axes("Pair", RATE_AXIS)
        .grouped()
        .traces(
            by_period
                .into_iter()
                .map(|(period, (x, y))| Trace::new(period.as_str(), x, y)),
        ),
    );

    let best = calculate_metrics(view, &[GroupBy::Pair])
        .into_iter()
        .max_by(|a, b| a.hit_rate(column).cmp(&b.hit_rate(column)));
    let cards = best
        .map(|m| vec![Card::new(format!("Best pair ({})", column.label()), format!("{} ({})", m.label, format_rate(m.hit_rate(column))))])
        .unwrap_or_default();

    (cards, charts)
}

fn errors_page(
    view: &[&PredictionRecord],
    column: HitColumn,
    settings: &AnalysisSettings,
) -> (Vec<Card>, Vec<Chart>) {
    let misses = misses_by_hour_day(view, column);
    let total_misses: u64 = misses.iter().map(|m| m.count).sum();
    let (hours, days, z) = count_matrix(&misses);

    let heatmap = Chart::new(
        "misses_by_hour_day",
        format!("Misses by day and hour ({})", column.label()),
        ChartKind::Heatmap,
    )
    .axes("Hour", "Day")
    .trace(Trace::heatmap("Misses", hours, days.iter().map(|d| d.as_str()), z));

    let by_direction = misses_by_direction(view, column);
    let direction = Chart::new(
        "misses_by_direction",
        format!("Misses by predicted direction ({})", column.label()),
        ChartKind::Bar,
    )
    .axes("Predicted direction", "Misses")
    .trace(Trace::new(
        "Misses",
        by_direction.iter().map(|c| c.label.clone()),
        by_direction.iter().map(|c| c.count),
    ));

    let bins = hit_rate_by_quantile(view, settings.quantile_bins, |r| r.abs_error(column).to_f64());
    let quantiles = Chart::new(
        "hit_rate_by_error_quantile",
        format!("Hit rate by absolute error quantile ({})", column.label()),
        ChartKind::Bar,
    )
    .axes("Absolute error", RATE_AXIS)
    .trace(bin_trace(&bins, column));

    let mean_abs_error = if view.is_empty() {
        None
    } else {
        let total: Decimal = view.iter().map(|r| r.abs_error(column)).sum();
        Some(total / Decimal::from(view.len()))
    };

    let mut cards = vec![Card::new("Misses", total_misses)];
    if let Some(mae) = mean_abs_error {
        cards.push(Card::new("Mean absolute error", mae.round_dp(6)));
    }

    (cards, vec![heatmap, direction, quantiles])
}

fn advanced_page(
    view: &[&PredictionRecord],
    column: HitColumn,
    settings: &AnalysisSettings,
) -> (Vec<Card>, Vec<Chart>) {
    let matrix = correlation_matrix(view);
    let mut correlation = Chart::new("correlation", "Correlation between values", ChartKind::Heatmap);
    if matrix.values.iter().flatten().any(Option::is_some) {
        correlation = correlation.trace(Trace::heatmap(
            "Pearson",
            matrix.labels.clone(),
            matrix.labels.clone(),
            matrix.values,
        ));
    }

    let mut by_day: BTreeMap<DayOfWeek, Vec<_>> = BTreeMap::new();
    for cell in volatility_by_hour_day(view) {
        by_day.entry(cell.day).or_default().push(cell);
    }
    let volatility = Chart::new("volatility", "Volatility by hour and day", ChartKind::Scatter)
        .axes("Hour", "Std. dev. of actual value")
        .traces(by_day.into_iter().map(|(day, cells)| {
            Trace::new(
                day.as_str(),
                cells.iter().map(|c| c.hour),
                cells.iter().map(|c| c.volatility),
            )
            .with_size(cells.iter().map(|c| c.samples as f64).collect())
        }));

    let bins = hit_rate_by_quantile(view, settings.quantile_bins, |r| {
        r.movement_magnitude.and_then(|m| m.to_f64())
    });
    let movement = Chart::new("hit_rate_by_movement", "Hit rate by movement magnitude", ChartKind::Bar)
        .axes("Movement magnitude", RATE_AXIS)
        .grouped()
        .traces(HitColumn::all().into_iter().map(|col| bin_trace(&bins, col)));

    let runs = record_streaks(view, column);
    let histogram = streak_histogram(&runs);
    let streaks = Chart::new(
        "streak_histogram",
        format!("Streak lengths ({})", column.label()),
        ChartKind::Histogram,
    )
    .axes("Streak length", "Frequency")
    .grouped()
    .traces([Outcome::Hit, Outcome::Miss].into_iter().map(|outcome| {
        let rows: Vec<_> = histogram.iter().filter(|h| h.outcome == outcome).collect();
        Trace::new(
            outcome.as_str(),
            rows.iter().map(|h| h.length),
            rows.iter().map(|h| h.frequency),
        )
    }));

    let mut by_pair: BTreeMap<String, Vec<_>> = BTreeMap::new();
    for point in error_vs_movement(view, column) {
        by_pair.entry(point.pair.clone()).or_default().push(point);
    }
    let scatter = Chart::new(
        "error_vs_movement",
        format!("Absolute error vs movement ({})", column.label()),
        ChartKind::Scatter,
    )
    .axes("Movement magnitude", "Absolute error")
    .traces(by_pair.into_iter().map(|(pair, points)| {
        Trace::new(
            pair,
            points.iter().map(|p| p.movement),
            points.iter().map(|p| p.abs_error),
        )
        .with_text(
            points
                .iter()
                .map(|p| Outcome::from_hit(p.hit).as_str().to_string())
                .collect(),
        )
    }));

    let summary = summarize_streaks(&runs);
    let cards = vec![
        Card::new("Current streak", summary.current_streak),
        Card::new("Longest hit streak", summary.max_hit_streak),
        Card::new("Longest miss streak", summary.max_miss_streak),
        Card::new("Average hit streak", summary.avg_hit_streak.round_dp(2)),
    ];

    (cards, vec![correlation, volatility, movement, streaks, scatter])
}

/// Grouped bar of both hit rates over one key.
fn rate_by(view: &[&PredictionRecord], group: GroupBy, id: &str, title: &str, axis: &str) -> Chart {
    let metrics = calculate_metrics(view, &[group]);
    Chart::new(id, title, ChartKind::Bar)
        .axes(axis, RATE_AXIS)
        .grouped()
        .traces(HitColumn::all().into_iter().map(|col| {
            Trace::new(
                col.label(),
                metrics.iter().map(|m| m.key.first().map(group_value).unwrap_or(Value::Null)),
                metrics.iter().map(|m| decimal_value(m.hit_rate(col))),
            )
        }))
}

fn bin_trace(bins: &[BinMetrics], column: HitColumn) -> Trace {
    Trace::new(
        column.label(),
        bins.iter().map(|b| b.bin.label.clone()),
        bins.iter().map(|b| decimal_value(b.hit_rate(column))),
    )
    .with_text(bins.iter().map(|b| format!("n={}", b.count)).collect())
}

fn count_matrix(cells: &[HourDayCount]) -> (Vec<u32>, Vec<DayOfWeek>, Vec<Vec<Option<f64>>>) {
    let hours: Vec<u32> = cells.iter().map(|c| c.hour).collect::<BTreeSet<_>>().into_iter().collect();
    let days: Vec<DayOfWeek> = cells.iter().map(|c| c.day).collect::<BTreeSet<_>>().into_iter().collect();
    let lookup: BTreeMap<(DayOfWeek, u32), u64> = cells.iter().map(|c| ((c.day, c.hour), c.count)).collect();

    let z = days
        .iter()
        .map(|day| {
            hours
                .iter()
                .map(|hour| lookup.get(&(*day, *hour)).map(|count| *count as f64))
                .collect()
        })
        .collect();

    (hours, days, z)
}

fn group_value(value: &GroupValue) -> Value {
    match value {
        GroupValue::Hour(hour) => Value::from(*hour),
        other => Value::from(other.to_string()),
    }
}

fn format_rate(rate: Decimal) -> String {
    format!("{:.2}%", rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::{record, ts};
    use rust_decimal_macros::dec;

    fn priced(day: u32, hour: u32, pair: &str, actual: Decimal, hit: bool) -> PredictionRecord {
        PredictionRecord::new(
            ts(day, hour, 0),
            actual,
            dec!(1.1000),
            dec!(1.1002),
            if hit { "up" } else { "down" }.to_string(),
            "up".to_string(),
            pair.to_string(),
            hit,
            !hit,
        )
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            priced(1, 9, "EURUSD", dec!(1.1010), true),
            priced(1, 10, "EURUSD", dec!(1.1030), true),
            priced(1, 11, "GBPUSD", dec!(1.0990), false),
            priced(2, 9, "EURUSD", dec!(1.1050), true),
            priced(2, 15, "GBPUSD", dec!(1.0950), false),
            priced(2, 20, "EURUSD", dec!(1.1100), true),
            priced(3, 9, "EURUSD", dec!(1.1000), false),
            priced(3, 14, "GBPUSD", dec!(1.0900), true),
        ])
    }

    fn chart<'a>(page: &'a Page, id: &str) -> &'a Chart {
        page.charts.iter().find(|c| c.id == id).unwrap()
    }

    #[test]
    fn test_page_slugs() {
        for kind in PageKind::all() {
            assert_eq!(PageKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(PageKind::from_slug("HOUR-DAY"), Some(PageKind::HourDay));
        assert_eq!(PageKind::from_slug("unknown"), None);
    }

    #[test]
    fn test_summary_page() {
        let page = build_page(
            PageKind::Summary,
            &dataset(),
            &PageRequest::default(),
            &AnalysisSettings::default(),
        )
        .unwrap();

        assert_eq!(page.records, 8);
        assert_eq!(page.cards[0].value, "8");
        assert_eq!(page.cards[1].value, "62.50%");
        assert_eq!(page.cards[2].value, "37.50%");

        let pie = chart(&page, "pair_distribution");
        assert_eq!(pie.traces[0].x, vec![Value::from("EURUSD"), Value::from("GBPUSD")]);
        assert_eq!(pie.traces[0].y, vec![Value::from(5u64), Value::from(3u64)]);
    }

    #[test]
    fn test_every_page_builds() {
        let data = dataset();
        let settings = AnalysisSettings::default();
        for kind in PageKind::all() {
            for column in HitColumn::all() {
                let request = PageRequest {
                    filter: RecordFilter::default(),
                    column,
                };
                let page = build_page(kind, &data, &request, &settings).unwrap();
                assert!(!page.charts.is_empty());
                assert_eq!(page.title, kind.title());
            }
        }
    }

    #[test]
    fn test_filter_applies_to_page() {
        let request = PageRequest {
            filter: RecordFilter {
                pair: Some("GBPUSD".to_string()),
                ..RecordFilter::default()
            },
            column: HitColumn::WithoutDelta,
        };
        let page = build_page(PageKind::Pair, &dataset(), &request, &AnalysisSettings::default()).unwrap();

        assert_eq!(page.records, 3);
        let by_pair = chart(&page, "hit_rate_by_pair");
        assert_eq!(by_pair.traces[0].x, vec![Value::from("GBPUSD")]);
    }

    #[test]
    fn test_empty_view_yields_empty_charts() {
        let request = PageRequest {
            filter: RecordFilter {
                pair: Some("USDJPY".to_string()),
                ..RecordFilter::default()
            },
            column: HitColumn::WithDelta,
        };
        let settings = AnalysisSettings::default();
        for kind in PageKind::all() {
            let page = build_page(kind, &dataset(), &request, &settings).unwrap();
            assert_eq!(page.records, 0);
            assert!(page.charts.iter().all(Chart::is_empty), "{:?}", kind);
        }
    }

    #[test]
    fn test_hour_day_page() {
        let page = build_page(
            PageKind::HourDay,
            &dataset(),
            &PageRequest::default(),
            &AnalysisSettings::default(),
        )
        .unwrap();

        let by_hour = chart(&page, "hit_rate_by_hour");
        assert_eq!(by_hour.traces.len(), 2);
        assert_eq!(by_hour.traces[0].x[0], Value::from(9u32));

        // hits at 09:00 and 10:00 on Jan 1st form the only run of two
        let sequences = chart(&page, "sequences_by_day");
        assert_eq!(sequences.traces[0].x[0], Value::from("Monday"));
        assert_eq!(sequences.traces[0].y[0], Value::from(1usize));

        let heatmap = chart(&page, "hit_rate_heatmap");
        assert_eq!(heatmap.traces[0].y.len(), 3);
    }

    #[test]
    fn test_degenerate_quantiles_render_blank() {
        let data = Dataset::new(vec![
            record(ts(1, 9, 0), "EURUSD", true, false),
            record(ts(1, 10, 0), "EURUSD", false, false),
        ]);
        let page = build_page(
            PageKind::Errors,
            &data,
            &PageRequest::default(),
            &AnalysisSettings::default(),
        )
        .unwrap();

        assert!(chart(&page, "hit_rate_by_error_quantile").is_empty());
        assert!(!chart(&page, "misses_by_hour_day").is_empty());
    }

    #[test]
    fn test_temporal_window_chart() {
        let mut settings = AnalysisSettings::default();
        settings.window_minutes = 60 * 24;
        let page = build_page(PageKind::Temporal, &dataset(), &PageRequest::default(), &settings).unwrap();

        let windows = chart(&page, "hits_per_window");
        assert_eq!(
            windows.traces[0].y,
            vec![Value::from(2u64), Value::from(2u64), Value::from(1u64)]
        );
        assert_eq!(chart(&page, "price_series").traces.len(), 3);
    }
}
