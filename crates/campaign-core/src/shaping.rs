//! Projection of metric rows into card and chart shapes.

use serde::Serialize;
use serde_json::Value;

use crate::metrics::{MetricKind, MetricRow};

/// x-axis label used when a row has no date or name.
pub const MISSING_LABEL: &str = "N/A";

/// A `single_value` row rendered as a card. The value is kept literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarCard {
    pub metric_name: Option<String>,
    pub metric_value: Value,
}

/// One point of a line or bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapedMetrics {
    pub scalars: Vec<ScalarCard>,
    pub series: Vec<ChartPoint>,
    pub categories: Vec<ChartPoint>,
}

/// Partition `rows` by normalized `metric_type` and project each group.
///
/// Rows with a blank or unrecognized type land in no group. Source order is
/// preserved inside every group; time series are not sorted by date.
pub fn shape(rows: &[MetricRow]) -> ShapedMetrics {
    let mut shaped = ShapedMetrics::default();
    for row in rows {
        match row.kind() {
            Some(MetricKind::SingleValue) => shaped.scalars.push(ScalarCard {
                metric_name: row.metric_name.clone(),
                metric_value: row.metric_value.clone().unwrap_or(Value::Null),
            }),
            Some(MetricKind::TimeSeries) => shaped.series.push(ChartPoint {
                name: label_or_missing(row.date_event.as_deref()),
                value: coerce_metric_value(row.metric_value.as_ref()),
            }),
            Some(MetricKind::Category) => shaped.categories.push(ChartPoint {
                name: label_or_missing(row.metric_name.as_deref()),
                value: coerce_metric_value(row.metric_value.as_ref()),
            }),
            None => {}
        }
    }
    shaped
}

fn label_or_missing(raw: Option<&str>) -> String {
    match raw {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => MISSING_LABEL.to_string(),
    }
}

/// Coerce a loose `metric_value` to a chartable number.
///
/// Anything that does not yield a finite number becomes `0.0`.
pub fn coerce_metric_value(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(metric_type: &str, name: Option<&str>, value: Value, date: Option<&str>) -> MetricRow {
        MetricRow {
            client_code: "ECOM1".to_string(),
            metric_name: name.map(str::to_string),
            metric_value: Some(value),
            metric_type: Some(metric_type.to_string()),
            date_event: date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_yields_three_empty_groups() {
        let shaped = shape(&[]);
        assert!(shaped.scalars.is_empty());
        assert!(shaped.series.is_empty());
        assert!(shaped.categories.is_empty());
    }

    #[test]
    fn coercion_defaults_to_zero() {
        assert_eq!(coerce_metric_value(Some(&json!("12.5"))), 12.5);
        assert_eq!(coerce_metric_value(Some(&json!(" 7 "))), 7.0);
        assert_eq!(coerce_metric_value(Some(&json!(3))), 3.0);
        assert_eq!(coerce_metric_value(Some(&json!("abc"))), 0.0);
        assert_eq!(coerce_metric_value(Some(&json!(""))), 0.0);
        assert_eq!(coerce_metric_value(Some(&Value::Null)), 0.0);
        assert_eq!(coerce_metric_value(None), 0.0);
        assert_eq!(coerce_metric_value(Some(&json!("inf"))), 0.0);
        assert_eq!(coerce_metric_value(Some(&json!(true))), 1.0);
        assert_eq!(coerce_metric_value(Some(&json!({"v": 1}))), 0.0);
    }

    #[test]
    fn series_keeps_source_order() {
        let rows = vec![
            row("time_series", Some("Visits"), json!("5"), Some("2024-02-01")),
            row("time_series", Some("Visits"), json!("3"), Some("2024-01-01")),
        ];
        let shaped = shape(&rows);
        assert_eq!(
            shaped.series,
            vec![
                ChartPoint { name: "2024-02-01".to_string(), value: 5.0 },
                ChartPoint { name: "2024-01-01".to_string(), value: 3.0 },
            ]
        );
    }

    #[test]
    fn missing_labels_become_placeholder() {
        let rows = vec![
            row("time_series", Some("Visits"), json!("oops"), None),
            row("category", None, json!(9), None),
        ];
        let shaped = shape(&rows);
        assert_eq!(shaped.series[0].name, MISSING_LABEL);
        assert_eq!(shaped.series[0].value, 0.0);
        assert_eq!(shaped.categories[0].name, MISSING_LABEL);
        assert_eq!(shaped.categories[0].value, 9.0);
    }

    #[test]
    fn scalars_keep_literal_value() {
        let rows = vec![row("single_value", Some("Active Users"), json!("12345"), None)];
        let shaped = shape(&rows);
        assert_eq!(
            shaped.scalars,
            vec![ScalarCard {
                metric_name: Some("Active Users".to_string()),
                metric_value: json!("12345"),
            }]
        );
        assert!(shaped.series.is_empty());
        assert!(shaped.categories.is_empty());
    }

    #[test]
    fn unknown_and_blank_types_are_dropped_from_every_group() {
        let mut blank = row("", Some("x"), json!(1), None);
        blank.metric_type = None;
        let rows = vec![
            row("  Category ", Some("Email"), json!("4"), None),
            row("funnel", Some("Steps"), json!("2"), None),
            row("   ", Some("Blank"), json!("2"), None),
            blank,
            row("SINGLE_VALUE", Some("CTR"), json!(0.4), None),
        ];
        let shaped = shape(&rows);
        let total = shaped.scalars.len() + shaped.series.len() + shaped.categories.len();
        assert_eq!(total, 2);
        assert_eq!(shaped.categories[0].name, "Email");
        assert_eq!(shaped.scalars[0].metric_name.as_deref(), Some("CTR"));
    }

    #[test]
    fn shaping_is_deterministic() {
        let rows = vec![
            row("category", Some("Search"), json!("10"), None),
            row("time_series", None, json!(2), Some("2024-03-01")),
        ];
        assert_eq!(shape(&rows), shape(&rows));
    }

    #[test]
    fn serializes_to_chart_ready_json() {
        let rows = vec![row("category", Some("Social"), json!("2.5"), None)];
        let value = serde_json::to_value(shape(&rows)).expect("serialize");
        assert_eq!(
            value,
            json!({
                "scalars": [],
                "series": [],
                "categories": [{ "name": "Social", "value": 2.5 }]
            })
        );
    }
}
