//! t-SNE embedding points and evaluation helpers.
//!
//! The embedding document is an array of rows with `x`, `y`, a true and/or
//! predicted label, and optional evaluation metadata (`time_period`,
//! `first_submission_date`, `accuracy`/`confidence`, `filename`).
//!
//! Two views are decoded from it:
//!
//! - [`EmbeddedPoint`]: the classifier's reference set (`true_label`
//!   preferred, then `pred_label`, then `"other"`)
//! - [`SampleRecord`]: the periodic-evaluation view, used for time-range
//!   filtering, class counts, and the least-certain sample list

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce::to_number;
use crate::label_map::LabelMap;

/// Label for points that carry neither a true nor a predicted label.
pub const OTHER_LABEL: &str = "other";

/// Default length of the least-certain sample list.
pub const DEFAULT_UNCERTAIN_LIMIT: usize = 50;

/// A point of a precomputed 2D embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

impl EmbeddedPoint {
    pub fn new(x: f64, y: f64, label: impl Into<String>) -> Self {
        Self {
            x,
            y,
            label: label.into(),
        }
    }
}

/// Decode the classifier reference set from an embedding document.
///
/// Rows that are not objects, or whose coordinates are not finite numbers,
/// are skipped.
pub fn parse_points(document: &Value) -> Vec<EmbeddedPoint> {
    rows(document)
        .filter_map(|row| {
            let (x, y) = coordinates(row)?;
            let label = label_field(row, "true_label")
                .or_else(|| label_field(row, "pred_label"))
                .unwrap_or_else(|| OTHER_LABEL.to_string());
            Some(EmbeddedPoint { x, y, label })
        })
        .collect()
}

/// Axis-aligned bounding box of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// `None` for an empty cloud.
    pub fn of(points: &[EmbeddedPoint]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        Some(points.iter().fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            max_x: b.max_x.max(p.x),
            min_y: b.min_y.min(p.y),
            max_y: b.max_y.max(p.y),
        }))
    }
}

/// One row of the periodic-evaluation view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Embedding position; evaluation rows need not carry one
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub filename: Option<String>,
    pub true_label: Option<String>,
    pub pred_label: Option<String>,
    /// Evaluation period; 0 when the row's value is not numeric
    pub time_period: f64,
    pub first_submission_date: Option<String>,
    /// `accuracy`, else `confidence`, else 1.0
    pub accuracy: f64,
}

impl SampleRecord {
    /// Label used for grouping: the true label, or `"other"`.
    pub fn class_label(&self) -> &str {
        match self.true_label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => OTHER_LABEL,
        }
    }
}

/// Decode evaluation rows.
///
/// Every object row is kept, with or without coordinates. When the first row
/// has no `time_period`, the document is treated as unperiodized and rows
/// are numbered `1..=N` in document order.
pub fn parse_samples(document: &Value) -> Vec<SampleRecord> {
    let periodized = rows(document)
        .next()
        .is_some_and(|row| row.contains_key("time_period"));

    rows(document)
        .enumerate()
        .map(|(i, row)| {
            let time_period = if periodized {
                row.get("time_period")
                    .and_then(to_number)
                    .filter(|t| t.is_finite())
                    .unwrap_or(0.0)
            } else {
                (i + 1) as f64
            };
            let accuracy = row
                .get("accuracy")
                .and_then(Value::as_f64)
                .or_else(|| row.get("confidence").and_then(Value::as_f64))
                .unwrap_or(1.0);

            SampleRecord {
                x: coordinate(row, "x"),
                y: coordinate(row, "y"),
                filename: label_field(row, "filename"),
                true_label: label_field(row, "true_label"),
                pred_label: label_field(row, "pred_label"),
                time_period,
                first_submission_date: label_field(row, "first_submission_date"),
                accuracy,
            }
        })
        .collect()
}

/// Inclusive span of evaluation periods present in a sample set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodRange {
    pub min: f64,
    pub max: f64,
}

impl PeriodRange {
    /// Periods of 0 count as 1; the lower bound never drops below 1.
    pub fn of(samples: &[SampleRecord]) -> Self {
        let periods = samples
            .iter()
            .map(|s| if s.time_period == 0.0 { 1.0 } else { s.time_period });

        let (min, max) = periods.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(t), hi.max(t))
        });

        if samples.is_empty() {
            Self { min: 1.0, max: 1.0 }
        } else {
            Self {
                min: min.max(1.0),
                max,
            }
        }
    }

    /// Clamp a user selection into this range; inverted bounds are swapped.
    pub fn clamp_selection(&self, lo: f64, hi: f64) -> (f64, f64) {
        (self.min.max(lo.min(hi)), self.max.min(lo.max(hi)))
    }
}

/// Samples whose period falls within the clamped selection.
pub fn filter_by_period<'a>(
    samples: &'a [SampleRecord],
    range: PeriodRange,
    lo: f64,
    hi: f64,
) -> Vec<&'a SampleRecord> {
    let (lo, hi) = range.clamp_selection(lo, hi);
    samples
        .iter()
        .filter(|s| s.time_period >= lo && s.time_period <= hi)
        .collect()
}

/// Per-class sample counts, classes in first-seen order.
pub fn class_counts<'a, I>(samples: I) -> LabelMap<usize>
where
    I: IntoIterator<Item = &'a SampleRecord>,
{
    let mut counts = LabelMap::new();
    for sample in samples {
        *counts.entry_or_insert_with(sample.class_label(), || 0) += 1;
    }
    counts
}

/// The `limit` samples the model was least certain about, lowest accuracy
/// first. Equal accuracies keep their input order.
pub fn uncertain_samples<'a, I>(samples: I, limit: usize) -> Vec<&'a SampleRecord>
where
    I: IntoIterator<Item = &'a SampleRecord>,
{
    let mut sorted: Vec<&SampleRecord> = samples.into_iter().collect();
    sorted.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
    sorted.truncate(limit);
    sorted
}

fn rows(document: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    document
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// A finite coordinate. Absent and `null` fields are unplaced, not 0.
fn coordinate(row: &Map<String, Value>, key: &str) -> Option<f64> {
    row.get(key)
        .filter(|v| !v.is_null())
        .and_then(to_number)
        .filter(|v| v.is_finite())
}

fn coordinates(row: &Map<String, Value>) -> Option<(f64, f64)> {
    Some((coordinate(row, "x")?, coordinate(row, "y")?))
}

/// String field, with numbers rendered as text. Null and absent are `None`.
fn label_field(row: &Map<String, Value>, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn point_labels_prefer_true_label() {
        let doc = json!([
            {"x": 0, "y": 0, "true_label": "TROJAN.GENERIC", "pred_label": "GOODWARE"},
            {"x": 1, "y": 1, "pred_label": "GOODWARE"},
            {"x": 2, "y": 2, "true_label": null, "pred_label": "APT30"},
            {"x": 3, "y": 3}
        ]);
        let labels: Vec<String> = parse_points(&doc).into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["TROJAN.GENERIC", "GOODWARE", "APT30", "other"]);
    }

    #[test]
    fn points_without_coordinates_are_skipped() {
        let doc = json!([
            {"x": "1.5", "y": 2, "true_label": "A"},
            {"x": null, "y": 2, "true_label": "B"},
            {"y": 2, "true_label": "C"},
            "row"
        ]);
        let points = parse_points(&doc);
        assert_eq!(points, vec![EmbeddedPoint::new(1.5, 2.0, "A")]);
    }

    #[test]
    fn unplaced_point_never_votes() {
        let doc = json!([
            {"x": 10, "y": 10, "true_label": "A"},
            {"x": null, "y": null, "true_label": "GHOST"}
        ]);
        let points = parse_points(&doc);
        assert_eq!(points.len(), 1);

        let prediction = crate::knn::classify_against_points(
            crate::knn::QueryPoint::new(0.0, 0.0),
            &points,
            Some(1),
        );
        assert_eq!(prediction.label, "A");
    }

    #[test]
    fn non_array_document_has_no_points() {
        assert!(parse_points(&json!({"points": []})).is_empty());
    }

    #[test]
    fn bounds_of_cloud() {
        let points = vec![
            EmbeddedPoint::new(-1.0, 4.0, "A"),
            EmbeddedPoint::new(3.0, -2.0, "B"),
        ];
        assert_eq!(
            Bounds::of(&points),
            Some(Bounds {
                min_x: -1.0,
                max_x: 3.0,
                min_y: -2.0,
                max_y: 4.0
            })
        );
        assert_eq!(Bounds::of(&[]), None);
    }

    #[test]
    fn unperiodized_rows_are_numbered() {
        let doc = json!([
            {"x": 0, "y": 0, "true_label": "A"},
            {"x": 1, "y": 1, "true_label": "B", "time_period": 9}
        ]);
        let periods: Vec<f64> = parse_samples(&doc).iter().map(|s| s.time_period).collect();
        assert_eq!(periods, vec![1.0, 2.0]);
    }

    #[test]
    fn evaluation_rows_need_no_coordinates() {
        let doc = json!([
            {"filename": "a.exe", "true_label": "APT30", "time_period": 1, "accuracy": 0.3},
            {"filename": "b.exe", "true_label": "GOODWARE", "time_period": 2, "accuracy": 0.8},
            {"x": 1, "y": null, "true_label": "APT30", "time_period": 2}
        ]);
        let samples = parse_samples(&doc);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].filename.as_deref(), Some("a.exe"));
        assert_eq!((samples[0].x, samples[0].y), (None, None));
        assert_eq!((samples[2].x, samples[2].y), (Some(1.0), None));
    }

    #[test]
    fn unperiodized_numbering_has_no_gaps() {
        let doc = json!([
            {"true_label": "A"},
            {"x": null, "true_label": "B"},
            "not a row",
            {"x": 3, "y": 3, "true_label": "C"}
        ]);
        let periods: Vec<f64> = parse_samples(&doc).iter().map(|s| s.time_period).collect();
        assert_eq!(periods, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn accuracy_falls_back_to_confidence() {
        let doc = json!([
            {"x": 0, "y": 0, "time_period": 1, "accuracy": 0.4},
            {"x": 0, "y": 0, "time_period": 1, "confidence": 0.6},
            {"x": 0, "y": 0, "time_period": 1, "accuracy": "0.1"}
        ]);
        let acc: Vec<f64> = parse_samples(&doc).iter().map(|s| s.accuracy).collect();
        assert_eq!(acc, vec![0.4, 0.6, 1.0]);
    }

    fn sample(period: f64, label: Option<&str>, accuracy: f64) -> SampleRecord {
        SampleRecord {
            x: None,
            y: None,
            filename: None,
            true_label: label.map(str::to_string),
            pred_label: None,
            time_period: period,
            first_submission_date: None,
            accuracy,
        }
    }

    #[test]
    fn period_range_and_filter() {
        let samples = vec![
            sample(0.0, Some("A"), 1.0),
            sample(2.0, Some("B"), 1.0),
            sample(5.0, Some("A"), 1.0),
        ];
        let range = PeriodRange::of(&samples);
        assert_eq!(range, PeriodRange { min: 1.0, max: 5.0 });

        let picked: Vec<f64> = filter_by_period(&samples, range, 4.0, 2.0)
            .iter()
            .map(|s| s.time_period)
            .collect();
        assert_eq!(picked, vec![2.0]);

        // Out-of-range selection is clamped, and period 0 never matches.
        let all = filter_by_period(&samples, range, -10.0, 100.0);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn counts_group_missing_labels_as_other() {
        let samples = vec![
            sample(1.0, Some("B"), 1.0),
            sample(1.0, None, 1.0),
            sample(1.0, Some("B"), 1.0),
            sample(1.0, Some(""), 1.0),
        ];
        let counts = class_counts(&samples);
        let entries: Vec<(&str, usize)> = counts.iter().map(|(l, c)| (l, *c)).collect();
        assert_eq!(entries, vec![("B", 2), ("other", 2)]);
    }

    #[test]
    fn least_certain_first() {
        let samples = vec![
            sample(1.0, Some("A"), 0.9),
            sample(1.0, Some("B"), 0.2),
            sample(1.0, Some("C"), 0.5),
            sample(1.0, Some("D"), 0.2),
        ];
        let labels: Vec<&str> = uncertain_samples(&samples, 3)
            .iter()
            .map(|s| s.class_label())
            .collect();
        assert_eq!(labels, vec!["B", "D", "C"]);
    }
}
