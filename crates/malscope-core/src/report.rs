//! Report assembly.
//!
//! Ties the pieces together the way the report page consumes them: decode
//! the label catalog, embedding points and every SOM document once, then
//! roll a synthetic query per chart and classify it. Loaded references can
//! be re-rolled any number of times without re-decoding.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::embedding::{
    class_counts, filter_by_period, parse_points, parse_samples, uncertain_samples,
    EmbeddedPoint, PeriodRange, SampleRecord, DEFAULT_UNCERTAIN_LIMIT,
};
use crate::knn::{ClassifierConfig, NeighborClassifier, Prediction, QueryPoint};
use crate::label_map::LabelMap;
use crate::labels::{merge_labels, parse_label_catalog};
use crate::palette::ColorAssigner;
use crate::query::{grid_query, scatter_query};
use crate::som::{
    collect_labels, extract_title, GridCell, GridExtent, SchemaNormalizer, TITLE_SEARCH_DEPTH,
};

/// Probability at or above which a sample is flagged as APT30.
pub const APT30_THRESHOLD: f64 = 0.5;

/// Legend size cap per SOM chart.
pub const SOM_LEGEND_LABELS: usize = 30;

/// A family classification score shown on the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyScore {
    pub label: String,
    pub score: f64,
}

/// APT30 verdict for the analyzed file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Apt30Verdict {
    pub probability: f64,
    #[serde(rename = "is_APT30")]
    pub is_apt30: bool,
}

/// Headline summary exported with the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub filename: String,
    /// Highest-scoring family; `None` without any scores
    pub top1_family: Option<String>,
    pub apt30: Apt30Verdict,
}

/// Build the headline summary. On equal scores the earlier family wins.
pub fn summarize(
    filename: &str,
    families: &[FamilyScore],
    apt30_probability: f64,
) -> ReportSummary {
    let top1_family = families
        .iter()
        .reduce(|best, f| if best.score >= f.score { best } else { f })
        .map(|f| f.label.clone());

    ReportSummary {
        filename: filename.to_string(),
        top1_family,
        apt30: Apt30Verdict {
            probability: apt30_probability,
            is_apt30: apt30_probability >= APT30_THRESHOLD,
        },
    }
}

/// Raw documents and report metadata, as fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportInputs {
    #[serde(default)]
    pub filename: String,
    /// Label catalog document
    #[serde(default)]
    pub labels: Value,
    /// Embedding points document
    #[serde(default)]
    pub points: Value,
    /// One raw document per SOM grid
    #[serde(default)]
    pub soms: Vec<Value>,
    #[serde(default)]
    pub families: Vec<FamilyScore>,
    #[serde(default)]
    pub apt30_probability: f64,
    /// Periodic evaluation rows; `null` skips the evaluation section
    #[serde(default)]
    pub samples: Value,
    /// Selected `(from, to)` evaluation periods; all periods when absent
    #[serde(default)]
    pub period: Option<(f64, f64)>,
}

/// Periodic-evaluation view over the selected periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Periods present in the sample set
    pub range: PeriodRange,
    /// Selection after clamping into `range`
    pub selected: (f64, f64),
    pub class_counts: LabelMap<usize>,
    /// Least certain samples, lowest accuracy first
    pub uncertain: Vec<SampleRecord>,
    /// Catalog and counted labels, known families pinned
    pub colors: ColorAssigner,
}

/// Build the evaluation view. `None` when the document holds no rows.
pub fn evaluate(
    document: &Value,
    catalog: &[String],
    period: Option<(f64, f64)>,
) -> Option<Evaluation> {
    let samples = parse_samples(document);
    if samples.is_empty() {
        return None;
    }

    let range = PeriodRange::of(&samples);
    let (lo, hi) = period.unwrap_or((range.min, range.max));
    let selected = filter_by_period(&samples, range, lo, hi);
    let counts = class_counts(selected.iter().copied());
    let colors = ColorAssigner::evaluation(&merge_labels(
        catalog,
        counts.iter().map(|(label, _)| label),
    ));

    Some(Evaluation {
        range,
        selected: range.clamp_selection(lo, hi),
        class_counts: counts,
        uncertain: uncertain_samples(selected.iter().copied(), DEFAULT_UNCERTAIN_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
        colors,
    })
}

/// A normalized SOM grid ready for classification.
#[derive(Debug, Clone)]
pub struct LoadedSom {
    pub title: String,
    pub cells: Vec<GridCell>,
}

/// Reference sets decoded once from [`ReportInputs`].
#[derive(Debug, Clone)]
pub struct LoadedReferences {
    pub colors: ColorAssigner,
    pub points: Vec<EmbeddedPoint>,
    pub soms: Vec<LoadedSom>,
}

impl LoadedReferences {
    pub fn load(inputs: &ReportInputs, normalizer: &SchemaNormalizer) -> Self {
        let catalog = parse_label_catalog(&inputs.labels);
        let all_labels = merge_labels(&catalog, inputs.families.iter().map(|f| f.label.as_str()));
        let colors = ColorAssigner::round_robin(&all_labels);

        let points = parse_points(&inputs.points);

        let soms: Vec<LoadedSom> = inputs
            .soms
            .iter()
            .enumerate()
            .map(|(i, doc)| LoadedSom {
                title: extract_title(doc, TITLE_SEARCH_DEPTH)
                    .unwrap_or_else(|| format!("SOM #{}", i + 1)),
                cells: normalizer.normalize(doc),
            })
            .collect();

        debug!(
            labels = all_labels.len(),
            points = points.len(),
            soms = soms.len(),
            "loaded report references"
        );

        Self {
            colors,
            points,
            soms,
        }
    }

    /// Roll a fresh query point per chart and classify each.
    pub fn roll<R: Rng + ?Sized>(
        &self,
        classifier: &NeighborClassifier,
        rng: &mut R,
    ) -> (Vec<SomOverlay>, Option<Overlay>) {
        let soms = self
            .soms
            .iter()
            .map(|som| {
                let query = grid_query(&som.cells, rng);
                SomOverlay {
                    title: som.title.clone(),
                    cells: som.cells.len(),
                    extent: GridExtent::of(&som.cells),
                    legend: collect_labels(&som.cells, SOM_LEGEND_LABELS),
                    overlay: Overlay {
                        query,
                        prediction: classifier.classify_against_grid(query, &som.cells, None),
                    },
                }
            })
            .collect();

        let scatter = scatter_query(&self.points, rng).map(|query| Overlay {
            query,
            prediction: classifier.classify_against_points(query, &self.points, None),
        });

        (soms, scatter)
    }
}

/// A test point drawn on a chart with its predicted label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub query: QueryPoint,
    pub prediction: Prediction,
}

/// Per-SOM overlay with the chart metadata the renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SomOverlay {
    pub title: String,
    pub cells: usize,
    pub extent: GridExtent,
    pub legend: Vec<String>,
    pub overlay: Overlay,
}

/// Everything the report page renders from the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub colors: ColorAssigner,
    pub soms: Vec<SomOverlay>,
    /// `None` when the embedding document had no usable points
    pub scatter: Option<Overlay>,
    /// `None` without evaluation rows
    pub evaluation: Option<Evaluation>,
    pub summary: ReportSummary,
}

/// Decode inputs, roll one query per chart, classify, summarize.
pub fn build_report<R: Rng + ?Sized>(
    inputs: &ReportInputs,
    config: ClassifierConfig,
    rng: &mut R,
) -> Report {
    let references = LoadedReferences::load(inputs, &SchemaNormalizer::default());
    let classifier = NeighborClassifier::new(config);
    let (soms, scatter) = references.roll(&classifier, rng);

    Report {
        colors: references.colors,
        soms,
        scatter,
        evaluation: evaluate(
            &inputs.samples,
            &parse_label_catalog(&inputs.labels),
            inputs.period,
        ),
        summary: summarize(&inputs.filename, &inputs.families, inputs.apt30_probability),
    }
}

/// Input for the build_report_json entry point
#[derive(Debug, Deserialize)]
pub struct BuildReportInput {
    #[serde(flatten)]
    pub inputs: ReportInputs,
    #[serde(default)]
    pub config: ClassifierConfig,
    /// Seed for query placement
    pub seed: u64,
}

/// JSON entry point: build a report from raw documents with a seeded RNG.
pub fn build_report_json(input: &str) -> String {
    let parsed: BuildReportInput = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid report input: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };

    let mut rng = StdRng::seed_from_u64(parsed.seed);
    let report = build_report(&parsed.inputs, parsed.config, &mut rng);

    match serde_json::to_string(&report) {
        Ok(json) => json,
        Err(e) => format!(r#"{{"error":"serialization failed: {}"}}"#, e),
    }
}
