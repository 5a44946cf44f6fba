//! Label → color assignment shared by every chart.
//!
//! A [`ColorAssigner`] is built once from the label catalog and handed to each
//! renderer, so the same label has the same color in the scatter, the SOM
//! pies, and the class-count bars.

use serde::Serialize;

use crate::label_map::LabelMap;

/// Discrete palette, assigned in catalog order.
pub const BASE_PALETTE: [&str; 24] = [
    "#1f77b4", "#f4b37aff", "#63c063ff", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#393b79", "#637939", "#8c6d31", "#843c39", "#7b4173", "#3182bd",
    "#406d4dff", "#756bb1", "#636363", "#b9450bff", "#9c9ede", "#e7ba52", "#b5cf6b", "#cedb9c",
];

/// Color for labels the assigner has never seen.
pub const FALLBACK_COLOR: &str = "#7f7f7f";

/// Pinned colors for the periodic-evaluation charts.
pub const EVALUATION_FIXED_COLORS: [(&str, &str); 5] = [
    ("TROJAN.GENERIC", "#1f77b4"),
    ("ADWARE.SCREENSAVER", "#ff7f0e"),
    ("GOODWARE", "#2ca02c"),
    ("APT30", "#d62728"),
    ("other", "#9467bd"),
];

/// Deterministic label → color mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColorAssigner {
    colors: LabelMap<String>,
}

impl ColorAssigner {
    /// `BASE_PALETTE[i % 24]` for the i-th distinct label.
    pub fn round_robin<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut colors = LabelMap::new();
        for label in labels {
            let label = label.as_ref();
            if !colors.contains(label) {
                let color = BASE_PALETTE[colors.len() % BASE_PALETTE.len()];
                colors.insert(label, color.to_string());
            }
        }
        Self { colors }
    }

    /// Pinned colors first, then the base palette without wrapping, then
    /// evenly spaced HSL hues for whatever is left.
    pub fn with_fixed<S: AsRef<str>>(labels: &[S], fixed: &LabelMap<String>) -> Self {
        let mut distinct: Vec<&str> = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if !label.is_empty() && !distinct.contains(&label) {
                distinct.push(label);
            }
        }

        let mut assigned: Vec<Option<String>> = distinct
            .iter()
            .map(|label| fixed.get(label).cloned())
            .collect();

        let mut palette = BASE_PALETTE.iter();
        for slot in assigned.iter_mut().filter(|slot| slot.is_none()) {
            match palette.next() {
                Some(color) => *slot = Some(color.to_string()),
                None => break,
            }
        }

        let remaining = assigned.iter().filter(|slot| slot.is_none()).count();
        let mut hues = (0..remaining).map(|i| hsl_color(i, remaining));
        let colors = distinct
            .into_iter()
            .zip(assigned)
            .map(|(label, slot)| {
                let color = slot
                    .or_else(|| hues.next())
                    .unwrap_or_else(|| FALLBACK_COLOR.to_string());
                (label.to_string(), color)
            })
            .collect();

        Self { colors }
    }

    /// [`with_fixed`](Self::with_fixed) over [`EVALUATION_FIXED_COLORS`].
    pub fn evaluation<S: AsRef<str>>(labels: &[S]) -> Self {
        let fixed: LabelMap<String> = EVALUATION_FIXED_COLORS
            .iter()
            .map(|(label, color)| (label.to_string(), color.to_string()))
            .collect();
        Self::with_fixed(labels, &fixed)
    }

    /// Assigned color, or [`FALLBACK_COLOR`].
    pub fn color_for(&self, label: &str) -> &str {
        self.colors
            .get(label)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.colors.iter().map(|(l, c)| (l, c.as_str()))
    }
}

fn hsl_color(index: usize, count: usize) -> String {
    let hue = ((index * 360) as f64 / count.max(1) as f64).round() as u32;
    format!("hsl({hue}, 70%, 50%)")
}

/// Output of the `label_colors_json` entry point.
#[derive(Debug, Serialize)]
pub struct LabelColorsOutput<'a> {
    pub colors: &'a ColorAssigner,
    pub total: usize,
}

/// JSON entry point: label catalog in, `{"colors":{label:color},"total":N}` out.
pub fn label_colors_json(input: &str) -> String {
    let document: serde_json::Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid label catalog: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };

    let labels = crate::labels::parse_label_catalog(&document);
    let colors = ColorAssigner::round_robin(&labels);

    match serde_json::to_string(&LabelColorsOutput {
        colors: &colors,
        total: colors.len(),
    }) {
        Ok(json) => json,
        Err(e) => format!(r#"{{"error":"serialization failed: {}"}}"#, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_wraps_palette() {
        let labels: Vec<String> = (0..26).map(|i| format!("L{i}")).collect();
        let colors = ColorAssigner::round_robin(&labels);

        assert_eq!(colors.color_for("L0"), BASE_PALETTE[0]);
        assert_eq!(colors.color_for("L23"), BASE_PALETTE[23]);
        assert_eq!(colors.color_for("L24"), BASE_PALETTE[0]);
        assert_eq!(colors.color_for("L25"), BASE_PALETTE[1]);
    }

    #[test]
    fn deterministic_across_builds() {
        let labels = ["APT30", "GOODWARE", "APT30", "ADWARE.GATOR"];
        let a = ColorAssigner::round_robin(&labels);
        let b = ColorAssigner::round_robin(&labels);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.color_for("ADWARE.GATOR"), BASE_PALETTE[2]);
    }

    #[test]
    fn unknown_label_gets_fallback() {
        let colors = ColorAssigner::round_robin(&["A"]);
        assert_eq!(colors.color_for("B"), FALLBACK_COLOR);
    }

    #[test]
    fn fixed_colors_then_palette_then_hsl() {
        let mut fixed = LabelMap::new();
        fixed.insert("GOODWARE", "#2ca02c".to_string());

        let mut labels = vec!["GOODWARE".to_string()];
        labels.extend((0..26).map(|i| format!("L{i}")));
        let colors = ColorAssigner::with_fixed(&labels, &fixed);

        assert_eq!(colors.color_for("GOODWARE"), "#2ca02c");
        assert_eq!(colors.color_for("L0"), BASE_PALETTE[0]);
        assert_eq!(colors.color_for("L23"), BASE_PALETTE[23]);
        assert_eq!(colors.color_for("L24"), "hsl(0, 70%, 50%)");
        assert_eq!(colors.color_for("L25"), "hsl(180, 70%, 50%)");
    }

    #[test]
    fn evaluation_colors_pin_known_families() {
        let colors = ColorAssigner::evaluation(&["ADWARE.GATOR", "APT30", "other", "GOODWARE"]);

        assert_eq!(colors.color_for("APT30"), "#d62728");
        assert_eq!(colors.color_for("GOODWARE"), "#2ca02c");
        assert_eq!(colors.color_for("other"), "#9467bd");
        assert_eq!(colors.color_for("ADWARE.GATOR"), BASE_PALETTE[0]);
        assert_eq!(colors.len(), 4);
    }

    #[test]
    fn label_colors_json_output() {
        let out = label_colors_json(r#"{"labels":["A","B"]}"#);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["total"], 2);
        assert_eq!(parsed["colors"]["B"], BASE_PALETTE[1]);
    }
}
