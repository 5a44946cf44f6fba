//! Browser WASM bindings using wasm-bindgen
//!
//! Provides browser-compatible functions for:
//! - SOM normalization, classification and label colors (same as the raw
//!   ABI target)
//! - A loaded reference session, so the report page can decode its
//!   documents once and re-roll query points on demand
//!
//! Unlike the raw ABI target which uses (ptr, len) memory passing, these
//! functions use wasm-bindgen for seamless JavaScript interop.

use std::cell::RefCell;

use malscope_core::report::{LoadedReferences, Overlay, ReportInputs, SomOverlay};
use malscope_core::{parse_document, ClassifierConfig, NeighborClassifier, SchemaNormalizer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Reference session (initialized via load_references)
/// RefCell because WASM is single-threaded
thread_local! {
    static SESSION: RefCell<Option<Session>> = RefCell::new(None);
}

struct Session {
    references: LoadedReferences,
    classifier: NeighborClassifier,
}

// ============================================================================
// Stateless operations (same as raw ABI target, but with wasm-bindgen)
// ============================================================================

/// Normalize a raw SOM document.
///
/// Returns: `{"cells":[..],"total":N}` on success
///          `{"error":"description"}` on error
#[wasm_bindgen]
pub fn normalize_som(input: &str) -> String {
    malscope_core::normalize_som_json(input)
}

/// Predict a label for a query point against grid cells or points.
#[wasm_bindgen]
pub fn classify_query(input: &str) -> String {
    malscope_core::classify_json(input)
}

/// Assign palette colors to a label catalog.
#[wasm_bindgen]
pub fn assign_label_colors(input: &str) -> String {
    malscope_core::label_colors_json(input)
}

/// Parse a fetched response body, naming the document on failure.
///
/// Returns the body re-serialized on success, or
/// `{"load_error":"<document> JSON parse failed: ..."}`.
#[wasm_bindgen]
pub fn parse_fetched(document: &str, text: &str) -> String {
    match parse_document(document, text) {
        Ok(value) => value.to_string(),
        Err(e) => serde_json::json!({ "load_error": e.to_string() }).to_string(),
    }
}

// ============================================================================
// Reference session
// ============================================================================

#[derive(Serialize)]
struct LoadSummary<'a> {
    labels: usize,
    points: usize,
    soms: Vec<&'a str>,
}

/// Decode the report's raw documents and keep them for [`reroll`].
///
/// Input: `{"filename":"..","labels":..,"points":..,"soms":[..],"config":{..}}`
/// Returns JSON: `{"labels":N,"points":N,"soms":["SOM-APT30",..]}`
#[wasm_bindgen]
pub fn load_references(input: &str) -> Result<String, JsValue> {
    // Route Rust panics to console.error instead of "RuntimeError: unreachable"
    console_error_panic_hook::set_once();

    let value: serde_json::Value = serde_json::from_str(input)
        .map_err(|e| JsValue::from_str(&format!("Invalid JSON: {}", e)))?;
    let config: ClassifierConfig = match value.get("config") {
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?,
        None => ClassifierConfig::default(),
    };
    let inputs: ReportInputs = serde_json::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid report inputs: {}", e)))?;

    let references = LoadedReferences::load(&inputs, &SchemaNormalizer::default());
    let summary = serde_json::to_string(&LoadSummary {
        labels: references.colors.len(),
        points: references.points.len(),
        soms: references.soms.iter().map(|s| s.title.as_str()).collect(),
    })
    .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;

    SESSION.with(|s| {
        *s.borrow_mut() = Some(Session {
            references,
            classifier: NeighborClassifier::new(config),
        });
    });

    Ok(summary)
}

/// Run `f` against the loaded session. Errors if none is loaded.
fn with_session<T>(f: impl FnOnce(&Session) -> Result<T, JsValue>) -> Result<T, JsValue> {
    SESSION.with(|s| match s.borrow().as_ref() {
        Some(session) => f(session),
        None => Err(JsValue::from_str(
            "References not loaded. Call load_references() first.",
        )),
    })
}

#[derive(Serialize)]
struct RollOutput {
    soms: Vec<SomOverlay>,
    scatter: Option<Overlay>,
}

/// Roll new query points on every loaded chart and classify them.
///
/// Returns JSON: `{"soms":[{"title":..,"overlay":{..}},..],"scatter":{..}|null}`
#[wasm_bindgen]
pub fn reroll(seed: u64) -> Result<String, JsValue> {
    with_session(|session| {
        let mut rng = StdRng::seed_from_u64(seed);
        let (soms, scatter) = session.references.roll(&session.classifier, &mut rng);

        serde_json::to_string(&RollOutput { soms, scatter })
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    })
}

/// Label colors of the loaded session.
/// Returns JSON: `{"LABEL":"#rrggbb",..}`
#[wasm_bindgen]
pub fn session_colors() -> Result<String, JsValue> {
    with_session(|session| {
        serde_json::to_string(&session.references.colors)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    })
}

// ============================================================================
// Utilities
// ============================================================================

/// Get the malscope-core version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Check if references are loaded.
#[wasm_bindgen]
pub fn is_loaded() -> bool {
    SESSION.with(|s| s.borrow().is_some())
}
