use std::path::PathBuf;

use clap::Parser;
use malscope::tracing::prefix;
use malscope::{Error, Result};
use malscope_core::report::{build_report, FamilyScore, ReportInputs};
use malscope_core::ClassifierConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

mod load;

#[derive(Parser, Debug)]
#[command(name = "malscope-report")]
#[command(about = "Build a malware analysis report from SOM and t-SNE reference data")]
#[command(version)]
struct Args {
    /// Label catalog document
    #[arg(long)]
    labels: PathBuf,

    /// t-SNE embedding points document
    #[arg(long)]
    points: PathBuf,

    /// SOM document (repeatable, one chart each)
    #[arg(long = "som")]
    soms: Vec<PathBuf>,

    /// Periodic evaluation rows (adds the evaluation section)
    #[arg(long)]
    samples: Option<PathBuf>,

    /// First evaluation period to include
    #[arg(long, requires = "period_to")]
    period_from: Option<f64>,

    /// Last evaluation period to include
    #[arg(long, requires = "period_from")]
    period_to: Option<f64>,

    /// Name of the analyzed file
    #[arg(long, default_value = "sample.exe")]
    filename: String,

    /// Family score as LABEL=SCORE (repeatable)
    #[arg(long = "family", value_parser = parse_family)]
    families: Vec<FamilyScore>,

    /// APT30 probability for the analyzed file
    #[arg(long, default_value_t = 0.0)]
    apt30_probability: f64,

    /// Seed for query point placement (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Neighbors consulted against SOM grids
    #[arg(long, default_value_t = malscope_core::knn::DEFAULT_GRID_K)]
    grid_k: usize,

    /// Neighbors consulted against the t-SNE points
    #[arg(long, default_value_t = malscope_core::knn::DEFAULT_POINT_K)]
    point_k: usize,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn parse_family(raw: &str) -> std::result::Result<FamilyScore, String> {
    let (label, score) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected LABEL=SCORE, got '{}'", raw))?;
    let score: f64 = score
        .trim()
        .parse()
        .map_err(|e| format!("invalid score in '{}': {}", raw, e))?;
    Ok(FamilyScore {
        label: label.trim().to_string(),
        score,
    })
}

impl Args {
    fn classifier_config(&self) -> Result<ClassifierConfig> {
        if self.grid_k == 0 || self.point_k == 0 {
            return Err(Error::Config("neighbor counts must be at least 1".to_string()));
        }
        Ok(ClassifierConfig {
            grid_k: self.grid_k,
            point_k: self.point_k,
            ..ClassifierConfig::default()
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    malscope::tracing::init_with_filter(&args.log_level);

    info!("{} malscope-report {}", prefix::LOAD, env!("CARGO_PKG_VERSION"));

    let config = args.classifier_config()?;

    let sources = load::Sources {
        labels: &args.labels,
        points: &args.points,
        soms: &args.soms,
        samples: args.samples.as_deref(),
    };
    let documents = match load::load_all(sources).await {
        Ok(documents) => documents,
        Err(e) => {
            error!("{} {}", prefix::LOAD, e);
            println!("{}", serde_json::json!({ "load_error": e.to_string() }));
            return Err(e.into());
        }
    };

    let inputs = ReportInputs {
        filename: args.filename.clone(),
        labels: documents.labels,
        points: documents.points,
        soms: documents.soms,
        families: args.families.clone(),
        apt30_probability: args.apt30_probability,
        samples: documents.samples,
        period: args.period_from.zip(args.period_to),
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let report = build_report(&inputs, config, &mut rng);

    for som in &report.soms {
        info!(
            "{} {}: {} cells, predicted {}",
            prefix::SOM,
            som.title,
            som.cells,
            som.overlay.prediction.label
        );
    }
    if let Some(scatter) = &report.scatter {
        info!("{} t-SNE predicted {}", prefix::KNN, scatter.prediction.label);
    }
    if let Some(evaluation) = &report.evaluation {
        info!(
            "evaluation periods {}..={}: {} classes",
            evaluation.selected.0,
            evaluation.selected.1,
            evaluation.class_counts.len()
        );
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_argument() {
        let family = parse_family("TROJAN.GENERIC=0.62").unwrap();
        assert_eq!(family.label, "TROJAN.GENERIC");
        assert_eq!(family.score, 0.62);

        assert!(parse_family("GOODWARE").is_err());
        assert!(parse_family("GOODWARE=high").is_err());
    }

    #[test]
    fn repeated_som_arguments() {
        let args = Args::try_parse_from([
            "malscope-report",
            "--labels",
            "labels.json",
            "--points",
            "tsne.json",
            "--som",
            "a.json",
            "--som",
            "b.json",
            "--family",
            "GOODWARE=0.16",
            "--seed",
            "9",
        ])
        .unwrap();

        assert_eq!(args.soms.len(), 2);
        assert_eq!(args.families[0].label, "GOODWARE");
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.period_from.zip(args.period_to), None);
        assert_eq!(args.classifier_config().unwrap(), ClassifierConfig::default());
    }

    #[test]
    fn period_bounds_come_in_pairs() {
        let result = Args::try_parse_from([
            "malscope-report",
            "--labels",
            "l.json",
            "--points",
            "p.json",
            "--period-from",
            "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_k_is_rejected() {
        let args = Args::try_parse_from([
            "malscope-report",
            "--labels",
            "l.json",
            "--points",
            "p.json",
            "--grid-k",
            "0",
        ])
        .unwrap();
        assert!(matches!(args.classifier_config(), Err(Error::Config(_))));
    }
}
