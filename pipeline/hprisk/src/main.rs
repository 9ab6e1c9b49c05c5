use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use hprisk_features::{encode_all, FeatureField, FeatureVector, RawAnswers};
use hprisk_model::{
    InferenceService, Prediction, ProbeOutcome, ServiceConfig, ServiceError, ServiceInfo,
};
use log::LevelFilter;
use serde_json::json;

const DEFAULT_CONFIG: &str = "hprisk.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum OutputMode {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "hprisk",
    version,
    about = "Encode H. pylori lifestyle questionnaire answers and score them with a trained model",
    long_about = "hprisk encodes the five lifestyle questionnaire answers into the model's\n\
        feature vector and scores it with a trained artifact found in a model directory.\n\n\
        EXAMPLES:\n\
        \n  hprisk encode --snack-frequency 1-2次/周            Show the encoded vector\n\
        \n  hprisk predict --answers answers.json              Score an answers file\n\
        \n  hprisk predict --model-dir ./models --format json  Score with an explicit directory\n\
        \n  hprisk info --load                                 Show where the model was found"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ./hprisk.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputMode::Text, global = true)]
    format: OutputMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the encoded feature vector for a set of answers
    Encode(AnswerArgs),

    /// Encode answers and score them with the model
    Predict {
        #[command(flatten)]
        answers: AnswerArgs,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show model resolution and load diagnostics
    Info {
        #[command(flatten)]
        model: ModelArgs,
        /// Attempt a load before reporting
        #[arg(long)]
        load: bool,
    },

    /// List the questionnaire fields and the categories each accepts
    Fields,
}

#[derive(Debug, Args, Clone, Default)]
struct AnswerArgs {
    /// JSON object of answers keyed by field key or label ("-" reads stdin)
    #[arg(long, value_name = "FILE")]
    answers: Option<PathBuf>,

    #[arg(long, value_name = "ANSWER")]
    toilet_lid: Option<String>,

    /// Several types may be joined with '+'
    #[arg(long, value_name = "ANSWER")]
    toilet_type: Option<String>,

    #[arg(long, value_name = "ANSWER")]
    house_ownership: Option<String>,

    #[arg(long, value_name = "ANSWER")]
    snack_frequency: Option<String>,

    /// Several sources may be joined with '+'
    #[arg(long, value_name = "ANSWER")]
    vegetable_purchase: Option<String>,
}

#[derive(Debug, Args, Clone, Default)]
struct ModelArgs {
    /// Candidate model directory; repeat to probe several in order
    #[arg(long = "model-dir", value_name = "DIR")]
    model_dirs: Vec<PathBuf>,

    /// Load this artifact directly instead of searching
    #[arg(long, value_name = "FILE", conflicts_with = "model_dirs")]
    model_file: Option<PathBuf>,

    /// Do not probe the current directory
    #[arg(long)]
    no_cwd: bool,

    /// Reject bundles in which no element can score or predict
    #[arg(long)]
    strict_unwrap: bool,
}

impl AnswerArgs {
    fn collect(&self) -> Result<RawAnswers, String> {
        let mut answers = match &self.answers {
            Some(path) => read_answers(path)?,
            None => RawAnswers::default(),
        };
        let flags = [
            (FeatureField::ToiletLid, &self.toilet_lid),
            (FeatureField::ToiletType, &self.toilet_type),
            (FeatureField::HouseOwnership, &self.house_ownership),
            (FeatureField::SnackFrequency, &self.snack_frequency),
            (FeatureField::VegetablePurchase, &self.vegetable_purchase),
        ];
        for (field, value) in flags {
            if let Some(value) = value {
                answers.set(field, value.as_str());
            }
        }
        Ok(answers)
    }
}

impl ModelArgs {
    /// Command-line directories are probed ahead of configured ones.
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(file) = &self.model_file {
            config.model_file = Some(file.clone());
        }
        if let Some((first, rest)) = self.model_dirs.split_first() {
            let mut fallbacks = rest.to_vec();
            fallbacks.extend(config.model_dir.take());
            fallbacks.append(&mut config.fallback_dirs);
            config.model_dir = Some(first.clone());
            config.fallback_dirs = fallbacks;
        }
        if self.no_cwd {
            config.search_current_dir = false;
        }
        if self.strict_unwrap {
            config.strict_unwrap = true;
        }
    }
}

fn read_answers(path: &Path) -> Result<RawAnswers, String> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("cannot read answers from stdin: {e}"))?;
        buf
    } else {
        fs::read_to_string(path)
            .map_err(|e| format!("cannot read answers file '{}': {e}", path.display()))?
    };
    parse_answers(&text)
}

/// Accepts an object keyed by field key or canonical label.
fn parse_answers(text: &str) -> Result<RawAnswers, String> {
    let pairs: BTreeMap<String, String> =
        serde_json::from_str(text).map_err(|e| format!("invalid answers JSON: {e}"))?;
    for key in pairs.keys() {
        if key.parse::<FeatureField>().is_err() {
            log::warn!("ignoring unknown answers key '{key}'");
        }
    }
    Ok(RawAnswers::from_pairs(pairs))
}

fn load_config(explicit: Option<&Path>) -> Result<ServiceConfig, String> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None if Path::new(DEFAULT_CONFIG).is_file() => PathBuf::from(DEFAULT_CONFIG),
        None => return Ok(ServiceConfig::default()),
    };
    log::debug!("reading config {}", path.display());
    ServiceConfig::from_file(&path).map_err(|e| e.to_string())
}

fn build_service(cli: &Cli, model: &ModelArgs) -> Result<InferenceService, String> {
    let mut config = load_config(cli.config.as_deref())?;
    model.apply(&mut config);
    let cwd = std::env::current_dir().ok();
    Ok(InferenceService::from_config(&config, cwd.as_deref()))
}

fn warn_unrecognized(answers: &RawAnswers) {
    for field in answers.unrecognized() {
        log::warn!(
            "{field}: '{}' is not one of the form's categories; encoding falls back to the default",
            answers.get(field)
        );
    }
}

fn run_encode(args: &AnswerArgs, mode: OutputMode) -> i32 {
    let answers = match args.collect() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };
    warn_unrecognized(&answers);
    let vector = encode_all(&answers);
    match mode {
        OutputMode::Text => {
            for field in FeatureField::ALL {
                let value = vector
                    .get(field)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "missing".to_string());
                println!("{:<20} {:<8} {}", field.key(), value, answers.get(field));
            }
            println!("vector: {vector}");
        }
        OutputMode::Json => {
            println!("{}", json!({ "answers": answers, "features": vector }));
        }
    }
    0
}

fn render_prediction(vector: &FeatureVector, prediction: &Prediction) {
    println!("features: {vector}");
    println!("prediction: {prediction}");
    if let Some(p) = prediction.positive_probability() {
        println!("positive probability: {:.1}%", p * 100.0);
    }
    match prediction.verdict() {
        Some(v) => println!("verdict: {v}"),
        None => println!("verdict: n/a"),
    }
}

fn run_predict(cli: &Cli, args: &AnswerArgs, model: &ModelArgs) -> i32 {
    let answers = match args.collect() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };
    let service = match build_service(cli, model) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };
    warn_unrecognized(&answers);
    let vector = encode_all(&answers);
    let outcome = service.try_predict(&vector);
    match cli.format {
        OutputMode::Text => match &outcome {
            Ok(prediction) => render_prediction(&vector, prediction),
            Err(e) => {
                println!("features: {vector}");
                eprintln!("prediction unavailable: {e}");
            }
        },
        OutputMode::Json => {
            let (prediction, error) = split(&outcome);
            println!(
                "{}",
                json!({
                    "features": vector,
                    "prediction": prediction,
                    "verdict": prediction.and_then(Prediction::verdict),
                    "positive_probability": prediction.and_then(Prediction::positive_probability),
                    "error": error,
                })
            );
        }
    }
    if outcome.is_ok() {
        0
    } else {
        1
    }
}

fn split(outcome: &Result<Prediction, ServiceError>) -> (Option<&Prediction>, Option<String>) {
    match outcome {
        Ok(p) => (Some(p), None),
        Err(e) => (None, Some(e.to_string())),
    }
}

fn render_info(info: &ServiceInfo) {
    let show = |p: &Option<PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    };
    println!("state: {}", info.state);
    println!("artifact: {}", show(&info.artifact_path));
    println!("active directory: {}", show(&info.active_dir));
    println!("model type: {}", info.model_type);
    if let Some(caps) = info.capabilities {
        println!("capabilities: {caps}");
    }
    if let Some(rule) = info.selection {
        println!("selected: {rule}");
    }
    if !info.probes.is_empty() {
        println!("probes:");
        for probe in &info.probes {
            let outcome = match &probe.outcome {
                ProbeOutcome::Missing => "missing".to_string(),
                ProbeOutcome::Unreadable(e) => format!("unreadable ({e})"),
                ProbeOutcome::NoArtifacts => "no artifacts".to_string(),
                ProbeOutcome::Selected(file) => format!("selected {}", file.display()),
            };
            println!("  {}: {outcome}", probe.dir.display());
        }
    }
    if let Some(e) = &info.last_error {
        println!("last error: {e}");
    }
}

fn run_info(cli: &Cli, model: &ModelArgs, load: bool) -> i32 {
    let service = match build_service(cli, model) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };
    let loaded = !load || service.load().is_ok();
    let info = service.info();
    match cli.format {
        OutputMode::Text => render_info(&info),
        OutputMode::Json => match serde_json::to_string_pretty(&info) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("error: {e}");
                return 2;
            }
        },
    }
    if loaded {
        0
    } else {
        1
    }
}

fn run_fields(mode: OutputMode) -> i32 {
    match mode {
        OutputMode::Text => {
            for field in FeatureField::ALL {
                let multi = if field.is_multi_select() { " (multi-select, '+')" } else { "" };
                println!("{}. {} [{}]{multi}", field.slot() + 1, field.label(), field.key());
                println!("   {}", field.options().join(" | "));
            }
        }
        OutputMode::Json => {
            let fields: Vec<_> = FeatureField::ALL
                .iter()
                .map(|f| {
                    json!({
                        "key": f.key(),
                        "label": f.label(),
                        "slot": f.slot(),
                        "multi_select": f.is_multi_select(),
                        "options": f.options(),
                    })
                })
                .collect();
            println!("{}", json!(fields));
        }
    }
    0
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, takes precedence over -v
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

fn run_cli() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Command::Encode(args) => run_encode(args, cli.format),
        Command::Predict { answers, model } => run_predict(&cli, answers, model),
        Command::Info { model, load } => run_info(&cli, model, *load),
        Command::Fields => run_fields(cli.format),
    }
}

fn main() {
    std::process::exit(run_cli());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_parses_verbose_flag() {
        let cli = Cli::try_parse_from(["hprisk", "-vvv", "fields"]).unwrap();
        assert_eq!(cli.verbose, 3, "verbose count should be 3 for -vvv");
    }

    #[test]
    fn cli_parses_predict_with_flags() {
        let cli = Cli::try_parse_from([
            "hprisk",
            "predict",
            "--snack-frequency",
            "1-2次/周",
            "--model-dir",
            "a",
            "--model-dir",
            "b",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputMode::Json);
        match cli.command {
            Command::Predict { answers, model } => {
                assert_eq!(answers.snack_frequency.as_deref(), Some("1-2次/周"));
                assert_eq!(model.model_dirs, vec![PathBuf::from("a"), PathBuf::from("b")]);
            }
            _ => panic!("expected Predict command"),
        }
    }

    #[test]
    fn model_file_conflicts_with_model_dir() {
        assert!(Cli::try_parse_from([
            "hprisk",
            "info",
            "--model-file",
            "m.pkl",
            "--model-dir",
            "d"
        ])
        .is_err());
    }

    #[test]
    fn flags_override_answers_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("answers.json");
        fs::write(
            &path,
            r#"{"toilet_lid": "是", "零食的食用频率": "否", "blood_type": "A"}"#,
        )
        .unwrap();
        let args = AnswerArgs {
            answers: Some(path),
            snack_frequency: Some("1-2次/周".into()),
            ..AnswerArgs::default()
        };
        let answers = args.collect().unwrap();
        assert_eq!(answers.get(FeatureField::ToiletLid), "是");
        assert_eq!(answers.get(FeatureField::SnackFrequency), "1-2次/周");
        assert_eq!(answers.get(FeatureField::HouseOwnership), "");
    }

    #[test]
    fn malformed_answers_are_reported() {
        assert!(parse_answers("[1, 2]").unwrap_err().starts_with("invalid answers JSON"));
    }

    #[test]
    fn command_line_dirs_go_first() {
        let mut config = ServiceConfig {
            model_dir: Some("configured".into()),
            fallback_dirs: vec!["fallback".into()],
            ..ServiceConfig::default()
        };
        let args = ModelArgs {
            model_dirs: vec!["one".into(), "two".into()],
            no_cwd: true,
            ..ModelArgs::default()
        };
        args.apply(&mut config);
        assert_eq!(
            config.candidate_dirs(Some(Path::new("/work"))),
            vec![
                PathBuf::from("one"),
                PathBuf::from("two"),
                PathBuf::from("configured"),
                PathBuf::from("fallback"),
            ]
        );
    }
}
