use std::path::PathBuf;

use ckpt_diff::DistanceMetric;
use ckpt_load::CheckpointKind;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ckpt",
    about = "Compare model checkpoints parameter by parameter",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with default settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CheckpointType {
    File,
    #[value(name = "huggingface")]
    HuggingFace,
}

impl From<CheckpointType> for CheckpointKind {
    fn from(t: CheckpointType) -> Self {
        match t {
            CheckpointType::File => CheckpointKind::File,
            CheckpointType::HuggingFace => CheckpointKind::HuggingFace,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Metric {
    Rms,
    MaxAbs,
}

impl From<Metric> for DistanceMetric {
    fn from(m: Metric) -> Self {
        match m {
            Metric::Rms => DistanceMetric::Rms,
            Metric::MaxAbs => DistanceMetric::MaxAbs,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Show parameter-level differences between two checkpoints
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// First (source) checkpoint: a path, or a model id with `--checkpoint-type-1 huggingface`
    pub checkpoint1: String,
    /// Second (target) checkpoint
    pub checkpoint2: String,
    #[arg(long = "checkpoint-type-1", value_enum, default_value = "file")]
    pub checkpoint_type_1: CheckpointType,
    #[arg(long = "checkpoint-type-2", value_enum, default_value = "file")]
    pub checkpoint_type_2: CheckpointType,
    /// Prefix removed from the first checkpoint's keys
    #[arg(long = "strip-prefix-1")]
    pub strip_prefix_1: Option<String>,
    /// Prefix removed from the second checkpoint's keys
    #[arg(long = "strip-prefix-2")]
    pub strip_prefix_2: Option<String>,
    #[arg(long, value_enum)]
    pub metric: Option<Metric>,
    /// Decimal places printed for distances
    #[arg(long)]
    pub precision: Option<usize>,
    /// Report per-parameter distance errors instead of aborting
    #[arg(long)]
    pub keep_going: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff_args(argv: &[&str]) -> DiffArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Diff(args) => args,
        }
    }

    #[test]
    fn parse_diff_defaults() {
        let args = diff_args(&["ckpt", "diff", "a.safetensors", "b.safetensors"]);
        assert_eq!(args.checkpoint1, "a.safetensors");
        assert_eq!(args.checkpoint2, "b.safetensors");
        assert_eq!(args.checkpoint_type_1, CheckpointType::File);
        assert_eq!(args.checkpoint_type_2, CheckpointType::File);
        assert!(args.strip_prefix_1.is_none());
        assert!(args.metric.is_none());
        assert!(args.precision.is_none());
        assert!(!args.keep_going);
    }

    #[test]
    fn parse_diff_huggingface_with_prefix() {
        let args = diff_args(&[
            "ckpt",
            "diff",
            "roberta-base",
            "./finetuned",
            "--checkpoint-type-1",
            "huggingface",
            "--strip-prefix-2",
            "roberta.",
        ]);
        assert_eq!(args.checkpoint_type_1, CheckpointType::HuggingFace);
        assert_eq!(args.checkpoint_type_2, CheckpointType::File);
        assert_eq!(args.strip_prefix_2.as_deref(), Some("roberta."));
        assert_eq!(CheckpointKind::from(args.checkpoint_type_1), CheckpointKind::HuggingFace);
    }

    #[test]
    fn parse_diff_metric_and_precision() {
        let args = diff_args(&[
            "ckpt", "diff", "a", "b", "--metric", "max-abs", "--precision", "6", "--keep-going",
        ]);
        assert_eq!(args.metric, Some(Metric::MaxAbs));
        assert_eq!(DistanceMetric::from(Metric::MaxAbs), DistanceMetric::MaxAbs);
        assert_eq!(args.precision, Some(6));
        assert!(args.keep_going);
    }

    #[test]
    fn parse_rejects_unknown_checkpoint_type() {
        let argv = ["ckpt", "diff", "a", "b", "--checkpoint-type-1", "s3"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn parse_requires_two_checkpoints() {
        assert!(Cli::try_parse_from(["ckpt", "diff", "a"]).is_err());
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "ckpt",
            "diff",
            "a",
            "b",
            "--verbose",
            "--format",
            "json",
            "--no-color",
            "--config",
            "ckpt.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("ckpt.toml")));
    }
}
