use std::io::{self, Write};

use anyhow::Context;
use ckpt_diff::{checkpoint_diff_with, CheckpointDiff, DiffOptions, DistanceMetric, ErrorPolicy};
use ckpt_load::{
    CheckpointKind, CheckpointLoader, CheckpointResolver, LocalResolver, SafeTensorsLoader,
};
use ckpt_types::StateDict;
use colored::Colorize;
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;
use crate::render;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if cli.no_color {
        config.color = false;
    }
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &config, cli.format, cli.verbose),
    }
}

/// Effective diff settings after layering flags over the config file.
#[derive(Clone, Debug, PartialEq)]
struct DiffSettings {
    precision: usize,
    options: DiffOptions,
}

fn settings(args: &DiffArgs, config: &CliConfig) -> DiffSettings {
    let keep_going = args.keep_going || config.keep_going;
    DiffSettings {
        precision: args.precision.unwrap_or(config.precision),
        options: DiffOptions {
            metric: args.metric.map(DistanceMetric::from).unwrap_or(config.metric),
            on_error: if keep_going {
                ErrorPolicy::Report
            } else {
                ErrorPolicy::Abort
            },
        },
    }
}

fn cmd_diff(
    args: DiffArgs,
    config: &CliConfig,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let settings = settings(&args, config);
    let resolver = match &config.hub_cache {
        Some(dir) => LocalResolver::with_hub_cache(dir),
        None => LocalResolver::from_env(),
    };
    let diff = diff_checkpoints(&args, &resolver, &SafeTensorsLoader, &settings.options)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => render::write_json(&mut out, &diff)?,
        OutputFormat::Text => {
            render::write_text(&mut out, &diff, settings.precision, config.color)?;
            if verbose {
                let line = render::summary(&diff);
                if config.color {
                    writeln!(out, "{}", line.bold())?;
                } else {
                    writeln!(out, "{line}")?;
                }
            }
        }
    }
    Ok(())
}

fn diff_checkpoints(
    args: &DiffArgs,
    resolver: &dyn CheckpointResolver,
    loader: &dyn CheckpointLoader,
    options: &DiffOptions,
) -> anyhow::Result<CheckpointDiff> {
    let a = load_checkpoint(
        resolver,
        loader,
        &args.checkpoint1,
        args.checkpoint_type_1.into(),
        args.strip_prefix_1.as_deref(),
    )?;
    let b = load_checkpoint(
        resolver,
        loader,
        &args.checkpoint2,
        args.checkpoint_type_2.into(),
        args.strip_prefix_2.as_deref(),
    )?;
    checkpoint_diff_with(&a, &b, options).context("failed to diff checkpoints")
}

fn load_checkpoint(
    resolver: &dyn CheckpointResolver,
    loader: &dyn CheckpointLoader,
    identifier: &str,
    kind: CheckpointKind,
    strip_prefix: Option<&str>,
) -> anyhow::Result<StateDict> {
    let path = resolver
        .resolve(identifier, kind)
        .with_context(|| format!("failed to resolve {kind} checkpoint {identifier}"))?;
    debug!(identifier, path = %path.display(), "resolved checkpoint");
    loader
        .load(&path, strip_prefix)
        .with_context(|| format!("failed to load checkpoint {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckpt_diff::DiffStep;
    use ckpt_types::Shape;
    use clap::Parser;
    use std::path::Path;

    /// Write a minimal F32 SafeTensors file.
    fn write_f32(path: &Path, entries: &[(&str, &[usize], &[f32])]) {
        let mut header = serde_json::Map::new();
        let mut data = Vec::new();
        for (key, shape, values) in entries {
            let start = data.len();
            data.extend(values.iter().flat_map(|v| v.to_le_bytes()));
            header.insert(
                key.to_string(),
                serde_json::json!({
                    "dtype": "F32",
                    "shape": shape,
                    "data_offsets": [start, data.len()],
                }),
            );
        }
        let json = serde_json::to_vec(&header).unwrap();
        let mut buf = (json.len() as u64).to_le_bytes().to_vec();
        buf.extend(json);
        buf.extend(data);
        std::fs::write(path, buf).unwrap();
    }

    fn parse(argv: &[&str]) -> DiffArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Diff(args) => args,
        }
    }

    #[test]
    fn flags_override_config() {
        let config = CliConfig {
            precision: 8,
            metric: DistanceMetric::MaxAbs,
            ..CliConfig::default()
        };
        let args = parse(&["ckpt", "diff", "a", "b", "--precision", "2", "--metric", "rms"]);
        let s = settings(&args, &config);
        assert_eq!(s.precision, 2);
        assert_eq!(s.options.metric, DistanceMetric::Rms);
        assert_eq!(s.options.on_error, ErrorPolicy::Abort);

        let s = settings(&parse(&["ckpt", "diff", "a", "b"]), &config);
        assert_eq!(s.precision, 8);
        assert_eq!(s.options.metric, DistanceMetric::MaxAbs);
    }

    #[test]
    fn keep_going_from_config_or_flag() {
        let config = CliConfig {
            keep_going: true,
            ..CliConfig::default()
        };
        let s = settings(&parse(&["ckpt", "diff", "a", "b"]), &config);
        assert_eq!(s.options.on_error, ErrorPolicy::Report);

        let args = parse(&["ckpt", "diff", "a", "b", "--keep-going"]);
        let s = settings(&args, &CliConfig::default());
        assert_eq!(s.options.on_error, ErrorPolicy::Report);
    }

    #[test]
    fn diffs_two_files_with_prefix_stripping() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.safetensors");
        let tuned = dir.path().join("tuned.safetensors");
        write_f32(&base, &[("w1", &[4], &[0.0; 4]), ("w2", &[4], &[0.0; 4])]);
        write_f32(
            &tuned,
            &[("model.w2", &[4], &[0.5; 4]), ("classifier.w", &[4], &[1.0; 4])],
        );

        let args = parse(&[
            "ckpt",
            "diff",
            base.to_str().unwrap(),
            tuned.to_str().unwrap(),
            "--strip-prefix-2",
            "model.",
        ]);
        let resolver = LocalResolver::with_hub_cache(dir.path());
        let diff = diff_checkpoints(&args, &resolver, &SafeTensorsLoader, &DiffOptions::default())
            .unwrap();
        assert_eq!(
            diff.steps,
            vec![
                DiffStep::Remove {
                    key: "w1".into(),
                    shape: Shape::from([4]),
                },
                DiffStep::Modify {
                    key: "w2".into(),
                    shape: Shape::from([4]),
                    distance: 0.5,
                },
            ]
        );
    }

    #[test]
    fn hub_checkpoint_is_read_from_cache() {
        let cache = tempfile::tempdir().unwrap();
        let snapshot = cache.path().join("models--org--tiny/snapshots/rev1");
        std::fs::create_dir_all(&snapshot).unwrap();
        write_f32(&snapshot.join("model.safetensors"), &[("w", &[2], &[1.0, 1.0])]);
        let local = cache.path().join("local.safetensors");
        write_f32(&local, &[("w", &[2], &[1.0, 1.0])]);

        let args = parse(&[
            "ckpt",
            "diff",
            "org/tiny",
            local.to_str().unwrap(),
            "--checkpoint-type-1",
            "huggingface",
        ]);
        let resolver = LocalResolver::with_hub_cache(cache.path());
        let diff = diff_checkpoints(&args, &resolver, &SafeTensorsLoader, &DiffOptions::default())
            .unwrap();
        assert!(diff.is_identical());
    }

    #[test]
    fn missing_checkpoint_names_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse(&["ckpt", "diff", "/no/such/a.safetensors", "/no/such/b.safetensors"]);
        let resolver = LocalResolver::with_hub_cache(dir.path());
        let err = diff_checkpoints(&args, &resolver, &SafeTensorsLoader, &DiffOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/a.safetensors"));
    }
}
