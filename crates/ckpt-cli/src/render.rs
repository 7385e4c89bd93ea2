use std::io::{self, Write};

use ckpt_diff::{CheckpointDiff, DiffStep};
use colored::Colorize;

/// Plain-text line for one step.
pub fn step_line(step: &DiffStep, precision: usize) -> String {
    match step {
        DiffStep::Keep { key, shape } => format!(" {key}, shape = {shape}"),
        DiffStep::Insert { key, shape } => format!("+{key}, shape = {shape}"),
        DiffStep::Remove { key, shape } => format!("-{key}, shape = {shape}"),
        DiffStep::Modify {
            key,
            shape,
            distance,
        } => format!("!{key}, shape = {shape}, difference = {distance:.precision$}"),
    }
}

/// Write every step of `diff` in order, one line each.
pub fn write_text<W: Write>(
    out: &mut W,
    diff: &CheckpointDiff,
    precision: usize,
    color: bool,
) -> io::Result<()> {
    for (index, step) in diff.steps.iter().enumerate() {
        if let Some(failure) = diff.failure_at(index) {
            let line = format!(
                "?{}, shape = {}, error = {}",
                failure.key, failure.shape, failure.message
            );
            if color {
                writeln!(out, "{}", line.magenta())?;
            } else {
                writeln!(out, "{line}")?;
            }
            continue;
        }

        let line = step_line(step, precision);
        if !color {
            writeln!(out, "{line}")?;
            continue;
        }
        match step {
            DiffStep::Keep { .. } => writeln!(out, "{line}")?,
            DiffStep::Insert { .. } => writeln!(out, "{}", line.green())?,
            DiffStep::Remove { .. } => writeln!(out, "{}", line.red())?,
            DiffStep::Modify { .. } => writeln!(out, "{}", line.yellow())?,
        }
    }
    Ok(())
}

pub fn summary(diff: &CheckpointDiff) -> String {
    let mut line = format!(
        "{} parameters: {} unchanged, {} added, {} removed, {} modified",
        diff.len(),
        diff.unchanged(),
        diff.additions(),
        diff.removals(),
        diff.modifications()
    );
    if !diff.failures.is_empty() {
        line.push_str(&format!(", {} failed", diff.failures.len()));
    }
    line
}

pub fn write_json<W: Write>(out: &mut W, diff: &CheckpointDiff) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, diff)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckpt_diff::DistanceFailure;
    use ckpt_types::Shape;

    fn sample() -> CheckpointDiff {
        CheckpointDiff {
            steps: vec![
                DiffStep::Keep {
                    key: "embed.weight".into(),
                    shape: Shape::from([768, 1024]),
                },
                DiffStep::Remove {
                    key: "w1".into(),
                    shape: Shape::from([4]),
                },
                DiffStep::Modify {
                    key: "w2".into(),
                    shape: Shape::from([4]),
                    distance: 0.5,
                },
                DiffStep::Insert {
                    key: "bias".into(),
                    shape: Shape::scalar(),
                },
            ],
            failures: Vec::new(),
        }
    }

    fn text(diff: &CheckpointDiff, precision: usize) -> String {
        let mut buf = Vec::new();
        write_text(&mut buf, diff, precision, false).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn renders_each_step_kind() {
        assert_eq!(
            text(&sample(), 4),
            " embed.weight, shape = (768, 1024)\n\
             -w1, shape = (4,)\n\
             !w2, shape = (4,), difference = 0.5000\n\
             +bias, shape = ()\n"
        );
    }

    #[test]
    fn precision_controls_decimals() {
        let step = DiffStep::Modify {
            key: "w".into(),
            shape: Shape::from([2]),
            distance: 1.0 / 3.0,
        };
        assert_eq!(step_line(&step, 2), "!w, shape = (2,), difference = 0.33");
        assert_eq!(step_line(&step, 0), "!w, shape = (2,), difference = 0");
    }

    #[test]
    fn failed_entries_are_marked() {
        let mut diff = sample();
        diff.failures.push(DistanceFailure {
            index: 0,
            key: "embed.weight".into(),
            shape: Shape::from([768, 1024]),
            message: "distance is not finite: NaN".into(),
        });
        let out = text(&diff, 4);
        assert_eq!(
            out.lines().next(),
            Some("?embed.weight, shape = (768, 1024), error = distance is not finite: NaN")
        );
    }

    #[test]
    fn summary_counts() {
        assert_eq!(
            summary(&sample()),
            "4 parameters: 1 unchanged, 1 added, 1 removed, 1 modified"
        );
    }

    #[test]
    fn json_output_is_the_serialized_diff() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["steps"].as_array().unwrap().len(), 4);
        assert_eq!(value["steps"][2]["op"], "modify");
        assert_eq!(value["steps"][2]["distance"], 0.5);
        assert!(value["failures"].as_array().unwrap().is_empty());
    }
}
