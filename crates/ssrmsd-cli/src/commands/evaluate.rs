use crate::cli::EvaluateArgs;
use crate::config::PartialEvaluateConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use ssrmsd::{
    core::io::{traits::TrajectoryFile, xyz::XyzFile},
    engine::progress::ProgressReporter,
    workflows,
};
use std::fs::File;
use std::io::BufWriter;
use tracing::{info, warn};

pub fn run(args: EvaluateArgs, show_progress: bool) -> Result<()> {
    let partial_config = PartialEvaluateConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    info!("Loading trajectory from {:?}", &args.input);
    let frames = XyzFile::read_from_path(&args.input).map_err(|e| CliError::Trajectory {
        path: args.input.clone(),
        source: e,
    })?;
    if frames.is_empty() {
        warn!("Trajectory {:?} contains no frames.", &args.input);
    }

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let report = workflows::evaluate::run(&config, &frames, &reporter)?;

    let skipped: usize = report.frames.iter().map(|f| f.skipped_windows).sum();
    let degenerate: usize = report.frames.iter().map(|f| f.degenerate_windows).sum();
    info!(
        template = %report.template,
        windows = report.windows,
        frames = report.frames.len(),
        skipped_windows = skipped,
        degenerate_windows = degenerate,
        "Evaluation finished"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            report.write_csv(BufWriter::new(file))?;
            eprintln!(
                "✓ {} frame(s) x {} window(s) of '{}' written to: {}",
                report.frames.len(),
                report.windows,
                report.template,
                path.display()
            );
        }
        None => report.write_csv(std::io::stdout().lock())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use nalgebra::Point3;
    use ssrmsd::core::io::traits::Frame;
    use ssrmsd::core::templates::{LengthUnits, TemplateRegistry};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn evaluate_args(config: &Path, input: &Path, output: &Path) -> EvaluateArgs {
        let cli = Cli::parse_from([
            "ssrmsd",
            "evaluate",
            "-c",
            config.to_str().unwrap(),
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        match cli.command {
            Commands::Evaluate(args) => args,
            _ => panic!("Expected 'evaluate' subcommand"),
        }
    }

    fn reference_frame() -> Frame {
        let template = TemplateRegistry::builtin()
            .get("alpha-minus-trans", LengthUnits::angstrom())
            .unwrap();
        Frame {
            positions: template.coordinates().to_vec(),
            cell: None,
            comment: "reference".to_string(),
        }
    }

    #[test]
    fn run_writes_one_csv_row_per_frame() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("colvar.toml");
        fs::write(
            &config,
            r#"
            template = "alpha-minus-trans"
            length-unit = 0.1
            chains = [{ first = 0, last = 14 }]

            [switching]
            r0 = 0.8

            [[aggregations]]
            kind = "lessthan"

            [[aggregations]]
            kind = "lowest"
            "#,
        )
        .unwrap();

        let mut shifted = reference_frame();
        for p in &mut shifted.positions {
            *p = Point3::from(p.coords * 1.3);
        }
        let input = dir.path().join("traj.xyz");
        XyzFile::write_to_path(&[reference_frame(), shifted], &input).unwrap();
        let output = dir.path().join("values.csv");

        run(evaluate_args(&config, &input, &output), false).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "frame,lessthan,lowest");
        assert!(lines[1].starts_with("0,1.0000"));
        assert!(lines[2].starts_with("1,"));
    }

    #[test]
    fn run_reports_unreadable_trajectory() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("colvar.toml");
        fs::write(
            &config,
            "template = \"alpha-plus-cis\"\nchains = [{ first = 0, last = 14 }]\n",
        )
        .unwrap();
        let input = dir.path().join("broken.xyz");
        fs::write(&input, "15\ncomment\nC 0.0 0.0\n").unwrap();

        let err = run(
            evaluate_args(&config, &input, &dir.path().join("out.csv")),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Trajectory { .. }));
    }

    #[test]
    fn run_reports_chain_errors_from_the_engine() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("colvar.toml");
        fs::write(
            &config,
            "template = \"alpha-plus-cis\"\nchains = [[0, 1, 2, 3, 4]]\n",
        )
        .unwrap();
        let input = dir.path().join("traj.xyz");
        XyzFile::write_to_path(&[reference_frame()], &input).unwrap();

        let err = run(
            evaluate_args(&config, &input, &dir.path().join("out.csv")),
            false,
        )
        .unwrap_err();
        match err {
            CliError::Engine(e) => assert!(e.is_configuration()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
