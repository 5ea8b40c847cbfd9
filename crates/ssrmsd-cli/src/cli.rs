use clap::{Args, Parser, Subcommand};
use ssrmsd::core::geometry::alignment::AlignmentMode;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "ssrmsd - secondary-structure RMSD collective variables for backbone chains.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to evaluate windows.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the collective variable on every frame of an XYZ trajectory.
    Evaluate(EvaluateArgs),
    /// Inspect the built-in reference motifs and template files.
    Templates(TemplatesArgs),
}

/// Arguments for the `evaluate` subcommand.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path to the input trajectory (multi-frame XYZ).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the CSV output. Written to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the reference template (built-in motif, keyword or template-file entry).
    #[arg(short, long, value_name = "NAME")]
    pub template: Option<String>,

    /// Override the TOML file additional templates are read from.
    #[arg(long, value_name = "PATH")]
    pub template_file: Option<PathBuf>,

    /// Override the alignment mode ('optimal', 'simple' or 'drmsd').
    #[arg(short, long, value_name = "MODE")]
    pub alignment: Option<AlignmentMode>,

    /// Override the switching function scale r0.
    #[arg(long, value_name = "FLOAT")]
    pub r0: Option<f64>,

    /// Disable periodic boundary conditions even if frames carry a cell.
    #[arg(long)]
    pub no_pbc: bool,
}

/// Arguments for the `templates` subcommand.
#[derive(Args, Debug)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommands,

    /// Also read templates from this TOML file.
    #[arg(long, global = true, value_name = "PATH")]
    pub template_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum TemplatesCommands {
    /// List every available template.
    List,
    /// Print the coordinates of one template in Ångström.
    Show {
        /// Template name or keyword.
        #[arg(required = true)]
        name: String,
    },
}
