use clap::{Args, Parser, Subcommand};
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
    about = "LayerKit CLI - Analysis and input staging for layered-crystal simulation workflows: periodic bond statistics and scalar-field hotspot extraction.",
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

    /// Set the number of threads for parallel batch processing.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze bond lengths in positional structure files.
    Bonds(BondsArgs),
    /// Analyze volumetric scalar-field files for hotspots.
    Field(FieldArgs),
    /// Stage simulator run directories for layered structures.
    Stage(StageArgs),
}

/// Arguments for the `bonds` subcommand.
#[derive(Args, Debug)]
pub struct BondsArgs {
    /// Structure file, or a directory containing structure files.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// File-name pattern (single '*' wildcard) used when --input is a
    /// directory.
    #[arg(long, default_value = "*.vasp", value_name = "PATTERN")]
    pub pattern: String,

    /// Maximum bond length to consider, in Angstroms.
    #[arg(long, default_value_t = 3.0, value_name = "FLOAT")]
    pub max_distance: f64,

    /// Tolerance for merging near-duplicate bond lengths, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub merge_tolerance: Option<f64>,

    /// Fixed layer-split gap threshold in Angstroms (detected automatically
    /// from the largest vacuum gap when omitted).
    #[arg(long, value_name = "FLOAT")]
    pub gap_threshold: Option<f64>,

    /// Override the stacking axis (0, 1, or 2).
    #[arg(long, value_name = "AXIS")]
    pub stacking_axis: Option<usize>,

    /// Output file for the analysis summary.
    #[arg(short, long, default_value = "results.dat", value_name = "PATH")]
    pub output: PathBuf,

    /// Also export the deduplicated bond table as CSV.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

/// Arguments for the `field` subcommand.
#[derive(Args, Debug)]
pub struct FieldArgs {
    /// Single volumetric file to analyze.
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "directory",
        required_unless_present = "directory"
    )]
    pub file: Option<PathBuf>,

    /// Directory containing volumetric files matching the prefix.
    #[arg(long, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// File-name prefix used when scanning a directory.
    #[arg(long, default_value = "ELFCAR_", value_name = "PREFIX")]
    pub prefix: String,

    /// Number of hotspots to extract per field.
    #[arg(long, default_value_t = 5, value_name = "NUM")]
    pub top_n: usize,

    /// Minimum hotspot separation as a fractional distance.
    #[arg(long, default_value_t = 0.05, value_name = "FLOAT")]
    pub min_separation: f64,

    /// Override the stacking axis (0, 1, or 2).
    #[arg(long, value_name = "AXIS")]
    pub stacking_axis: Option<usize>,

    /// Output file for the metrics table when using --directory.
    #[arg(long, default_value = "elfcar_data.dat", value_name = "PATH")]
    pub data_output: PathBuf,

    /// Output file for the coordinate table when using --directory.
    #[arg(long, default_value = "elfcar_coords.dat", value_name = "PATH")]
    pub coords_output: PathBuf,

    /// Also export the ranked hotspot table as CSV.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

/// Arguments for the `stage` subcommand.
#[derive(Args, Debug)]
pub struct StageArgs {
    /// Positional file holding the prototype structure.
    #[arg(long, required = true, value_name = "PATH")]
    pub prototype: PathBuf,

    /// Chemical symbol of the staged element (e.g. Fe).
    #[arg(long, required = true, value_name = "SYMBOL")]
    pub element: String,

    /// Stacking motif: bcc or hcp.
    #[arg(long, required = true, value_name = "MOTIF")]
    pub motif: String,

    /// Layer counts to stage.
    #[arg(long, required = true, num_args = 1.., value_name = "N")]
    pub layers: Vec<usize>,

    /// Vacuum spacing added along the stacking axis, in Angstroms.
    #[arg(long, default_value_t = 25.0, value_name = "FLOAT")]
    pub vacuum: f64,

    /// Directory to create layer folders in.
    #[arg(long, default_value = ".", value_name = "PATH")]
    pub output: PathBuf,

    /// Path to the staging settings file in TOML format.
    #[arg(long, default_value = "layerkit.toml", value_name = "PATH")]
    pub settings: PathBuf,

    /// Submit the generated job scripts via the configured scheduler command.
    #[arg(long)]
    pub submit: bool,
}
