//! adfl cli interface

use adflocal::materialize::Window;
use adflocal::value::{parse_timestamp, Timestamp};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; adfl ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a `$$` expression for a window
    #[command(alias = "eval")]
    Evaluate(EvaluateCommand),

    /// Resolve an object (pipeline, dataset or linked service) for a window
    ///
    /// Reads a single json document from stdin unless any other source is provided (via --input-*)
    Materialize(MaterializeCommand),

    /// Resolve an activity with its input/output datasets and linked services for a window
    Activity(ActivityCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct EvaluateCommand {
    #[clap(flatten)]
    pub window: WindowArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Expression to evaluate, e.g. "$$Text.Format('{0:yyyy}', SliceStart)"
    pub expression: String,
}

#[derive(Parser, Debug)]
pub struct MaterializeCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub window: WindowArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Name of the object to resolve
    ///
    /// May be omitted when exactly one object was loaded
    pub object: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ActivityCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub window: WindowArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Name of the pipeline
    pub pipeline: String,

    /// Name of the activity inside the pipeline
    pub activity: String,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load files from work directory
    #[clap(short = 'w', long = "input-workdir")]
    pub workdir: bool,

    /// Load a file
    #[clap(short = 'f', long = "input-file")]
    pub files: Vec<PathBuf>,

    /// Load files from given directory
    #[clap(short = 'd', long = "input-dir")]
    pub directories: Vec<PathBuf>,

    /// Apply the named configuration (file stem of a loaded configuration document)
    #[clap(short = 'c', long = "config")]
    pub config: Option<String>,
}

/// Dates accept RFC 3339, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD` (the latter two in utc)
#[derive(Parser, Debug)]
pub struct WindowArgs {
    #[clap(long = "slice-start", value_parser = parse_timestamp)]
    pub slice_start: Timestamp,

    #[clap(long = "slice-end", value_parser = parse_timestamp)]
    pub slice_end: Timestamp,

    /// Defaults to --slice-start
    #[clap(long = "window-start", value_parser = parse_timestamp)]
    pub window_start: Option<Timestamp>,

    /// Defaults to --slice-end
    #[clap(long = "window-end", value_parser = parse_timestamp)]
    pub window_end: Option<Timestamp>,
}

impl WindowArgs {
    pub fn window(&self) -> Window {
        Window::new(self.slice_start, self.slice_end).with_window(self.window_start, self.window_end)
    }
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Loaded documents, before any configuration is applied
    Documents,
    /// Objects with the configuration applied
    Resolved,
}
