use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use quill_builder::OperationType;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Select a configuration profile
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Set proxy
    #[arg(required = false, long, short = 'P', global = true)]
    pub proxy: Option<String>,

    /// Set request headers, as `Name: value`
    #[arg(required = false, long, short = 'H', global = true)]
    pub header: Vec<String>,

    /// Set user agent
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble an operation file and print the request body
    #[command(arg_required_else_help = true)]
    Render {
        /// Operation file (JSON or TOML)
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Override the operation kind
        #[arg(required = false, short, long)]
        kind: Option<OperationType>,

        /// Override the operation name; an empty name leaves it anonymous
        #[arg(required = false, short, long)]
        name: Option<String>,
    },

    /// Assemble an operation file and execute it against the endpoint
    #[command(arg_required_else_help = true)]
    #[clap(name = "exec", visible_alias = "x")]
    Exec {
        /// Operation file (JSON or TOML)
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Override the operation kind
        #[arg(required = false, short, long)]
        kind: Option<OperationType>,

        /// Override the operation name
        #[arg(required = false, short, long)]
        name: Option<String>,
    },

    /// Execute a literal GraphQL document
    #[command(arg_required_else_help = true)]
    Raw {
        /// File holding the document text
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        document: PathBuf,

        /// Variables as a JSON object
        #[arg(required = false, long)]
        variables: Option<String>,
    },

    /// Generate default config
    #[clap(name = "defconfig")]
    DefConfig,
}
