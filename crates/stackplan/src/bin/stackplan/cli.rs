//! stackplan cli interface

use chrono::NaiveDate;
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
    /// This is equivalent to running { cd <directory>; stackplan ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the effective configuration
    Config(ConfigCommand),

    /// Print the deployment plan
    Plan(PlanCommand),

    /// Check tags against the tag policy
    ///
    /// Validates the tags derived from the configuration unless a tag file is given.
    /// Exits non-zero on any violation.
    ValidateTags(ValidateTagsCommand),

    /// Run the boundary authorizer against a token
    Authorize(AuthorizeCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[clap(flatten)]
    pub config: ConfigArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct PlanCommand {
    #[clap(flatten)]
    pub config: ConfigArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Topology document (hcl, yaml or json)
    ///
    /// Uses the reference topology (layer -> compute -> edge-proxy) if omitted
    #[clap(short = 't', long = "topology")]
    pub topology: Option<PathBuf>,

    #[clap(flatten)]
    pub date: DateArgs,

    /// Reject regions without a region code instead of using their prefix
    #[clap(long = "strict-regions")]
    pub strict_regions: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateTagsCommand {
    #[clap(flatten)]
    pub config: ConfigArgs,

    /// Validate the tags in this document instead (hcl, yaml or json)
    #[clap(long = "tags-file")]
    pub tags_file: Option<PathBuf>,

    #[clap(flatten)]
    pub date: DateArgs,
}

#[derive(Parser, Debug)]
pub struct AuthorizeCommand {
    /// Authorization token, optionally prefixed with "Bearer "
    #[clap(long = "token", default_value = "")]
    pub token: String,

    /// Resource the caller wants to invoke
    #[clap(long = "method-arn")]
    pub method_arn: String,

    /// Shared secret of HS256 signed tokens
    #[clap(long = "secret", env = "JWT_SECRET", hide_env_values = true)]
    pub secret: String,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Directory holding `defaults.*` and `environments/<environment>.*`
    #[clap(long = "config-dir", default_value = "config")]
    pub config_dir: PathBuf,

    /// Environment to load overrides for
    #[clap(short = 'e', long = "environment", env = "ENVIRONMENT", default_value = "dev")]
    pub environment: String,

    /// Policy document replacing the built-in tag and region policy
    #[clap(long = "policy")]
    pub policy: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct DateArgs {
    /// Value of the CreatedDate tag (YYYY-MM-DD), defaults to today (UTC)
    #[clap(long = "created-date")]
    pub created_date: Option<NaiveDate>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
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
