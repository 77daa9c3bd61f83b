mod cli;

use stackplan::authorizer::{self, AuthorizationRequest, Hs256Validator};
use stackplan::config::{self, EffectiveConfig};
use stackplan::config_documents::ConfigDocument;
use stackplan::naming::{self, RegionMode, TagSet};
use stackplan::plan::Planner;
use stackplan::policy::Policy;
use stackplan::topology::Topology;
use stackplan::validate::{self, ValidationReport};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("STACKPLAN_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Config(config_cli) => show_config(config_cli),
        cli::Command::Plan(plan_cli) => plan(plan_cli),
        cli::Command::ValidateTags(validate_cli) => validate_tags(validate_cli),
        cli::Command::Authorize(authorize_cli) => authorize(authorize_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn show_config(cli: cli::ConfigCommand) -> anyhow::Result<()> {
    let config = load_config(&cli.config)?;
    output(&cli.output, &config)
}

pub fn plan(cli: cli::PlanCommand) -> anyhow::Result<()> {
    let policy = load_policy(&cli.config)?;
    let config = load_config(&cli.config)?;

    let topology = match &cli.topology {
        Some(file_path) => Topology::load_file(file_path)?,
        None => Topology::reference(),
    };

    let region_mode = if cli.strict_regions {
        RegionMode::Strict
    } else {
        RegionMode::Fallback
    };

    let plan = Planner::new(&policy, created_date(&cli.date))
        .region_mode(region_mode)
        .plan(&config, topology.into_specs())?;

    output(&cli.output, &plan)
}

pub fn validate_tags(cli: cli::ValidateTagsCommand) -> anyhow::Result<()> {
    let policy = load_policy(&cli.config)?;

    let tags: TagSet = match &cli.tags_file {
        Some(file_path) => ConfigDocument::load_file(file_path)?
            .entries()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect(),
        None => {
            let config = load_config(&cli.config)?;
            naming::tag_set(
                &config,
                &config.environment(),
                created_date(&cli.date),
                &policy,
            )
        }
    };

    let report = ValidationReport::new(validate::validate(&policy, &tags));
    println!("{report}");

    anyhow::ensure!(
        report.is_compliant(),
        "{} tag violation(s)",
        report.violations.len()
    );
    Ok(())
}

pub fn authorize(cli: cli::AuthorizeCommand) -> anyhow::Result<()> {
    let validator = Hs256Validator::new(cli.secret.as_bytes());
    let request = AuthorizationRequest::new(cli.token, cli.method_arn);

    let decision = authorizer::authorize(&request, &validator)?;
    output(&cli.output, &decision)
}

fn load_policy(args: &cli::ConfigArgs) -> anyhow::Result<Policy> {
    Ok(match &args.policy {
        Some(file_path) => Policy::load_file(file_path)?,
        None => Policy::default(),
    })
}

/// Loads `defaults` and the selected environment's overrides
///
/// The selected environment becomes the `environment` key unless the override document sets
/// it.
fn load_config(args: &cli::ConfigArgs) -> anyhow::Result<EffectiveConfig> {
    let defaults = ConfigDocument::load_stem(&args.config_dir, "defaults")?;
    let mut overrides =
        ConfigDocument::load_stem(&args.config_dir.join("environments"), &args.environment)?;

    if overrides.get(config::ENVIRONMENT).is_none() {
        tracing::debug!(environment=%args.environment, "environment taken from selection");
        overrides.insert(config::ENVIRONMENT, args.environment.as_str());
    }

    Ok(config::resolve(&defaults, &overrides)?)
}

fn created_date(args: &cli::DateArgs) -> chrono::NaiveDate {
    args.created_date
        .unwrap_or_else(|| chrono::Utc::now().date_naive())
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), value)?;
            println!();
        }
    };

    Ok(())
}
