use crate::config::{
    Config, ENV_CONFIG_DIR, config_file_path, ensure_sample_config, resolve_config_dir_with,
};
use crate::logging::init_logging;
use crate::session_stats::command::StatsArgs;
use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Configuration directory for rangelog (default: platform config dir)
    #[arg(short = 'C', long = "config-dir", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Print the resolved configuration directory path and exit
    #[arg(long)]
    pub print_config_dir_path: bool,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter, sort and summarize exported session stats
    Stats(StatsArgs),
    /// Inspect or initialize the configuration file
    Config(ConfigArgs),
}

#[derive(Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the path of the configuration file
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Write a commented sample configuration if none exists
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let env_override = env::var(ENV_CONFIG_DIR).ok();
    let config_dir = resolve_config_dir_with(cli.config_dir.as_deref(), env_override.as_deref())?;

    if cli.print_config_dir_path {
        println!("{}", config_dir.display());
        return Ok(());
    }

    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load(&config_dir)?;
    init_logging(cli.verbose, config.log_level.as_deref());
    tracing::debug!(config_dir = %config_dir.display(), "resolved config directory");

    match command {
        Commands::Stats(args) => crate::session_stats::command::run(args, &config),
        Commands::Config(args) => handle_config_command(args, &config_dir, &config),
    }
}

fn handle_config_command(args: &ConfigArgs, config_dir: &Path, config: &Config) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file_path(config_dir).display());
        }
        ConfigCommands::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Init => match ensure_sample_config(config_dir)? {
            Some(path) => println!("{}", t!("messages.config_written", path = path.display())),
            None => println!(
                "{}",
                t!(
                    "messages.config_exists",
                    path = config_file_path(config_dir).display()
                )
            ),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stats_with_filters() {
        let cli = Cli::try_parse_from([
            "rangelog",
            "stats",
            "--input",
            "sessions.json",
            "--distance",
            "300-600",
            "--effort",
            "true",
            "--sort",
            "best",
            "--view",
            "sessions",
        ])
        .unwrap();

        let Some(Commands::Stats(args)) = cli.command else {
            panic!("expected stats command");
        };
        assert_eq!(args.input, PathBuf::from("sessions.json"));
        assert_eq!(
            args.stats.filter.distance,
            Some(crate::session_stats::DistanceFilter::Medium)
        );
        assert_eq!(
            args.stats.filter.effort,
            Some(crate::session_stats::EffortFilter::Effort)
        );
        assert_eq!(
            args.stats.filter.sort_order,
            Some(crate::session_stats::SortOrder::Best)
        );
    }

    #[test]
    fn rejects_unknown_distance_bucket() {
        assert!(Cli::try_parse_from(["rangelog", "stats", "--distance", "1000+"]).is_err());
    }

    #[test]
    fn verbose_is_counted_globally() {
        let cli = Cli::try_parse_from(["rangelog", "stats", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn config_subcommands_parse() {
        let cli = Cli::try_parse_from(["rangelog", "-C", "/tmp/x", "config", "init"]).unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config(ConfigArgs {
                command: ConfigCommands::Init
            }))
        ));
    }
}
