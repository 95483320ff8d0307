use crate::config::{ConfigLoader, LexbenchConfig};
use anyhow::{Result, bail};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show,
    /// Show configuration file paths
    Path,
    /// Write the default configuration to the user config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs, config: LexbenchConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&config),
        ConfigCommands::Path => show_paths(),
        ConfigCommands::Init { force } => init_config(force),
    }
}

fn show_config(config: &LexbenchConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{}", toml_str);
    Ok(())
}

fn show_paths() -> Result<()> {
    println!("User config:    {:?}", ConfigLoader::user_config_path());
    println!("Project config: {:?}", ConfigLoader::project_config_path());
    println!("Data dir:       {:?}", lexbench_paths::data_dir());
    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let Some(path) = ConfigLoader::user_config_path() else {
        bail!("Could not determine user config path");
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    ConfigLoader::save_to_path(&LexbenchConfig::default(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
