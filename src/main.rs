mod config;
mod contexts;
mod env_file;
mod openocd;
mod project;
mod render;
mod templates;
mod workspace;

use crate::config::{CONFIG_FILE_NAME, ProjectConfig};
use crate::project::{
    build_make_info, load_makefile_info, migrate_config, scan_build_files, write_file,
    write_project_files,
};
use crate::workspace::{FsWorkspace, Workspace};
use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::Confirm;
use std::io::IsTerminal;
use std::path::PathBuf;
use stm32_makefile::Tools;
use tracing::{Level, debug, info};

#[derive(Parser)]
#[command(version, about = "Generate and read STM32 Makefiles")]
struct Cli {
    /// 项目根目录
    #[arg(short = 'C', long, default_value = ".")]
    directory: PathBuf,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the Makefile, openocd.cfg and toolchain environment file
    Generate {
        /// 配置文件地址
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: String,
        /// Overrides every other toolchain setting
        #[arg(long)]
        toolchain_path: Option<String>,
        #[arg(long)]
        force: bool,
    },
    /// Print the settings found in an existing Makefile
    Extract {
        makefile: String,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Turn an existing Makefile into a project configuration file
    Migrate {
        makefile: String,
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        output: String,
        #[arg(long)]
        force: bool,
    },
    /// Classify source files matching glob patterns
    Scan {
        #[arg(default_values_t = ["Core/**/*".to_string(), "Drivers/**/*".to_string()])]
        patterns: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let ws = FsWorkspace::new(&cli.directory);
    debug!("Workspace root {}", ws.root().display());

    match cli.command {
        Command::Generate {
            config,
            toolchain_path,
            force,
        } => {
            let config = load_config(&ws, &config)?;
            let mut make_info = build_make_info(&ws, &config)?;
            make_info.tools.merge(Tools {
                arm_toolchain_path: toolchain_path,
                ..Tools::default()
            });
            if make_info.target.is_empty() {
                bail!(
                    "No target name, set build.target in {} or point cubemx_makefile at a CubeMX Makefile",
                    CONFIG_FILE_NAME
                );
            }
            write_project_files(&ws, &make_info, &config, force, &mut confirm_overwrite)?;
        }
        Command::Extract { makefile, format } => {
            let config = load_config(&ws, CONFIG_FILE_NAME)?;
            let info = load_makefile_info(&ws, &makefile, &config.family_table()?)?;
            let text = match format {
                Format::Json => serde_json::to_string_pretty(&info)?,
                Format::Toml => toml::to_string_pretty(&info)?,
            };
            println!("{}", text);
        }
        Command::Migrate {
            makefile,
            output,
            force,
        } => {
            let config = load_config(&ws, CONFIG_FILE_NAME)?;
            let info = load_makefile_info(&ws, &makefile, &config.family_table()?)?;
            let text = migrate_config(info).to_toml()?;
            write_file(&ws, &output, &text, force, &mut confirm_overwrite)?;
        }
        Command::Scan { patterns } => {
            let report = scan_build_files(&ws, &patterns)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Missing config file means all defaults.
fn load_config(ws: &FsWorkspace, path: &str) -> Result<ProjectConfig> {
    match ws.read_text(path)? {
        Some(text) => {
            info!("Using configuration {}", path);
            ProjectConfig::from_toml(&text)
        }
        None => {
            debug!("No {}, using defaults", path);
            Ok(ProjectConfig::default())
        }
    }
}

fn confirm_overwrite(path: &str) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }
    let answer = Confirm::new()
        .with_prompt(format!("{} has different content, overwrite it?", path))
        .default(false)
        .interact()?;
    Ok(answer)
}
