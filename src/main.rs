use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;

use netprof::{
    commands,
    fs_utils::SystemCopier,
    logging::{Verbosity, init_logging},
    paths::Paths,
    settings::Settings,
    ui::{ColorMode, Ui},
    units::select_units,
};

#[derive(Parser)]
#[command(name = "netprof")]
#[command(about = "Network profile switcher - snapshot and restore network configuration files")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Directory profiles are stored under (default: ~/.netprof/profiles)
    #[arg(long, global = true, value_name = "DIR")]
    location: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every step, including skipped files and hooks
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot the live configuration files into a profile
    Save {
        /// Name of the profile to write
        profile: String,

        /// Units to include (comma-separated, default: all)
        #[arg(long, value_delimiter = ',')]
        units: Option<Vec<String>>,
    },

    /// Restore the live configuration files from a profile
    Load {
        /// Name of the profile to restore
        profile: String,

        /// Units to include (comma-separated, default: all)
        #[arg(long, value_delimiter = ',')]
        units: Option<Vec<String>>,
    },

    /// Compare live files against a profile's snapshot
    Status {
        /// Name of the profile to inspect
        profile: String,
    },

    /// Show the last saved and loaded profiles
    Current,

    /// List the built-in units and their tracked files
    Units,

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ui = Ui::new(cli.color, cli.no_color);

    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    if let Err(e) = init_logging(verbosity, ui.color_enabled) {
        ui.err(format!("{:#}", e));
        return ExitCode::FAILURE;
    }

    match run(cli, &ui) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui.err(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, ui: &Ui) -> Result<()> {
    let mut paths = Paths::new()?;
    if let Some(location) = cli.location {
        paths = paths.with_location(location);
    }

    match cli.command {
        Commands::Save { profile, units } => {
            let settings = Settings::load(&paths.settings_file)?;
            let selected = select_units(units.as_deref())?;
            let units = commands::build_units(&paths, &settings, &selected)?;
            commands::save(&paths, &units, &SystemCopier::default(), &profile, ui)
        }
        Commands::Load { profile, units } => {
            let settings = Settings::load(&paths.settings_file)?;
            let selected = select_units(units.as_deref())?;
            let units = commands::build_units(&paths, &settings, &selected)?;
            let copier = SystemCopier::new(settings.sudo.clone());
            commands::load(&paths, &units, &copier, &profile, ui)
        }
        Commands::Status { profile } => {
            let settings = Settings::load(&paths.settings_file)?;
            let units = commands::build_units(&paths, &settings, &select_units(None)?)?;
            commands::status(&paths, &units, &profile, ui)
        }
        Commands::Current => commands::current(&paths, ui),
        Commands::Units => commands::units(&paths, ui),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "netprof", &mut std::io::stdout());
            Ok(())
        }
    }
}
