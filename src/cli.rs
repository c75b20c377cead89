use std::path::PathBuf;

use clap::{Parser, Subcommand};
use editor_projects::config::Mode;

#[derive(Parser)]
struct RescanArgs {
    /// Rerun every active source, ignoring cache ages
    #[arg(short = 'f', long)]
    force: bool,

    /// Don't show a progress spinner or summary
    #[arg(short = 'q', long)]
    quiet: bool,
}

#[derive(Parser)]
struct ListArgs {
    /// Print the cached projects as a JSON array
    #[arg(long)]
    json: bool,

    /// Never start a background rescan
    #[arg(long)]
    no_rescan: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run one scan cycle and update the cache
    Rescan(RescanArgs),

    /// Print the cached projects, starting a background rescan if one is due
    List(ListArgs),

    /// Print the resolved folders of a cached project
    Folders {
        /// Path of the project file
        path: PathBuf,
    },

    /// Show configuration, source and cache state
    Status,
}

#[derive(Parser)]
#[command(name = "editor-projects")]
#[command(about = "Find Sublime Text and VS Code project files and cache them for quick access")]
pub(crate) struct Cli {
    /// Which editor's project files to look for
    #[arg(short = 'm', long, value_enum, env = "EDITOR_PROJECTS_MODE", global = true)]
    mode: Option<Mode>,

    /// Show debug output on stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// The command to run, flattened for `main`.
pub(crate) enum Action {
    Rescan {
        force: bool,
        quiet: bool,
        spinner: bool,
    },
    List { json: bool, rescan: bool },
    Folders(PathBuf),
    Status,
}

impl Cli {
    pub(crate) const fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub(crate) const fn verbose(&self) -> bool {
        self.verbose
    }

    pub(crate) fn action(&self) -> Action {
        match &self.command {
            // Debug logs and a spinner would fight over stderr
            Command::Rescan(args) => Action::Rescan {
                force: args.force,
                quiet: args.quiet,
                spinner: !args.quiet && !self.verbose,
            },
            Command::List(args) => Action::List {
                json: args.json,
                rescan: !args.no_rescan,
            },
            Command::Folders { path } => Action::Folders(path.clone()),
            Command::Status => Action::Status,
        }
    }
}
