use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use restyle::Command;

#[derive(Parser, Debug)]
#[command(version, about = "Edit the style of an HTML page element by element", long_about = None)]
pub struct Args {
    #[arg(value_name = "HTML", help = "The HTML page to edit")]
    pub html: PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        default_value = ".restyle/storage.json",
        help = "The file that keeps rules and options between runs"
    )]
    pub storage: PathBuf,

    #[arg(
        long,
        conflicts_with = "storage",
        help = "Start from an empty session and keep nothing"
    )]
    pub ephemeral: bool,

    #[arg(
        long,
        value_name = "PATH",
        help = "Write the page with the injected stylesheet to this file"
    )]
    pub output_html: Option<PathBuf>,

    #[arg(
        long,
        short,
        default_value_t = VerbosityLevel::Quiet,
        value_name = "LEVEL",
        help = "Set the verbosity level"
    )]
    pub verbose: VerbosityLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the generated selector of every element matching QUERY
    Selector { query: String },
    /// Select the first element matching QUERY and print its toolbox values
    Inspect { query: String },
    /// Select the first element matching QUERY and set properties on it
    Apply {
        query: String,
        #[arg(
            required = true,
            value_name = "PROPERTY=VALUE",
            value_parser = parse_declaration
        )]
        declarations: Vec<(String, String)>,
    },
    /// Run a script of editor commands from a file or stdin
    Run { script: Option<PathBuf> },
    /// Export all rules as a style sheet
    Export {
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print the injected style sheet
    Stylesheet,
    /// Remove the rules that match this page
    ClearPage,
    /// Remove every rule
    ClearAll,
    /// Print the number of selectors and declarations
    Stats,
    /// Print the DOM tree
    Tree(TreeArgs),
    /// Show or change the persisted options
    Option {
        #[arg(long, value_name = "BOOL")]
        force_important: Option<bool>,
        #[arg(long, value_name = "BOOL")]
        debug: Option<bool>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct TreeArgs {
    #[arg(long, help = "Do not clip lines to the terminal width")]
    pub full: bool,
}

fn parse_declaration(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((property, value)) if !property.trim().is_empty() => {
            Ok((property.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("`{}` is not PROPERTY=VALUE", s)),
    }
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Selector { query } => Command::Selector { query },
            Commands::Inspect { query } => Command::Inspect { query },
            Commands::Apply {
                query,
                declarations,
            } => Command::Apply {
                query,
                declarations,
            },
            Commands::Run { script } => Command::Run { script },
            Commands::Export { output } => Command::Export { output },
            Commands::Stylesheet => Command::Stylesheet,
            Commands::ClearPage => Command::ClearPage,
            Commands::ClearAll => Command::ClearAll,
            Commands::Stats => Command::Stats,
            Commands::Tree(args) => Command::Tree { full: args.full },
            Commands::Option {
                force_important,
                debug,
            } => Command::Option {
                force_important,
                debug,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VerbosityLevel {
    Quiet,
    Normal,
    Verbose,
}

impl std::fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            VerbosityLevel::Quiet => write!(f, "quiet"),
            VerbosityLevel::Normal => write!(f, "normal"),
            VerbosityLevel::Verbose => write!(f, "verbose"),
        }
    }
}

impl From<VerbosityLevel> for LevelFilter {
    fn from(level: VerbosityLevel) -> Self {
        match level {
            VerbosityLevel::Quiet => LevelFilter::Warn,
            VerbosityLevel::Normal => LevelFilter::Info,
            VerbosityLevel::Verbose => LevelFilter::Debug,
        }
    }
}
