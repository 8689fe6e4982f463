use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "foldflat")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Flatten folders and GitHub trees into one zip of uniquely named files",
    long_about = "Flatten folders and GitHub trees into one zip of uniquely named files.\n\n\
Each file's path is folded into its name (hello/src/main.rs -> hello))src))main.rs),\n\
so a whole tree can be attached wherever only a flat list of files is accepted."
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Flatten local paths and/or GitHub trees into a zip
    Bundle(BundleArgs),

    /// Count files and total size of a GitHub tree without downloading it
    Estimate(EstimateArgs),

    /// Manage the stored GitHub token
    #[command(subcommand)]
    Token(TokenCommand),

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Bundle / Estimate
// ============================================================================

#[derive(Args)]
pub struct RemoteArgs {
    /// GitHub token for listing requests (raises the rate limit from 60 to 5000/hour)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Args)]
pub struct BundleArgs {
    /// Local files or directories to include
    pub paths: Vec<PathBuf>,

    /// GitHub URL to include (repeatable), e.g. https://github.com/owner/repo/tree/main/src
    #[arg(short, long = "repo", value_name = "URL")]
    pub repos: Vec<String>,

    /// String that replaces '/' in file names [default: from config, else "))"]
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Where to write the zip [default: from config, else flattened_files.zip]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the confirmation after estimating each repository
    #[arg(short, long)]
    pub yes: bool,

    /// Only print the original -> flattened name mapping
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(Args)]
pub struct EstimateArgs {
    /// GitHub URL, e.g. https://github.com/owner/repo/tree/main/src
    pub url: String,

    /// Print the estimate as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

// ============================================================================
// Token Commands
// ============================================================================

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Store a token in the config file (prompts when omitted)
    Set {
        /// Token value
        token: Option<String>,
    },

    /// Remove the stored token
    Clear,

    /// Show where the active token comes from
    Status {
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show effective settings
    Show,

    /// Change a setting
    Set {
        /// Setting to change
        #[arg(value_enum)]
        key: ConfigKey,

        /// New value
        value: String,
    },

    /// Print the config file location
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ConfigKey {
    Delimiter,
    Output,
}
