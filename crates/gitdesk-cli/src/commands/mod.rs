//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

pub mod branch;
pub mod clone;
pub mod commit;
pub mod completions;
pub mod config;
pub mod init;
pub mod log;
pub mod merge;
pub mod remote;
pub mod stage;
pub mod status;
pub mod sync;
pub mod tag;
pub mod utils;

pub use utils::Globals;

/// gitdesk - stage, commit, branch and sync git repositories.
#[derive(Parser)]
#[command(name = "gitdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Repository to operate on.
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Answer yes to confirmation prompts.
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new repository.
    Init {
        /// Directory to initialize (defaults to --repo).
        path: Option<PathBuf>,

        /// Create a bare repository.
        #[arg(long)]
        bare: bool,
    },

    /// Clone a repository.
    Clone {
        /// URL (https, ssh, git, file or a local path ending in .git).
        url: String,

        /// Target directory (defaults to the repository name).
        target: Option<PathBuf>,
    },

    /// Show the working tree status.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Stage paths.
    Add {
        /// Paths relative to the repository root.
        #[arg(required_unless_present = "all")]
        paths: Vec<String>,

        /// Stage every untracked, modified and conflicted path.
        #[arg(short = 'A', long, conflicts_with = "paths")]
        all: bool,
    },

    /// Remove paths from the index, keeping working-tree changes.
    Unstage {
        #[arg(required_unless_present = "all")]
        paths: Vec<String>,

        /// Unstage everything.
        #[arg(short = 'A', long, conflicts_with = "paths")]
        all: bool,
    },

    /// Record staged changes.
    Commit(CommitArgs),

    /// List, create, switch, delete or rename branches.
    Branch {
        #[command(subcommand)]
        action: Option<BranchCommand>,
    },

    /// Merge a branch into the current one.
    Merge {
        /// Local or remote-tracking branch.
        branch: String,
    },

    /// Manage remotes.
    Remote {
        #[command(subcommand)]
        action: Option<RemoteCommand>,
    },

    /// Manage tags.
    Tag {
        #[command(subcommand)]
        action: Option<TagCommand>,
    },

    /// Push a branch to a remote.
    Push(NetworkArgs),

    /// Fetch and merge from a remote.
    Pull(NetworkArgs),

    /// Fetch from a remote.
    Fetch(NetworkArgs),

    /// Show recent commits on HEAD.
    Log {
        /// Number of commits (defaults to `general.history_limit`).
        #[arg(short = 'n', long = "max-count")]
        max_count: Option<usize>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Read or write repository configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct CommitArgs {
    /// Commit message.
    #[arg(short, long)]
    pub message: String,

    /// Author name for this commit.
    #[arg(long)]
    pub author_name: Option<String>,

    /// Author email for this commit.
    #[arg(long)]
    pub author_email: Option<String>,

    /// Replace the last commit instead of adding one.
    #[arg(long)]
    pub amend: bool,
}

#[derive(Args)]
pub struct NetworkArgs {
    /// Remote name (defaults to `general.default_remote`).
    pub remote: Option<String>,

    /// Branch (defaults to the current branch; fetch defaults to all).
    #[arg(short, long)]
    pub branch: Option<String>,
}

#[derive(Subcommand)]
pub enum BranchCommand {
    /// List local and remote-tracking branches.
    #[command(alias = "ls")]
    List,

    /// Create a branch at HEAD.
    Create {
        name: String,

        /// Switch to the new branch.
        #[arg(short, long)]
        checkout: bool,
    },

    /// Switch to a branch.
    Checkout {
        name: String,

        /// Carry local changes over when they do not conflict.
        #[arg(long, conflicts_with = "force")]
        keep: bool,

        /// Discard local changes.
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a local branch.
    #[command(alias = "rm")]
    Delete { name: String },

    /// Rename a local branch.
    Rename { old: String, new: String },
}

#[derive(Subcommand)]
pub enum RemoteCommand {
    /// List remotes.
    #[command(alias = "ls")]
    List,

    /// Add a remote.
    Add { name: String, url: String },

    /// Remove a remote.
    #[command(alias = "rm")]
    Remove { name: String },
}

#[derive(Subcommand)]
pub enum TagCommand {
    /// List tags.
    #[command(alias = "ls")]
    List,

    /// Create a tag; annotated when a message is given.
    Create {
        name: String,

        /// Tag message.
        #[arg(short, long)]
        message: Option<String>,

        /// Revision to tag (defaults to HEAD).
        target: Option<String>,
    },

    /// Delete a local tag.
    #[command(alias = "rm")]
    Delete { name: String },

    /// Push a tag, or all tags.
    Push {
        #[arg(required_unless_present = "all")]
        name: Option<String>,

        /// Push every tag.
        #[arg(long, conflicts_with = "name")]
        all: bool,

        /// Remote name (defaults to `general.default_remote`).
        #[arg(short, long)]
        remote: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print a value.
    Get { key: String },

    /// Set a value in the repository's local configuration.
    Set { key: String, value: String },
}

/// Run a parsed command.
pub fn dispatch(command: Commands, globals: &Globals) -> anyhow::Result<()> {
    match command {
        Commands::Init { path, bare } => init::run(globals, path, bare),
        Commands::Clone { url, target } => clone::run(globals, &url, target),
        Commands::Status { json } => status::run(globals, json),
        Commands::Add { paths, all } => stage::run_add(globals, &paths, all),
        Commands::Unstage { paths, all } => stage::run_unstage(globals, &paths, all),
        Commands::Commit(args) => commit::run(globals, &args),
        Commands::Branch { action } => branch::run(globals, action.unwrap_or(BranchCommand::List)),
        Commands::Merge { branch } => merge::run(globals, &branch),
        Commands::Remote { action } => remote::run(globals, action.unwrap_or(RemoteCommand::List)),
        Commands::Tag { action } => tag::run(globals, action.unwrap_or(TagCommand::List)),
        Commands::Push(args) => sync::run_push(globals, args),
        Commands::Pull(args) => sync::run_pull(globals, args),
        Commands::Fetch(args) => sync::run_fetch(globals, args),
        Commands::Log { max_count, json } => log::run(globals, max_count, json),
        Commands::Config { action } => config::run(globals, action),
        Commands::Completions { shell } => completions::run(shell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gitdesk", "status", "-C", "/tmp/x", "--json", "-vv"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.repo, PathBuf::from("/tmp/x"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }

    #[test]
    fn test_add_requires_paths_or_all() {
        assert!(Cli::try_parse_from(["gitdesk", "add"]).is_err());
        assert!(Cli::try_parse_from(["gitdesk", "add", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["gitdesk", "add", "a.txt", "--all"]).is_err());
    }

    #[test]
    fn test_checkout_modes_conflict() {
        assert!(
            Cli::try_parse_from(["gitdesk", "branch", "checkout", "x", "--keep", "--force"])
                .is_err()
        );
    }

    #[test]
    fn test_tag_push_requires_name_or_all() {
        assert!(Cli::try_parse_from(["gitdesk", "tag", "push"]).is_err());
        assert!(Cli::try_parse_from(["gitdesk", "tag", "push", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["gitdesk", "tag", "push", "v1.0"]).is_ok());
    }
}
