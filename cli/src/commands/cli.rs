use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use taskforge_core::api::ViewMode;

#[derive(Parser, Debug)]
#[command(name = "taskforge", version, about = "Plan and run role-based task graphs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of `~/.taskforge/config.toml` / `./config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the planner for a new plan. Replaces the current plan and clears artifacts.
    Plan(PlanArgs),
    /// Execute ready tasks until the plan finishes, pauses or stalls.
    Run(RunArgs),
    /// Show the current plan and its progress.
    Status(StatusArgs),
    /// Check the dependency graph for missing tasks, unknown roles and cycles.
    Validate,
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    Role(RoleCommand),
    /// Print the artifact file tree.
    Artifacts(ArtifactsArgs),
    /// Write artifact files to a directory.
    Export(ExportArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub goal: String,

    /// Initial context file. Can be specified multiple times.
    #[arg(long = "file", action = clap::ArgAction::Append)]
    pub files: Vec<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Delay between tasks; overrides `scheduler.pacing_ms`.
    #[arg(long)]
    pub pacing_ms: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StatusArgs {
    /// Print the plan as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    /// Append a pending task.
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long = "dep", action = clap::ArgAction::Append)]
        deps: Vec<String>,
    },
    /// Remove a task. Tasks depending on it keep the dangling id.
    Delete { id: String },
    /// Change fields of an existing task.
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long, conflicts_with = "clear_agent")]
        agent: Option<String>,
        #[arg(long, default_value_t = false)]
        clear_agent: bool,
        /// Replace the dependency list (comma separated).
        #[arg(long, value_delimiter = ',', conflicts_with = "no_deps")]
        deps: Option<Vec<String>>,
        #[arg(long, default_value_t = false)]
        no_deps: bool,
    },
    /// Add the dependency if missing, remove it if present.
    Dep { task: String, dep: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RoleCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        purpose: String,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ArtifactsArgs {
    #[arg(long, default_value_t = ViewMode::Combined)]
    pub view: ViewMode,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value_t = ViewMode::Combined)]
    pub view: ViewMode,

    #[arg(long)]
    pub out: PathBuf,
}
