//! Clap derive structures for the `neotalk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use neotalk_core::{ComponentCategory, StorageKind};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// neotalk -- inspect dashboards and extension widgets of a NeoTalk backend
#[derive(Debug, Parser)]
#[command(
    name = "neotalk",
    version,
    about = "Manage NeoTalk dashboards and widgets from the command line",
    long_about = "Browse the widget catalog, inspect and prune stored dashboards,\n\
        and follow extension install/remove events from a NeoTalk backend.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "NEOTALK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 's', env = "NEOTALK_SERVER", global = true)]
    pub server: Option<String>,

    /// Bearer token
    #[arg(long, env = "NEOTALK_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NEOTALK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NEOTALK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NEOTALK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Dashboard storage backend: local, api, or hybrid
    #[arg(long, env = "NEOTALK_STORAGE", global = true)]
    pub storage: Option<StorageKind>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the widget catalog
    #[command(alias = "comp", alias = "c")]
    Components(ComponentsArgs),

    /// Inspect and manage stored dashboards
    #[command(alias = "dash", alias = "d")]
    Dashboards(DashboardsArgs),

    /// Sync and watch extension-provided widgets
    #[command(alias = "ext", alias = "x")]
    Extensions(ExtensionsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPONENTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ComponentsArgs {
    #[command(subcommand)]
    pub command: ComponentsCommand,
}

/// Catalog filters shared by `list` and `groups`.
#[derive(Debug, Args)]
pub struct CatalogFilterArgs {
    /// Only this category
    #[arg(long)]
    pub category: Option<ComponentCategory>,

    /// Case-insensitive match on name, description, or type
    #[arg(long, short = 'f')]
    pub search: Option<String>,

    /// Only widgets that bind to data
    #[arg(long)]
    pub data_bound: bool,

    /// Include widgets registered by backend extensions
    #[arg(long, short = 'e')]
    pub extensions: bool,
}

#[derive(Debug, Subcommand)]
pub enum ComponentsCommand {
    /// List widget types
    #[command(alias = "ls")]
    List(CatalogFilterArgs),

    /// List widget types grouped by category
    Groups(CatalogFilterArgs),

    /// Show metadata for one widget type
    Show {
        /// Widget type key (e.g. "value-card")
        component_type: String,

        /// Look the type up among extension widgets too
        #[arg(long, short = 'e')]
        extensions: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DASHBOARDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DashboardsArgs {
    #[command(subcommand)]
    pub command: DashboardsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DashboardsCommand {
    /// List stored dashboards
    #[command(alias = "ls")]
    List,

    /// Show one dashboard and its widgets
    Show {
        /// Dashboard id
        id: String,

        /// Check the layout against widget metadata
        #[arg(long)]
        validate: bool,
    },

    /// Delete a dashboard
    #[command(alias = "rm")]
    Delete {
        /// Dashboard id
        id: String,
    },

    /// Show or set the locally remembered current dashboard
    Current {
        /// Dashboard id to remember
        #[arg(long, conflicts_with = "clear")]
        set: Option<String>,

        /// Forget the current dashboard
        #[arg(long)]
        clear: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EXTENSIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ExtensionsArgs {
    #[command(subcommand)]
    pub command: ExtensionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ExtensionsCommand {
    /// Fetch the extension widget catalog and list what registered
    Sync,

    /// Follow extension lifecycle events until interrupted
    Watch {
        /// Open this dashboard so removed widgets are pruned from it
        #[arg(long)]
        dashboard: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
