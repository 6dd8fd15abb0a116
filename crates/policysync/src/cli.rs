//! Clap derive structures for the `policysync` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// policysync -- reconcile controller SmartGroups and DCF rules
#[derive(Debug, Parser)]
#[command(
    name = "policysync",
    version,
    about = "Keep controller SmartGroups and DCF rule lists in sync",
    long_about = "Reconciles policy objects on a cloud-networking controller against\n\
        their sources of truth: published IP ranges, DNS, explicit CIDR edits,\n\
        and caller-supplied DCF rules. Also recommends egress groups from logs.",
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
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "POLICYSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL or host (overrides profile)
    #[arg(long, short = 'c', env = "POLICYSYNC_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Controller username (overrides profile)
    #[arg(long, short = 'u', env = "POLICYSYNC_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "POLICYSYNC_OUTPUT",
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

    /// Emit logs as JSON lines on stderr (for function runtimes and log shippers)
    #[arg(long, env = "POLICYSYNC_LOG_JSON", global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "POLICYSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "POLICYSYNC_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
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

#[derive(Debug, Clone, ValueEnum)]
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
    /// Mirror published GitHub meta-IP ranges into SmartGroups
    #[command(alias = "gh")]
    Github(GithubArgs),

    /// Refresh fqdn_* SmartGroups from DNS
    Fqdn(FqdnArgs),

    /// Inspect and edit SmartGroups
    #[command(alias = "sg")]
    Groups(GroupsArgs),

    /// Inspect and edit the DCF rule list
    Rules(RulesArgs),

    /// Run an event handler locally and print its response
    Invoke(InvokeArgs),

    /// Recommend egress WebGroups/SmartGroups from DCF logs
    Egress(EgressArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GITHUB / FQDN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GithubArgs {
    #[command(subcommand)]
    pub command: GithubCommand,
}

#[derive(Debug, Subcommand)]
pub enum GithubCommand {
    /// Create or update external_github_<endpoint> groups
    Sync {
        /// Meta-IP keys to mirror (overrides profile `github_endpoints`).
        /// Accepts a JSON array or comma-separated names.
        #[arg(long, short = 'e', env = "POLICYSYNC_GITHUB_ENDPOINTS")]
        endpoints: Option<String>,

        /// Meta-IP API base URL
        #[arg(long)]
        api_url: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct FqdnArgs {
    #[command(subcommand)]
    pub command: FqdnCommand,
}

#[derive(Debug, Subcommand)]
pub enum FqdnCommand {
    /// Rewrite every fqdn_* group from its host's A records
    Sync {
        /// Extra hosts to create groups for (repeatable)
        #[arg(long = "fqdn", short = 'f')]
        fqdns: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GROUPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CidrOp {
    Add,
    Delete,
}

impl CidrOp {
    pub fn as_action(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List SmartGroups
    #[command(alias = "ls")]
    List {
        /// Only groups whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Add or remove CIDRs on a group addressed by UUID
    Update {
        /// SmartGroup UUID
        uuid: String,

        /// Set operation
        #[arg(long, short = 'a', value_enum)]
        action: CidrOp,

        /// CIDRs (IPv6 entries are ignored)
        #[arg(required = true, num_args = 1..)]
        cidrs: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RULES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// Show the current rule list in order
    #[command(alias = "ls")]
    List,

    /// Append a rule read from a JSON file
    Add {
        /// Rule JSON (`-` for stdin)
        #[arg(long = "from-file", short = 'F')]
        from_file: PathBuf,
    },

    /// Remove the rule with this UUID (no-op if absent)
    #[command(alias = "rm")]
    Delete { uuid: String },

    /// Replace a rule; the replacement moves to the end of the list
    Replace {
        /// Rule JSON (`-` for stdin)
        #[arg(long = "from-file", short = 'F')]
        from_file: PathBuf,

        /// UUID to replace when the rule JSON has none
        #[arg(long)]
        uuid: Option<String>,
    },

    /// Overwrite the whole list with a JSON array or {"policies": [...]}
    ReplaceList {
        #[arg(long = "from-file", short = 'F')]
        from_file: PathBuf,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INVOKE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InvokeArgs {
    #[command(subcommand)]
    pub command: InvokeCommand,
}

#[derive(Debug, Subcommand)]
pub enum InvokeCommand {
    /// SmartGroup CIDR event: {smartgroup_uuid, domains, action}
    Smartgroup {
        /// Event JSON file (`-` for stdin)
        #[arg(long, short = 'e', default_value = "-")]
        event: PathBuf,
    },

    /// Rule-list event: {action, rule?, rule_uuid?, policy_list?}
    Rules {
        /// Event JSON file (`-` for stdin)
        #[arg(long, short = 'e', default_value = "-")]
        event: PathBuf,
    },

    /// Scheduled meta-IP sync
    Github {
        /// Optional event; `github_endpoints` in it overrides the profile
        #[arg(long, short = 'e')]
        event: Option<PathBuf>,
    },

    /// Scheduled FQDN sync
    Fqdn {
        /// Optional event; `fqdns` in it adds hosts to create
        #[arg(long, short = 'e')]
        event: Option<PathBuf>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EGRESS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EgressArgs {
    #[command(subcommand)]
    pub command: EgressCommand,
}

#[derive(Debug, Subcommand)]
pub enum EgressCommand {
    /// Group observed egress destinations by port/protocol
    Recommend {
        /// Analyse only rules with this priority (0 = all internet-bound rules)
        #[arg(long, default_value = "0")]
        priority: i64,

        /// Look-back window in days
        #[arg(long, short = 'd', default_value = "1")]
        days: u32,

        /// CoPilot URL or host (overrides profile)
        #[arg(long, env = "POLICYSYNC_COPILOT")]
        copilot: Option<String>,
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

    /// Set a configuration value on the active profile
    Set {
        /// Config key (e.g., "controller", "github_endpoints")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
