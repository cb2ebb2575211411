use anyhow::Result;
use clap::{Parser, Subcommand};
use tagfix::commands::{
    cache_command, history_command, init_project_command, parse_address_arg, segments_command,
    status_command, verify_content_command, verify_index_command, CacheOperation,
};

/// Rebuild and verify the tag-reference cache of a disassembly database.
///
/// This CLI is a thin wrapper around `tagfix-core` (exposed in code as `tagfix_core`).
/// Diagnostic lines go to stderr; summaries go to stdout.
#[derive(Parser, Debug)]
#[command(
    name = "tagfix",
    version,
    about = "Rebuild and verify the tag-reference cache of a disassembly database",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new tagfix project at the given root.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,

        /// Snapshot path (JSON or YAML), relative to the root unless absolute.
        #[arg(long)]
        snapshot: Option<String>,
    },

    /// Show the project, snapshot and cache summary.
    Status {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Erase the cache and rebuild the index and every function cache.
    Everything {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Rebuild every function cache and the globals index without erasing first.
    All {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Rebuild the cache of the function containing an address.
    Contents {
        #[arg(long, default_value = ".")]
        root: String,

        /// Address inside the function (0x-prefixed hex or decimal).
        #[arg(long)]
        function: String,
    },

    /// Rebuild the globals index.
    Globals {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Add `__name__` references for every custom name.
    Customnames {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Add references for every extra comment line.
    Extracomments {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Remove every function cache and the globals index.
    Erase {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Check that every function cache is keyed by a live function.
    VerifyIndex {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Recount and compare function caches (all functions when omitted).
    VerifyContent {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        function: Option<String>,
    },

    /// List segments or select one (`current`, `#handle`, address or name).
    Segments {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        select: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List recorded cache operations.
    History {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::InitProject { root, name, snapshot } => {
            init_project_command(&root, name, snapshot)?
        }
        Command::Status { root, json } => status_command(&root, json)?,
        Command::Everything { root } => cache_command(&root, CacheOperation::Everything)?,
        Command::All { root } => cache_command(&root, CacheOperation::All)?,
        Command::Contents { root, function } => {
            let ea = parse_address_arg(&function)?;
            cache_command(&root, CacheOperation::Contents(ea))?
        }
        Command::Globals { root } => cache_command(&root, CacheOperation::Globals)?,
        Command::Customnames { root } => cache_command(&root, CacheOperation::CustomNames)?,
        Command::Extracomments { root } => cache_command(&root, CacheOperation::ExtraComments)?,
        Command::Erase { root } => cache_command(&root, CacheOperation::Erase)?,
        Command::VerifyIndex { root } => verify_index_command(&root)?,
        Command::VerifyContent { root, function } => {
            verify_content_command(&root, function.as_deref())?
        }
        Command::Segments { root, select, json } => {
            segments_command(&root, select.as_deref(), json)?
        }
        Command::History { root, json } => history_command(&root, json)?,
    }

    Ok(())
}
