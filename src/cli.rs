use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::advisor::DEFAULT_CONTEXT_CHARS;

#[derive(Debug, Parser)]
#[command(
    name = "aaoifi-kb",
    about = "Searchable AAOIFI standards context for an Islamic finance advisor"
)]
pub struct Cli {
    /// Directory holding AAOIFI-Standards.txt / .pdf (default: current dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the context block the advisor would receive for a question
    Context(ContextArgs),
    /// Show ranked chunks for a query
    Search(SearchArgs),
    /// Print a question enriched with standards context
    Prompt(PromptArgs),
    /// Convert the standards PDF into the cached text file
    Convert(ConvertArgs),
    /// Load the corpus and report its state
    Status(StatusArgs),
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Context --

#[derive(Debug, Parser)]
pub struct ContextArgs {
    /// The user's question or topic
    pub query: String,

    /// Character budget for the context
    #[arg(long, default_value_t = DEFAULT_CONTEXT_CHARS)]
    pub max_chars: usize,
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return
    #[arg(short = 'n', long, default_value = "5")]
    pub count: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Prompt --

#[derive(Debug, Parser)]
pub struct PromptArgs {
    /// The user's question
    pub question: String,

    /// Character budget for the context
    #[arg(long, default_value_t = DEFAULT_CONTEXT_CHARS)]
    pub max_chars: usize,
}

// -- Convert --

#[derive(Debug, Parser)]
pub struct ConvertArgs {
    /// Source PDF (default: AAOIFI-Standards.pdf in the data dir)
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// Output text file (default: AAOIFI-Standards.txt in the data dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only convert the first N pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "aaoifi-kb",
            &mut std::io::stdout(),
        );
    }
}
