use aaoifi_kb::{
    DataDir,
    KnowledgeBase,
    KnowledgeConfig,
    KnowledgeStatus,
    advisor,
    cli::{self, Cli, Command},
    convert,
    error,
    mcp,
    search::{self, SearchHit},
};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "AAOIFI_KB_LOG";

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var(LOG_ENV_VAR) {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let data_dir = || DataDir::resolve(cli.data_dir.as_deref());

    match &cli.command {
        Command::Context(args) => {
            let kb = open_knowledge_base(&data_dir()?)?;
            let context = kb.get_relevant_context(&args.query, args.max_chars);
            if context.is_empty() {
                eprintln!("No relevant context.");
            } else {
                println!("{context}");
            }
        }
        Command::Search(args) => {
            cmd_search(&data_dir()?, args)?;
        }
        Command::Prompt(args) => {
            let kb = open_knowledge_base(&data_dir()?)?;
            println!(
                "{}",
                advisor::build_user_message(&kb, &args.question, args.max_chars)
            );
        }
        Command::Convert(args) => {
            cmd_convert(&data_dir()?, args)?;
        }
        Command::Status(args) => {
            cmd_status(&data_dir()?, args.json)?;
        }
        Command::Mcp => {
            let kb = open_knowledge_base(&data_dir()?)?;
            mcp::run_mcp(kb)?;
        }
        Command::Completions(args) => {
            args.generate();
        }
    }

    Ok(())
}

fn open_knowledge_base(data_dir: &DataDir) -> error::Result<KnowledgeBase> {
    let config = KnowledgeConfig::resolve(data_dir)?;
    Ok(KnowledgeBase::new(config))
}

fn cmd_search(data_dir: &DataDir, args: &cli::SearchArgs) -> error::Result<()> {
    let kb = open_knowledge_base(data_dir)?;
    let ranked = kb.search(&args.query, args.count)?;
    let hits = SearchHit::from_ranked(&ranked);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        search::format_human(&hits);
    }
    Ok(())
}

fn cmd_convert(data_dir: &DataDir, args: &cli::ConvertArgs) -> error::Result<()> {
    let pdf = args.pdf.clone().unwrap_or_else(|| data_dir.pdf_path());
    let output = args.output.clone().unwrap_or_else(|| data_dir.text_path());

    let report = convert::convert_pdf_to_text(&pdf, &output, args.max_pages)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        convert::format_human(&report);
    }
    Ok(())
}

fn cmd_status(data_dir: &DataDir, json: bool) -> error::Result<()> {
    let kb = open_knowledge_base(data_dir)?;
    // Status is reported after a load attempt; failures are part of it.
    if kb.is_enabled()
        && let Err(e) = kb.corpus()
    {
        debug!(error = %e, "knowledge base unavailable");
    }
    let status = kb.status();
    let config = kb.config();

    if json {
        let value = serde_json::json!({
            "dataDir": data_dir.root(),
            "textFile": config.text_path,
            "pdfFile": config.pdf_path,
            "chunkSize": config.chunking.chunk_size(),
            "chunkOverlap": config.chunking.overlap(),
            "maxPages": config.max_pages,
            "status": status,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Data directory: {}", data_dir.root().display());
    println!(
        "Text file:      {} ({})",
        config.text_path.display(),
        presence(&config.text_path)
    );
    println!(
        "PDF file:       {} ({})",
        config.pdf_path.display(),
        presence(&config.pdf_path)
    );
    println!(
        "Chunking:       {} chars, {} overlap",
        config.chunking.chunk_size(),
        config.chunking.overlap()
    );

    match status {
        KnowledgeStatus::Disabled => {
            println!("Knowledge base: disabled");
        }
        KnowledgeStatus::Uninitialized => {
            println!("Knowledge base: not loaded");
        }
        KnowledgeStatus::Loaded { chunks, chars } => {
            println!("Knowledge base: loaded, {chunks} chunks, {chars} chars");
        }
        KnowledgeStatus::LoadFailed { reason } => {
            println!("Knowledge base: unavailable ({reason})");
        }
    }
    Ok(())
}

fn presence(path: &std::path::Path) -> &'static str {
    if path.is_file() { "present" } else { "missing" }
}
