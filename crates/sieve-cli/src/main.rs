//! Sieve CLI
//!
//! Loads a filter list, checks URLs against it and inspects the result of a
//! build.

mod report;

use std::fs;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use sieve_compiler::{build_index_with_report, BuildReport, CompilerConfig, RuleCompiler};
use sieve_core::index::Index;
use sieve_core::matcher::Matcher;
use sieve_core::types::ElementTypes;
use sieve_core::url::{FastHostParser, HostnameParser, UrlHostParser};

use report::{type_catalog, MatchReport, StatsReport};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Config {
        path: String,
        source: serde_json::Error,
    },
    #[error("unknown request type: {0}")]
    UnknownType(String),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Adblock-Plus-style filter list checker")]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HostParserKind {
    /// WHATWG parser
    Url,
    /// Allocation-free slice scan
    Fast,
}

#[derive(clap::Args)]
struct ListArgs {
    /// Filter list file
    #[arg(short, long)]
    list: String,

    /// JSON compiler config
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a URL against a filter list
    Check {
        #[command(flatten)]
        list: ListArgs,

        /// URL to check
        url: String,

        /// Request type(s) of the URL
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        /// Hostname parser for domain= options
        #[arg(long, value_enum, default_value_t = HostParserKind::Url)]
        host_parser: HostParserKind,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show build statistics for a filter list
    Stats {
        #[command(flatten)]
        list: ListArgs,

        /// List every line that failed to compile
        #[arg(short, long)]
        errors: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List the supported type options
    Types {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            list,
            url,
            types,
            host_parser,
            json,
        } => cmd_check(&list, &url, &types, host_parser, json),
        Commands::Stats { list, errors, json } => cmd_stats(&list, errors, json),
        Commands::Types { json } => cmd_types(json),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&str>) -> Result<CompilerConfig, CliError> {
    let Some(path) = path else {
        return Ok(CompilerConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Config {
        path: path.to_string(),
        source,
    })
}

fn load_index(args: &ListArgs) -> Result<(Index, BuildReport), CliError> {
    let compiler = RuleCompiler::with_config(load_config(args.config.as_deref())?);
    log::debug!("compiler config: {:?}", compiler.config());
    let content = fs::read_to_string(&args.list).map_err(|source| CliError::Read {
        path: args.list.clone(),
        source,
    })?;

    let start = Instant::now();
    let (index, report) = build_index_with_report(&compiler, content.lines());
    log::debug!(
        "loaded '{}' in {:.1}ms",
        args.list,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok((index, report))
}

fn parse_types(types: &[String]) -> Result<Option<ElementTypes>, CliError> {
    if types.is_empty() {
        return Ok(None);
    }
    ElementTypes::from_ids(types.iter().map(String::as_str))
        .map(Some)
        .map_err(|id| CliError::UnknownType(id.to_string()))
}

fn cmd_check(
    list: &ListArgs,
    url: &str,
    types: &[String],
    host_parser: HostParserKind,
    json: bool,
) -> Result<(), CliError> {
    let types = parse_types(types)?;
    let (index, _) = load_index(list)?;

    let hosts: &dyn HostnameParser = match host_parser {
        HostParserKind::Url => &UrlHostParser,
        HostParserKind::Fast => &FastHostParser,
    };
    let matcher = Matcher::with_host_parser(&index, hosts);

    let result = matcher.query(url, types);
    let report = MatchReport::new(url, result.as_ref());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_text();
    }

    Ok(())
}

fn cmd_stats(list: &ListArgs, with_errors: bool, json: bool) -> Result<(), CliError> {
    let (_, build) = load_index(list)?;
    let report = StatsReport::new(&build, with_errors);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_text(&list.list);
    }

    Ok(())
}

fn cmd_types(json: bool) -> Result<(), CliError> {
    let catalog = type_catalog();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    for entry in &catalog {
        println!("{:<20} {}", entry.id.id(), entry.description);
    }

    Ok(())
}
