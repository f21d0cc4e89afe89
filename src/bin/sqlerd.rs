//! sqlerd: draw SQL joins as Mermaid ER diagrams
//!
//! # Usage
//!
//! ```bash
//! # Render a diagram
//! sqlerd "SELECT * FROM orders o JOIN customers c ON o.customer_id = c.customer_id"
//!
//! # From a file, as JSON
//! sqlerd --file report.sql --format json
//!
//! # From stdin
//! cat report.sql | sqlerd
//! ```

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlerd::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlerd")]
#[command(version)]
#[command(about = "Draw the joins of a SQL query as a Mermaid ER diagram", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlerd 'SELECT * FROM orders o JOIN customers c ON o.customer_id = c.customer_id'
    sqlerd --file report.sql --format summary
    sqlerd explain --file report.sql")]
struct Cli {
    /// SQL text to analyze (read from stdin when omitted)
    sql: Option<String>,

    /// Read the SQL from a file
    #[arg(short, long, conflicts_with = "sql")]
    file: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Config file path
    #[arg(short, long, env = "SQLERD_CONFIG")]
    config: Option<PathBuf>,

    /// Log extraction details to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a query was read: aliases, tables, edges and the diagram
    Explain {
        /// SQL text to explain (read from stdin when omitted)
        sql: Option<String>,

        /// Read the SQL from a file
        #[arg(short, long, conflicts_with = "sql")]
        file: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.log.level);

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    match &cli.command {
        Some(Commands::Explain { sql, file }) => {
            let sql = read_sql(sql.as_deref(), file.as_deref(), &config)?;
            explain_query(&sql);
        }
        None => {
            let sql = read_sql(cli.sql.as_deref(), cli.file.as_deref(), &config)?;
            let format = cli.format.unwrap_or(config.output.format);
            print_output(&sql, format)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins, then `--verbose`, then the config file.
fn init_logging(verbose: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sqlerd=debug")
        } else {
            EnvFilter::new(level)
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_sql(arg: Option<&str>, file: Option<&Path>, config: &Config) -> Result<String> {
    let sql = match (arg, file) {
        (Some(sql), _) => sql.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => {
            if io::stdin().is_terminal() {
                eprintln!("{}", "Reading SQL from stdin (Ctrl+D to finish)...".dimmed());
            }
            io::read_to_string(io::stdin()).context("Failed to read stdin")?
        }
    };

    config.check_input(&sql)?;
    Ok(sql)
}

fn print_output(sql: &str, format: OutputFormat) -> Result<()> {
    let extraction = analyze(sql);

    match format {
        OutputFormat::Mermaid => {
            let diagram = extraction.to_mermaid();
            if diagram.is_empty() {
                report_nothing_to_draw();
            } else {
                print!("{}", diagram);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&extraction)?);
        }
        OutputFormat::Summary => {
            println!("{}", serde_json::to_string_pretty(&extraction.summary())?);
        }
    }

    Ok(())
}

fn report_nothing_to_draw() {
    eprintln!("{}", "No FROM clause found, nothing to draw.".dimmed());
}

fn explain_query(sql: &str) {
    println!("{}", "sqlerd Query Explanation".cyan().bold());
    println!();

    let normalized = normalize(sql);
    println!("{} {}", "Normalized:".dimmed(), normalized.as_str().trim().yellow());
    println!();

    let Some(graph) = extract(&normalized).into_graph() else {
        report_nothing_to_draw();
        return;
    };

    println!("{}", "Join Graph:".green().bold());
    println!(
        "  {} {} {}",
        "Root:".dimmed(),
        graph.root_table.white(),
        format!("(as {})", graph.root_alias).dimmed()
    );

    println!("  {}", "Tables:".dimmed());
    for table in graph.tables.iter() {
        println!("    • {}", table.white());
    }

    println!("  {}", "Aliases:".dimmed());
    for (alias, table) in graph.aliases.iter().filter(|(a, t)| a != t) {
        println!("    {} → {}", alias.cyan(), table.white());
    }

    if graph.edges.is_empty() {
        println!("  {}", "(no joins)".dimmed());
    } else {
        println!("  {}", "Edges:".dimmed());
        for edge in &graph.edges {
            println!(
                "    {} → {} : {}  {}",
                edge.source.white(),
                edge.target.white(),
                edge.label.cyan(),
                format!("[{}]", edge.predicate).dimmed()
            );
        }
    }

    println!();
    println!("{}", "Mermaid:".green().bold());
    print!("{}", graph.to_mermaid());
}
