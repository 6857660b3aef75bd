//! aqltester: command-line AQL query tester
//!
//! Runs the query pipeline stage by stage against a store database: parse
//! the list form, optimize, translate to SQL, execute, and format the
//! labeled result rows. `--stop-at` halts after a stage and prints its
//! working data; `--debug` prints every stage on the way.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Read;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use aql::ResultSet;
use triplestore::Store;

#[derive(Parser)]
#[command(name = "aqltester", version, about = "Run AQL queries against a store database")]
struct Args {
    /// File containing the store database
    db_file: String,

    /// File containing the AQL query, or - for stdin
    input_file: String,

    /// Output only the result (for scripts)
    #[arg(long)]
    quiet: bool,

    /// Verbose output
    #[arg(long)]
    verbose: bool,

    /// Lots of debug output
    #[arg(long)]
    debug: bool,

    /// AQL parser front-end
    #[arg(long, value_enum, default_value = "list")]
    parser: ParserKind,

    /// Stop query processing after a specific stage and display its
    /// working data
    #[arg(long = "stop-at", value_enum, default_value = "result")]
    stop_at: Stage,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ParserKind {
    /// The S-expression list syntax
    List,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Stage {
    #[value(name = "parse_query")]
    ParseQuery,
    #[value(name = "optimized_aql")]
    OptimizedAql,
    #[value(name = "sql")]
    Sql,
    #[value(name = "raw_result")]
    RawResult,
    #[value(name = "result")]
    Result,
}

fn main() {
    let args = Args::parse();

    let max_level = if args.debug {
        tracing::Level::DEBUG
    } else if args.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(max_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Err(e) = run(&args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let ParserKind::List = args.parser;
    // Stage dumps are suppressed under --quiet; result rows always print.
    let announce = !args.quiet;
    let show = |stage: Stage| stage == args.stop_at || args.debug;

    let input = read_input(&args.input_file)?;
    let store = Store::open(&args.db_file)?;

    info!("parsing query");
    let mut query = aql::parse_query(&input)?;
    if show(Stage::ParseQuery) && announce {
        println!("AQL Query:");
        print!("{}", aql::print_query(&query));
    }
    if args.stop_at == Stage::ParseQuery {
        return Ok(());
    }

    info!("optimizing AQL");
    query = aql::optimize(query);
    if show(Stage::OptimizedAql) && announce {
        println!("AQL Query after optimization:");
        print!("{}", aql::print_query(&query));
    }
    if args.stop_at == Stage::OptimizedAql {
        return Ok(());
    }

    info!("generating SQL");
    let sql = aql::translate(&query)?;
    if show(Stage::Sql) && announce {
        println!("SQL query:\n{sql}");
    }
    if args.stop_at == Stage::Sql {
        return Ok(());
    }

    info!("executing SQL");
    let db = store.database();
    let mut cursor = db.cursor(&sql)?;
    if show(Stage::RawResult) && announce {
        let columns = cursor.column_names().to_vec();
        let mut row_number = 0;
        while let Some(row) = cursor.next_row()? {
            row_number += 1;
            println!("Row {row_number}");
            println!("******************");
            for (column, cell) in columns.iter().zip(&row) {
                println!("  {}: {}", column, cell.as_deref().unwrap_or("(null)"));
            }
            println!();
        }
        cursor.reset()?;
    }
    if args.stop_at == Stage::RawResult {
        return Ok(());
    }

    info!("formatting result");
    let mut results = ResultSet::new(&query, cursor)?;
    let header = results.header().to_vec();
    let mut row_number = 0;
    while results.has_next_row() {
        let row = results.next_row()?;
        row_number += 1;
        println!("Row {row_number}");
        println!("******************");
        for (label, cell) in header.iter().zip(&row) {
            println!("  {}: {}", label, cell.as_deref().unwrap_or("(null)"));
        }
        println!();
    }
    Ok(())
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("could not read standard input")?;
        Ok(input)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("could not open input file '{path}'"))
    }
}
