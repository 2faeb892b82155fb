use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use querykit_core::{Config, ConfigError, Diagnostic, DiagnosticCode, Severity};
use querykit_sql::{
    join_sql_conditions, lowercase, replace_table_aliases, split_columns, Condition, SelectBuilder,
    WhereClauseExtractor,
};

/// QueryKit - SQL fragment tooling for analytics query layers
#[derive(Parser)]
#[command(name = "querykit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: querykit.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lowercase SQL keywords
    Lowercase {
        /// SQL text (read from stdin if omitted)
        sql: Option<String>,
    },

    /// Split a newline-delimited column list, one expression per output line
    SplitColumns {
        /// Column blob (read from stdin if omitted)
        text: Option<String>,
    },

    /// Point column references in a condition at the %s alias placeholder
    RewriteAliases {
        /// Condition text (read from stdin if omitted)
        condition: Option<String>,

        /// Known column names, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// List the columns used in a statement's WHERE clause
    WhereColumns {
        /// SQL statement (read from stdin if omitted)
        sql: Option<String>,

        /// Print a JSON array instead of one column per line
        #[arg(long)]
        json: bool,
    },

    /// Join condition fragments into a single WHERE clause
    Join {
        /// Condition fragments
        fragments: Vec<String>,
    },

    /// Assemble a SELECT statement
    Select {
        /// Base table
        #[arg(long)]
        from: String,

        /// Base table alias
        #[arg(long, default_value = "t")]
        alias: String,

        /// Output column (repeatable)
        #[arg(short = 'C', long = "column", required = true)]
        columns: Vec<String>,

        /// WHERE condition (repeatable, joined with AND)
        #[arg(short = 'w', long = "where")]
        conditions: Vec<String>,

        /// ORDER BY text, e.g. "created_at desc nulls last"
        #[arg(short, long)]
        order_by: Option<String>,

        /// Row limit, capped at the configured max_limit
        #[arg(short, long)]
        limit: Option<u64>,

        /// Row offset
        #[arg(long)]
        offset: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let config = match load_config(cli.config.as_deref(), cli.verbose) {
        Ok(config) => config,
        Err(e) => {
            print_diagnostic(&e.to_diagnostic());
            std::process::exit(1);
        }
    };

    if cli.verbose {
        eprintln!("{} dialect: {:?}", "Using".cyan(), config.dialect);
    }

    match cli.command {
        Commands::Lowercase { sql } => {
            println!("{}", lowercase(&read_input(sql)?));
            Ok(())
        }
        Commands::SplitColumns { text } => {
            for column in split_columns(&read_input(text)?) {
                println!("{}", column);
            }
            Ok(())
        }
        Commands::RewriteAliases { condition, columns } => {
            println!("{}", replace_table_aliases(&read_input(condition)?, &columns));
            Ok(())
        }
        Commands::WhereColumns { sql, json } => where_columns_command(&config, &read_input(sql)?, json, cli.verbose),
        Commands::Join { fragments } => {
            println!("{}", join_sql_conditions(&fragments));
            Ok(())
        }
        Commands::Select {
            from,
            alias,
            columns,
            conditions,
            order_by,
            limit,
            offset,
        } => {
            let request = SelectRequest {
                from,
                alias,
                columns,
                conditions,
                order_by,
                limit,
                offset,
            };
            select_command(&config, &request)
        }
    }
}

/// Load the config named on the command line, else `querykit.toml` in the
/// working directory, else defaults
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config, ConfigError> {
    let config = if let Some(config_path) = path {
        Config::from_file(config_path)?
    } else if Path::new("querykit.toml").exists() {
        Config::from_file(Path::new("querykit.toml"))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    Ok(config)
}

/// Use the argument if given, otherwise read all of stdin
fn read_input(arg: Option<String>) -> Result<String> {
    match arg {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn where_columns_command(config: &Config, sql: &str, json: bool, verbose: bool) -> Result<()> {
    let extractor = WhereClauseExtractor::with_dialect(config.dialect);

    let columns = match extractor.extract(sql) {
        Ok(columns) => columns,
        Err(e) => {
            print_diagnostic(&e.to_diagnostic());
            std::process::exit(1);
        }
    };

    if verbose {
        eprintln!("{} {} columns", "Found".cyan(), columns.len());
    }

    if json {
        println!("{}", serde_json::to_string(&columns)?);
    } else {
        for column in &columns {
            println!("{}", column);
        }
    }

    Ok(())
}

struct SelectRequest {
    from: String,
    alias: String,
    columns: Vec<String>,
    conditions: Vec<String>,
    order_by: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

fn build_select(config: &Config, request: &SelectRequest) -> SelectBuilder {
    let mut builder = SelectBuilder::new();

    for column in &request.columns {
        builder.add_column(column.as_str());
    }
    builder.from(request.from.as_str(), request.alias.as_str());

    if !request.conditions.is_empty() {
        builder.where_(Condition::and(request.conditions.iter().map(|c| Condition::raw(c.as_str()))));
    }
    if let Some(order_by) = &request.order_by {
        builder.order_by_raw(order_by);
    }
    if let Some(limit) = request.limit {
        builder.limit_with_max(limit, config.max_limit);
    }
    if let Some(offset) = request.offset {
        builder.offset(offset);
    }

    builder
}

/// Warning for a requested limit above the configured maximum
fn limit_warning(config: &Config, request: &SelectRequest) -> Option<Diagnostic> {
    let limit = request.limit.filter(|limit| *limit > config.max_limit)?;

    Some(Diagnostic::new(
        DiagnosticCode::LimitCapped,
        Severity::Warn,
        format!("limit {} capped at max_limit {}", limit, config.max_limit),
    ))
}

fn select_command(config: &Config, request: &SelectRequest) -> Result<()> {
    if let Some(warning) = limit_warning(config, request) {
        print_diagnostic(&warning);
    }

    match build_select(config, request).build() {
        Ok(sql) => {
            println!("{}", sql);
            Ok(())
        }
        Err(e) => {
            print_diagnostic(&e.to_diagnostic());
            std::process::exit(1);
        }
    }
}

/// Print a diagnostic to stderr
fn print_diagnostic(diag: &Diagnostic) {
    let severity_str = match diag.severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warn => "WARN".yellow().bold(),
    };

    eprintln!("[{}] {}: {}", severity_str, diag.code, diag.message);

    if let Some(loc) = &diag.location {
        eprintln!("    at {}", loc);
    }
}
