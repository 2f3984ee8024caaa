//! CLI entry point for `db2model`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use db2model::error::InspectError;
use db2model::generator::inspector::{InspectOptions, ModelInspector};
use db2model::introspection::snapshot::Catalog;
use db2model::output::formatter;
use db2model::parser::sql_parser::{self, SqlDialect};

#[derive(Parser)]
#[command(
    name = "db2model",
    version,
    about = "Introspect a database schema and output a Django model module"
)]
struct Cli {
    /// Catalog input: a JSON snapshot or a SQL file of CREATE TABLE statements
    input: PathBuf,

    /// Input format (snapshot or sql); inferred from the file extension when omitted
    #[arg(long)]
    format: Option<InputFormat>,

    /// SQL dialect used to parse DDL input
    #[arg(long, default_value = "postgresql")]
    dialect: SqlDialect,

    /// Always emit the `db_column` field argument
    #[arg(short = 'c', long)]
    force_db_column: bool,

    /// Module the generated file imports `models` from
    #[arg(long, default_value = "django.db")]
    db_module: String,

    /// Write `<input stem>_models.py` into this directory instead of stdout
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print verbose diagnostics
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Snapshot,
    Sql,
}

impl InputFormat {
    fn infer(path: &Path) -> Self {
        if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
            InputFormat::Snapshot
        } else {
            InputFormat::Sql
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Snapshot => write!(f, "snapshot"),
            InputFormat::Sql => write!(f, "sql"),
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snapshot" | "json" => Ok(InputFormat::Snapshot),
            "sql" | "ddl" => Ok(InputFormat::Sql),
            _ => Err(format!("Invalid input format: {s}")),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        let code = match e {
            InspectError::NotSupported => 1,
            _ => 2,
        };
        process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<(), InspectError> {
    let content =
        std::fs::read_to_string(&cli.input).map_err(|e| InspectError::io(&cli.input, e))?;

    let format = cli.format.unwrap_or_else(|| InputFormat::infer(&cli.input));
    let catalog = match format {
        InputFormat::Snapshot => Catalog::from_json(&content)?,
        InputFormat::Sql => sql_parser::parse_schema(&content, cli.dialect)?,
    };
    log::info!(
        "loaded {} tables from {} ({format})",
        catalog.tables.len(),
        cli.input.display()
    );

    let options = InspectOptions {
        force_db_column: cli.force_db_column,
        db_module: cli.db_module.clone(),
    };
    let inspector = ModelInspector::new(&catalog, catalog.type_resolver(), options);
    let module = inspector.render()?;

    let output_path = cli
        .output_dir
        .as_ref()
        .map(|dir| dir.join(formatter::default_module_name(&cli.input)));
    formatter::write_output(output_path.as_deref(), &module)
}
