//! Tabula CLI - evaluate spreadsheet grids from CSV

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabula::prelude::*;
use tabula::MAX_COLS;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about = "Spreadsheet formula evaluation tool")]
struct Cli {
    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every cell of a headerless CSV grid and print the displayed values
    Eval {
        /// Input CSV file, one grid row per line
        input: PathBuf,

        /// CSV of `table,cell,value` rows answering cross-table references
        #[arg(short, long)]
        links: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use precedence normalisation and left-to-right reduction
        #[arg(long)]
        textual: bool,

        /// Evaluate every cell from scratch
        #[arg(long)]
        no_cache: bool,
    },

    /// Evaluate a single formula, e.g. `tabula expr "=1+2*3"`
    Expr {
        formula: String,

        /// Use precedence normalisation and left-to-right reduction
        #[arg(long)]
        textual: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Eval {
            input,
            links,
            output,
            textual,
            no_cache,
        } => {
            let options = engine_options(textual).with_cache(!no_cache);
            eval_grid(&input, links.as_deref(), output.as_deref(), options)
        }
        Commands::Expr { formula, textual } => eval_expr(&formula, engine_options(textual)),
    }
}

/// `RUST_LOG` wins; otherwise warnings, or everything from tabula with `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "tabula=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn engine_options(textual: bool) -> EngineOptions {
    let syntax = if textual {
        Syntax::Textual
    } else {
        Syntax::Grammar
    };
    EngineOptions::new().with_syntax(syntax)
}

fn eval_grid(
    input: &Path,
    links: Option<&Path>,
    output: Option<&Path>,
    options: EngineOptions,
) -> Result<()> {
    let grid = read_grid(input)?;
    let mut sheet = Sheet::from_grid(grid).with_options(options);
    if let Some(path) = links {
        sheet = sheet.with_links(read_links(path)?);
    }

    let rows = sheet.display_grid();
    debug!(stats = ?sheet.stats(), "evaluated grid");

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            write_rows(file, &rows)
        }
        None => write_rows(io::stdout().lock(), &rows),
    }
}

fn eval_expr(formula: &str, options: EngineOptions) -> Result<()> {
    let mut sheet = Sheet::new(1, 1)?.with_options(options);
    sheet.set("A1", formula)?;
    println!("{}", sheet.display("A1")?);
    Ok(())
}

/// Read a headerless CSV into a grid sized to its widest row
fn read_grid(path: &Path) -> Result<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Invalid CSV at row {}", line + 1))?;
        records.push(record);
    }

    let cols = records.iter().map(|r| r.len()).max().unwrap_or(0).max(1);
    if cols > MAX_COLS as usize {
        bail!(
            "'{}' has {} columns; at most {} are supported",
            path.display(),
            cols,
            MAX_COLS
        );
    }
    let rows = records.len().max(1);

    let mut grid = Grid::new(rows as u32, cols as u16)?;
    for (row, record) in records.iter().enumerate() {
        for (col, field) in record.iter().enumerate() {
            grid.set_at(row as u32, col as u16, field)?;
        }
    }
    Ok(grid)
}

/// Read `table,cell,value` rows
fn read_links(path: &Path) -> Result<StaticLinks> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::Fields)
        .from_path(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;

    let mut links = StaticLinks::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Invalid CSV at row {}", line + 1))?;
        let (Some(table), Some(cell), Some(value)) = (record.get(0), record.get(1), record.get(2))
        else {
            bail!("Row {} of '{}' needs table,cell,value", line + 1, path.display());
        };
        let cell = CellId::parse(cell)
            .with_context(|| format!("Row {} of '{}'", line + 1, path.display()))?;
        links.insert(table, cell, value);
    }
    Ok(links)
}

fn write_rows<W: Write>(out: W, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_grid_pads_short_rows() {
        let file = csv_file("5,10\n\"=A1+B1\"\n");
        let grid = read_grid(file.path()).unwrap();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.get("A2").unwrap(), "=A1+B1");
        assert_eq!(grid.get("B2").unwrap(), "");
    }

    #[test]
    fn test_read_grid_rejects_wide_input() {
        let file = csv_file(&vec!["1"; 27].join(","));
        assert!(read_grid(file.path()).is_err());
    }

    #[test]
    fn test_read_links() {
        let file = csv_file("Sales, B2, 42\nCosts,A1,#####\n");
        let links = read_links(file.path()).unwrap();
        assert_eq!(links.len(), 2);

        let bad = csv_file("Sales,b2,1\n");
        assert!(read_links(bad.path()).is_err());
    }

    #[test]
    fn test_eval_grid_writes_displayed_values() {
        let input = csv_file("5,10,=sum(A1;B1)\n=Sales:A1*2,=(1,\n");
        let links = csv_file("Sales,A1,4\n");
        let output = NamedTempFile::new().unwrap();

        eval_grid(
            input.path(),
            Some(links.path()),
            Some(output.path()),
            EngineOptions::default(),
        )
        .unwrap();

        let written = std::fs::read_to_string(output.path()).unwrap();
        assert_eq!(written, "5,10,15\n8,=(1,\n");
    }
}
