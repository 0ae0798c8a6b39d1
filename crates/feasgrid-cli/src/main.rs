//! feasgrid CLI - evaluate formulas and feasibility grids

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use feasgrid::prelude::*;
use feasgrid::{cell_display_value, evaluate_formula, DependencyGraph};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "feasgrid")]
#[command(author, version, about = "Evaluate formulas in feasibility grids")]
struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single formula and print its display value
    Eval {
        /// Formula text, with or without the leading '='
        formula: String,

        /// Grid file the formula's references resolve against
        #[arg(short, long)]
        grid: Option<PathBuf>,
    },

    /// Print the display value of one cell
    Cell {
        /// Grid file (JSON)
        grid: PathBuf,

        /// Cell address, e.g. B7
        address: String,
    },

    /// Calculate every cell of a grid
    Calc {
        /// Grid file (JSON)
        grid: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what a cell reads and which formulas an edit to it affects
    Deps {
        /// Grid file (JSON)
        grid: PathBuf,

        /// Cell address, e.g. B2
        address: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One "address value" line per cell
    Table,
    /// The grid's used range as CSV rows
    Csv,
    /// A JSON array of { cell, value } objects
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Eval { formula, grid } => eval(&formula, grid.as_deref()),
        Commands::Cell { grid, address } => show_cell(&grid, &address),
        Commands::Calc {
            grid,
            format,
            output,
        } => calc(&grid, format, output.as_deref()),
        Commands::Deps { grid, address } => show_deps(&grid, &address),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn load_grid(path: &Path) -> Result<Grid> {
    Grid::open(path).with_context(|| format!("Failed to open '{}'", path.display()))
}

fn parse_cell(address: &str) -> Result<CellAddress> {
    CellAddress::parse(address).with_context(|| format!("Invalid cell address '{}'", address))
}

fn eval(formula: &str, grid: Option<&Path>) -> Result<()> {
    let grid = match grid {
        Some(path) => load_grid(path)?,
        None => Grid::new(),
    };

    println!("{}", evaluate_formula(formula, &grid).display());
    Ok(())
}

fn show_cell(grid: &Path, address: &str) -> Result<()> {
    let grid = load_grid(grid)?;
    let addr = parse_cell(address)?;

    println!("{}", cell_display_value(addr, &grid).display());
    Ok(())
}

fn calc(grid_path: &Path, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let grid = load_grid(grid_path)?;
    let calc = grid.calculate();

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        OutputFormat::Table => write_table(&calc, &mut out)?,
        OutputFormat::Csv => write_csv(&grid, &calc, &mut out)?,
        OutputFormat::Json => write_json(&calc, &mut out)?,
    }
    out.flush().context("Failed to write output")?;

    let stats = &calc.stats;
    eprintln!(
        "Calculated {} formulas ({} errors, {} circular)",
        stats.cells_calculated, stats.errors, stats.circular_references
    );
    if let Some(path) = output {
        eprintln!("Wrote {} cells to '{}'", calc.values.len(), path.display());
    }

    Ok(())
}

fn write_table<W: Write>(calc: &Calculation, out: &mut W) -> Result<()> {
    let width = calc
        .values
        .keys()
        .map(|addr| addr.to_a1_string().len())
        .max()
        .unwrap_or(0);

    for (addr, value) in &calc.values {
        writeln!(out, "{:<width$}  {}", addr.to_a1_string(), value.display())
            .context("Failed to write output")?;
    }
    Ok(())
}

/// Write the used range row by row, one CSV record per grid row
fn write_csv<W: Write>(grid: &Grid, calc: &Calculation, out: W) -> Result<()> {
    let Some(range) = grid.used_range() else {
        eprintln!("Warning: Grid appears to be empty");
        return Ok(());
    };

    let mut writer = csv::Writer::from_writer(out);
    for row in 0..=range.end().row {
        let record: Vec<String> = (0..=range.end().col)
            .map(|col| calc.display(CellAddress::new(row, col)))
            .collect();
        writer.write_record(&record).context("Failed to write CSV")?;
    }
    writer.flush().context("Failed to write CSV")?;
    Ok(())
}

fn write_json<W: Write>(calc: &Calculation, out: &mut W) -> Result<()> {
    let cells: Vec<_> = calc
        .values
        .iter()
        .map(|(addr, value)| {
            serde_json::json!({
                "cell": addr.to_a1_string(),
                "value": value.display(),
            })
        })
        .collect();

    serde_json::to_writer_pretty(&mut *out, &cells).context("Failed to write JSON")?;
    writeln!(out).context("Failed to write output")?;
    Ok(())
}

fn show_deps(grid: &Path, address: &str) -> Result<()> {
    let grid = load_grid(grid)?;
    let addr = parse_cell(address)?;
    let graph = DependencyGraph::from_grid(&grid);

    println!("Cell: {}", addr);
    println!("Reads: {}", join(&graph.precedents(addr)));
    println!("Read by: {}", join(&graph.dependents(addr)));
    println!("Affected by an edit: {}", join(&graph.affected_by(&[addr])));
    if graph.has_circular_reference(addr) {
        println!("Circular: yes");
    }

    Ok(())
}

fn join(cells: &[CellAddress]) -> String {
    if cells.is_empty() {
        return "-".to_string();
    }
    cells
        .iter()
        .map(CellAddress::to_a1_string)
        .collect::<Vec<_>>()
        .join(", ")
}
