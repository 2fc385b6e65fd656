//! polmap - zone statistics and clusters for a polarization catalog
//!
//! Usage:
//!   polmap zones <catalog.csv> [--zone-size <deg>] [--sigma-limit <n>] [--output <file>]
//!   polmap clusters <catalog.csv> [--max-separation <deg>] [--min-neighbors <n>] [--summary <file>]
//!
//! Reads a delimited catalog, normalises longitudes, applies the cutouts from
//! `--config` and writes `;`-delimited tables to a file or stdout.

use clap::{Parser, Subcommand};
use log::info;
use polarization_map::{
    analyze_clusters, compute_zone_statistics,
    catalog::{normalize_longitudes, ClusteredRow},
    read_catalog_csv, write_table_csv, AnalysisConfig, AngleMode, CatalogColumns, Measurement,
    Result,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "polmap")]
#[command(about = "Zone statistics and density clusters for polarization catalogs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with zone, cluster and cutout settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read GLON/GLAT/Pol/PA/e_Pol/e_PA columns instead of the canonical names
    #[arg(long, global = true)]
    heiles_columns: bool,

    /// Field separator of the input catalog (one ASCII character)
    #[arg(short, long, global = true, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sigma-clipped weighted averages per zone
    Zones {
        /// Catalog file
        catalog: PathBuf,

        /// Zone side in degrees
        #[arg(long)]
        zone_size: Option<f64>,

        /// Angle window half-width in standard deviations
        #[arg(long)]
        sigma_limit: Option<f64>,

        /// Treat angles as axial (180° period)
        #[arg(long)]
        axial: bool,

        /// Output table (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Density clusters over (longitude, latitude, angle)
    Clusters {
        /// Catalog file
        catalog: PathBuf,

        /// Neighbourhood radius in degrees
        #[arg(long)]
        max_separation: Option<f64>,

        /// Neighbours needed for a core point
        #[arg(long)]
        min_neighbors: Option<usize>,

        /// Treat angles as axial (180° period)
        #[arg(long)]
        axial: bool,

        /// Output table of clustered records (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output table of per-cluster summaries
        #[arg(short, long)]
        summary: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_path(path)?,
        None => AnalysisConfig::default(),
    };

    let mut columns = if cli.heiles_columns {
        CatalogColumns::heiles()
    } else {
        CatalogColumns::default()
    };
    columns.delimiter = cli.delimiter;

    match cli.command {
        Commands::Zones {
            catalog,
            zone_size,
            sigma_limit,
            axial,
            output,
        } => {
            if let Some(size) = zone_size {
                config.zones.zone_size = size;
            }
            if let Some(limit) = sigma_limit {
                config.zones.sigma_limit = limit;
            }
            if axial {
                config.zones.angle_mode = AngleMode::Axial;
            }
            config.validate()?;

            let records = load_catalog(&catalog, &columns, &config)?;
            let stats = compute_zone_statistics(&records, &config.zones)?;
            write_output(output.as_deref(), &stats)?;
        }
        Commands::Clusters {
            catalog,
            max_separation,
            min_neighbors,
            axial,
            output,
            summary,
        } => {
            if let Some(eps) = max_separation {
                config.clusters.max_separation = eps;
            }
            if let Some(n) = min_neighbors {
                config.clusters.min_neighbors = n;
            }
            if axial {
                config.clusters.angle_mode = AngleMode::Axial;
            }
            config.validate()?;

            let records = load_catalog(&catalog, &columns, &config)?;
            let analysis = analyze_clusters(&records, &config.clusters)?;

            let rows: Vec<ClusteredRow> = analysis.clustered.iter().map(ClusteredRow::from).collect();
            write_output(output.as_deref(), &rows)?;
            if let Some(path) = summary {
                write_output(Some(&path), &analysis.summaries)?;
            }
            for s in &analysis.summaries {
                info!(
                    "  cluster {:3}: ({:8.3}, {:7.3}) angle {:6.1} deg, {} members",
                    s.cluster, s.longitude, s.latitude, s.angle, s.members
                );
            }
        }
    }
    Ok(())
}

/// A delimiter must be a single ASCII character so it fits in one byte.
fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        (Some(c), None) => Err(format!("'{}' is not an ASCII character", c)),
        _ => Err(format!("expected a single character, got '{}'", s)),
    }
}

fn load_catalog(path: &Path, columns: &CatalogColumns, config: &AnalysisConfig) -> Result<Vec<Measurement>> {
    info!("Loading catalog from: {}", path.display());
    let file = File::open(path)?;
    let records = read_catalog_csv(BufReader::new(file), columns)?;
    let records = normalize_longitudes(records);
    Ok(config.cutout.apply(records))
}

fn write_output<T: Serialize>(path: Option<&Path>, rows: &[T]) -> Result<()> {
    match path {
        Some(path) => {
            write_table_csv(BufWriter::new(File::create(path)?), rows)?;
            info!("Wrote {} rows to {}", rows.len(), path.display());
        }
        None => write_table_csv(io::stdout().lock(), rows)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\t"), Ok(b'\t'));
        assert!(parse_delimiter("§").is_err());
        assert!(parse_delimiter("é").is_err());
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(",,").is_err());
    }

    #[test]
    fn test_cli_rejects_non_ascii_delimiter() {
        assert!(Cli::try_parse_from(["polmap", "--delimiter", "¦", "zones", "cat.csv"]).is_err());
        let cli = Cli::try_parse_from(["polmap", "--delimiter", "|", "zones", "cat.csv"]).unwrap();
        assert_eq!(cli.delimiter, b'|');
    }
}
