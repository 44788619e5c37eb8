//! Sheetbridge CLI - Convert source app exports into target workbooks
//!
//! # Main Command
//!
//! ```bash
//! sheetbridge run exports/sales sales.tds -o out   # All stages
//! ```
//!
//! # Stage Commands
//!
//! ```bash
//! sheetbridge flatten exports/sales -o flattened.json
//! sheetbridge common flattened.json -o common_layer.json
//! sheetbridge datasource common_layer.json sales.tds        # in place
//! sheetbridge target common_layer.json -o target.json --xml target.xml
//! sheetbridge functions                                     # lookup tables
//! sheetbridge charts
//! ```

use clap::{Parser, Subcommand};
use sheetbridge::artifact::{read_json, to_json_string, write_text};
use sheetbridge::logs::log_error;
use sheetbridge::transform::{common, datasource, flatten, target};
use sheetbridge::{Dictionary, FlattenedWorkbook, PipelineOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetbridge")]
#[command(about = "Convert BI app exports into target workbooks via a common layer", long_about = None)]
struct Cli {
    /// Dictionary file extending the built-in function/chart tables
    /// (default: $SHEETBRIDGE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten an unbuilt app export into per-sheet object lists
    Flatten {
        /// Export root (contains objects/ and script.qvs)
        source_dir: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Map a flattened workbook to the common layer
    Common {
        /// Flattened workbook JSON
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a target datasource definition into a common layer
    Datasource {
        /// Common layer JSON
        common: PathBuf,

        /// Target datasource markup
        datasource: PathBuf,

        /// Output file (default: update the common layer in place)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Expand a merged common layer into the target workbook
    Target {
        /// Merged common layer JSON
        input: PathBuf,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the XML rendering
        #[arg(long)]
        xml: Option<PathBuf>,
    },

    /// Full conversion: export + datasource → target workbook
    Run {
        /// Export root (contains objects/ and script.qvs)
        source_dir: PathBuf,

        /// Target datasource markup
        datasource: PathBuf,

        /// Output directory for all artifacts
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Show the aggregation function table
    Functions,

    /// Show the chart type table
    Charts,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Flatten { source_dir, output } => cmd_flatten(&source_dir, output.as_deref()),

        Commands::Common { input, output } => cmd_common(&input, output.as_deref()),

        Commands::Datasource {
            common,
            datasource,
            output,
        } => cmd_datasource(&common, &datasource, output.as_deref()),

        Commands::Target { input, output, xml } => {
            cmd_target(&input, output.as_deref(), xml.as_deref(), config)
        }

        Commands::Run {
            source_dir,
            datasource,
            output,
        } => cmd_run(source_dir, datasource, output, config),

        Commands::Functions => cmd_functions(config),

        Commands::Charts => cmd_charts(config),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_flatten(source_dir: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📂 Flattening export: {}", source_dir.display());

    let flattened = match output {
        Some(path) => flatten::run(source_dir, path)?,
        None => {
            let flattened = flatten::flatten_folder(source_dir)?;
            write_output(&to_json_string(&flattened, source_dir)?, None)?;
            flattened
        }
    };

    eprintln!(
        "✅ {} sheet(s), {} data source(s)",
        flattened.ws_sheets.len(),
        flattened.data_sources.len()
    );
    Ok(())
}

fn cmd_common(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔁 Mapping to common layer: {}", input.display());

    let common = match output {
        Some(path) => common::run(input, path)?,
        None => {
            let flattened: FlattenedWorkbook = read_json(input)?;
            let common = common::to_common(&flattened);
            write_output(&to_json_string(&common, input)?, None)?;
            common
        }
    };

    let charts: usize = common.workbook.sheets.values().map(|s| s.len()).sum();
    eprintln!("✅ {} chart(s) in {} sheet(s)", charts, common.workbook.sheets.len());
    Ok(())
}

fn cmd_datasource(
    common_path: &Path,
    datasource_path: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔗 Resolving datasource: {}", datasource_path.display());

    let output = output.unwrap_or(common_path);
    let merged = datasource::run(common_path, datasource_path, output)?;

    eprintln!(
        "✅ {} column(s) from {}",
        merged.workbook.data_source.column_map().len(),
        merged.workbook.data_source.name.as_deref().unwrap_or("(unnamed)")
    );
    Ok(())
}

fn cmd_target(
    input: &Path,
    output: Option<&Path>,
    xml: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🎯 Expanding common layer: {}", input.display());
    let dictionary = Dictionary::resolve(config)?;

    let document = match output {
        Some(path) => target::run(input, path, xml, &dictionary)?,
        None => {
            let document = target::convert_file(input, &dictionary)?;
            if let Some(xml_path) = xml {
                write_output(&target::to_xml(&document, xml_path)?, Some(xml_path))?;
            }
            write_output(&to_json_string(&document, input)?, None)?;
            document
        }
    };

    eprintln!("✅ {} worksheet(s)", document.worksheets.worksheet.len());
    Ok(())
}

fn cmd_run(
    source_dir: PathBuf,
    datasource: PathBuf,
    output: PathBuf,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = PipelineOptions::new(source_dir, datasource, output)
        .with_dictionary(Dictionary::resolve(config)?);
    let report = sheetbridge::run(&options)?;

    eprintln!();
    eprintln!("📊 Summary:");
    eprintln!("   Sheets: {}", report.sheet_count);
    eprintln!("   Objects: {}", report.object_count);
    eprintln!("   Charts: {}", report.chart_count);
    eprintln!("   Worksheets: {}", report.worksheet_count);
    if !report.data_sources.is_empty() {
        eprintln!("   Data sources: {}", report.data_sources.join(", "));
    }
    eprintln!("💾 Target written to: {}", report.target_xml_path.display());
    Ok(())
}

fn cmd_functions(config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", Dictionary::resolve(config)?.functions_description());
    Ok(())
}

fn cmd_charts(config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", Dictionary::resolve(config)?.charts_description());
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            write_text(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_write_output_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("xml").join("target.xml");

        write_output("<Workbook/>", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<Workbook/>");
    }

    #[test]
    fn test_write_output_error_names_path() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = write_output("<Workbook/>", Some(&blocker.join("target.xml"))).unwrap_err();
        assert!(err.to_string().contains("blocker"));
    }
}
