use anchor_account_graph::config::AnalyzerConfig;
use anchor_account_graph::models::DefinitionGraph;
use anchor_account_graph::{analyze_file, report, VERSION};
use anyhow::{bail, Context, Result};
use env_logger::Builder;
use log::{info, LevelFilter};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

struct Options {
    files: Vec<PathBuf>,
    output_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    quiet: bool,
    verbose: bool,
}

fn print_usage(program: &str) {
    println!("Anchor Account Graph v{}", VERSION);
    println!("\nUsage:");
    println!("  {} <FILE>... [--output PATH] [--config PATH] [--quiet] [--verbose]", program);
    println!("  {} --version", program);
    println!("\nOptions:");
    println!("  --output, -o PATH    Save the JSON report to the specified file path");
    println!("  --config PATH        Load analyzer settings from a JSON file");
    println!("  --quiet, -q          Only print warnings and errors");
    println!("  --verbose            Print debug output");
    println!("  --version, -v        Show version information");
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        files: Vec::new(),
        output_path: None,
        config_path: None,
        quiet: false,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--output" | "-o" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("Missing value for --output");
                };
                options.output_path = Some(PathBuf::from(value));
                i += 2;
            }
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("Missing value for --config");
                };
                options.config_path = Some(PathBuf::from(value));
                i += 2;
            }
            "--quiet" | "-q" => {
                options.quiet = true;
                i += 1;
            }
            "--verbose" => {
                options.verbose = true;
                i += 1;
            }
            other if other.starts_with('-') => bail!("Unknown argument: {}", other),
            file => {
                options.files.push(PathBuf::from(file));
                i += 1;
            }
        }
    }

    Ok(options)
}

// Simple CLI without clap
#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("anchor-account-graph");

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-v") {
        println!("Anchor Account Graph v{}", VERSION);
        return Ok(());
    }

    let options = parse_args(&args)?;
    if options.files.is_empty() {
        print_usage(program);
        return Ok(());
    }

    let level = if options.verbose {
        LevelFilter::Debug
    } else if options.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_secs())
                    .unwrap_or_default(),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();

    let config = match &options.config_path {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    let config = Arc::new(config);

    // one blocking task per file, results collected in argument order
    let handles: Vec<_> = options
        .files
        .iter()
        .cloned()
        .map(|path| {
            let config = Arc::clone(&config);
            tokio::task::spawn_blocking(move || analyze_file(&path, &config))
        })
        .collect();

    let mut graphs: Vec<DefinitionGraph> = Vec::new();
    for (path, handle) in options.files.iter().zip(handles) {
        let file_graphs = handle
            .await
            .with_context(|| format!("Analysis task for {} failed", path.display()))?
            .with_context(|| format!("Failed to analyze {}", path.display()))?;
        graphs.extend(file_graphs);
    }

    if !options.quiet {
        for graph in &graphs {
            print!("{}", report::Summary(graph));
        }
    }

    match &options.output_path {
        Some(path) => {
            report::save_graphs(&graphs, path)?;
            if !options.quiet {
                println!("\nSaved {} definition graph(s) to: {}", graphs.len(), path.display());
            }
        }
        None if !options.quiet => {
            println!("{}", report::to_json(&graphs)?);
        }
        None => {}
    }

    info!("Analyzed {} struct(s) in {} file(s)", graphs.len(), options.files.len());
    Ok(())
}
