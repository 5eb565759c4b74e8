use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;

use pyz_cli::args::{CliArgs, OutputFormat};
use pyz_cli::driver;
use pyz_cli::reporter::{JsonReport, Reporter};

fn main() -> Result<ExitCode> {
    // Initialize tracing if PYZ_LOG or RUST_LOG is set (zero cost otherwise).
    pyz::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let project = driver::load_project(&args, &cwd)?;

    if args.show_config {
        println!("{}", serde_json::to_string_pretty(&project.options)?);
        return Ok(ExitCode::SUCCESS);
    }
    if args.list_files_only {
        for file in &project.files {
            println!("{file}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let start = std::time::Instant::now();
    let result = driver::check(&project)?;
    let elapsed = start.elapsed();

    match args.format {
        OutputFormat::Json => println!("{}", JsonReport::new(&result).to_json()?),
        OutputFormat::Text => {
            let color = args.pretty.unwrap_or_else(|| std::io::stdout().is_terminal());
            let mut reporter = Reporter::new(color);
            for (path, text) in &result.sources {
                reporter.add_source(path.clone(), text.clone());
            }
            let diagnostics: Vec<_> = result.diagnostics().cloned().collect();
            if !diagnostics.is_empty() {
                println!("{}\n", reporter.render(&diagnostics));
            }
            println!(
                "{}",
                reporter.format_summary(
                    result.error_count(),
                    result.warning_count(),
                    result.files.len()
                )
            );
        }
    }

    if args.stats {
        let stats = result.stats;
        println!(
            "units: {}  parses: {}  binds: {}  checks: {}  generation: {}  time: {:.2?}",
            stats.units, stats.parses, stats.binds, stats.checks, stats.generation, elapsed
        );
    }

    Ok(if result.error_count() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
