use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sram4_sim::console::{run_console, ConsoleConfig};
use sram4_sim::system_config::SimConfig;
use sram4_sim::testbench::{BenchReport, TraceEntry, Testbench, DEFAULT_PATTERNS};
use sram4_sim::SimResult;

#[derive(Parser, Debug)]
#[command(
    name = "sram4_sim",
    version,
    about = "Cycle-level simulator for a 4-bit SRAM test controller"
)]
struct Args {
    /// Log filter used when RUST_LOG is not set (e.g. "info", "sram4_sim=trace")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print the per-cycle trace after a run
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bring-up pattern test (A, 5, F, 0, 9)
    Selftest {
        /// Fail on the first request made while the controller is busy
        #[arg(long, action = clap::ArgAction::SetTrue)]
        strict: bool,
    },
    /// Run the patterns and stimulus script from a JSON config
    Run {
        /// Path to the JSON config
        config: String,
    },
    /// Interactive terminal monitor
    Console {
        /// Optional JSON config for clock, initial contents and console settings
        #[arg(long, value_name = "PATH")]
        config: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> SimResult<()> {
    match &args.command {
        Command::Selftest { strict } => {
            let mut bench = if *strict {
                Testbench::strict()
            } else {
                Testbench::new()
            };
            let result = bench.run_pattern_test(&DEFAULT_PATTERNS);
            if args.trace {
                print_trace(&bench);
            }
            print_summary("selftest", &result?);
            Ok(())
        }
        Command::Run { config } => {
            let config = SimConfig::from_json_file(config)?;
            println!("Running: {}", config.name);
            if !config.description.is_empty() {
                println!("Description: {}", config.description);
            }
            let mut bench = Testbench::from_config(&config)?;
            let result = config.run_on(&mut bench);
            if args.trace {
                print_trace(&bench);
            }
            print_summary(&config.name, &result?);
            Ok(())
        }
        Command::Console { config } => match config {
            Some(path) => {
                let config = SimConfig::from_json_file(path)?;
                let bench = Testbench::from_config(&config)?;
                run_console(bench, config.console)
            }
            None => run_console(Testbench::new(), ConsoleConfig::default()),
        },
    }
}

fn print_trace(bench: &Testbench) {
    println!("{}", TraceEntry::header());
    for entry in bench.trace() {
        println!("{}", entry.to_row());
    }
}

fn print_summary(name: &str, report: &BenchReport) {
    println!("{}: {} checks passed", name, report.checks_passed);
    println!(
        "  {} cycles, {} ns simulated",
        report.cycles, report.elapsed_ns
    );
    if report.violations.is_empty() {
        println!("  no protocol violations");
    } else {
        println!("  {} protocol violations:", report.violations.len());
        for v in &report.violations {
            println!("    cycle {:4}: {} (ui_in={:08b})", v.cycle, v.kind, v.ui_in);
        }
    }
}
