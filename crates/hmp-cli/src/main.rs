mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hmp_core::config::TestExecutionConfig;
use hmp_core::{
    ComposeSimulator, Config, Controller, Discovery, OpenDaylightController, Runner, Simulator,
};
use serde_json::json;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "hmp-runner")]
#[command(about = "O-RAN hybrid M-plane conformance test runner", long_about = None)]
struct Cli {
    /// Configuration file to use instead of the default search path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run conformance tests and write the results
    Run {
        /// Test case id to run, in order (repeatable)
        #[arg(long = "case")]
        cases: Vec<String>,
        /// Category to run (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Suite to run (repeatable)
        #[arg(long = "suite")]
        suites: Vec<String>,
        /// Write results.json instead of a zip archive
        #[arg(long)]
        skip_archiving: bool,
        /// Test against an already running O-RU instead of the simulator
        #[arg(long)]
        no_simulator: bool,
    },
    /// List discovered test cases
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::from_file(&path),
        None => Config::load(),
    };
    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Run {
            cases,
            categories,
            suites,
            skip_archiving,
            no_simulator,
        } => {
            if !(cases.is_empty() && categories.is_empty() && suites.is_empty()) {
                let non_empty = |list: Vec<String>| Some(list).filter(|l| !l.is_empty());
                config.test_execution = Some(TestExecutionConfig {
                    test_cases: non_empty(cases),
                    categories: non_empty(categories),
                    suites: non_empty(suites),
                });
            }
            if skip_archiving {
                config.skip_archiving = true;
            }
            if no_simulator {
                config.simulator.use_simulator = false;
            }
            run(config)
        }
        Commands::List { json } => {
            let _guard = logging::init(&config.log_level, None);
            list(json);
            ExitCode::SUCCESS
        }
        Commands::Config => {
            print!("{}", config.to_toml_string());
            ExitCode::SUCCESS
        }
    }
}

fn run(config: Config) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let runner = Runner::new(config);
    let output_dir = &runner.config().paths.output_dir;
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        eprintln!("Error: cannot create {}: {e}", output_dir.display());
        return ExitCode::FAILURE;
    }
    let log_path = runner.session().log_path();
    let _guard = logging::init(&runner.config().log_level, Some(&log_path));

    info!(test_id = %runner.session().test_id, "Hybrid M-plane test runner starting");
    let discovery = Discovery::builtin();

    let connected = OpenDaylightController::connect(&runner.config().controller);
    let controller: Arc<dyn Controller> = match connected {
        Ok(controller) => Arc::new(controller),
        Err(e) => {
            error!(error = %e, "Failed to connect to the controller");
            return ExitCode::FAILURE;
        }
    };

    let simulator = if runner.config().simulator.use_simulator {
        let simulator = ComposeSimulator::from_config(&runner.config().simulator);
        if let Err(e) = simulator.start() {
            error!(error = %e, "Failed to start simulator");
            return ExitCode::FAILURE;
        }
        Some(simulator)
    } else {
        None
    };

    let simulator = simulator.as_ref().map(|s| s as &dyn Simulator);
    let outcome = match runner.run(&discovery, controller, simulator) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Test run failed");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Tests finished with an overall status of {}",
        outcome.result
    );
    if outcome.archived {
        println!(
            "Results and artifacts archived to: {}",
            outcome.output_path.display()
        );
    } else {
        println!("Results saved to: {}", outcome.output_path.display());
        println!(
            "Artifacts saved to: {}",
            runner.config().paths.output_dir.display()
        );
    }
    ExitCode::SUCCESS
}

fn list(as_json: bool) {
    let discovery = Discovery::builtin();

    if as_json {
        let cases: Vec<serde_json::Value> = discovery
            .all()
            .into_iter()
            .map(|case| {
                json!({
                    "id": case.id(),
                    "name": case.name(),
                    "description": case.description(),
                    "categories": case.categories(),
                    "suite": case.suite(),
                })
            })
            .collect();
        let listing = json!({
            "cases": cases,
            "categories": discovery.all_categories(),
        });
        match serde_json::to_string_pretty(&listing) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Error: {e}"),
        }
        return;
    }

    for suite in discovery.all_suites() {
        println!("{}", suite.name());
        for case in suite.cases() {
            println!(
                "  {}  {}  [{}]",
                case.id(),
                case.name(),
                case.categories().join(", ")
            );
        }
    }
    println!();
    println!("Categories: {}", discovery.all_categories().join(", "));
}
