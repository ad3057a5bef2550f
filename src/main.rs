use clap::{Parser, Subcommand};
use log::error;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use waybill_locator::address::AddressResolver;
use waybill_locator::config::Config;
use waybill_locator::gazetteer::RefreshOutcome;

/// Waybill Locator — delivery city resolution for shipping addresses
///
/// Matches a free-form, multi-line address against the city gazetteer
/// (a Google Sheet, or the built-in dataset when the sheet is unavailable).
///
/// Examples:
///   waybill resolve "John Doe\n123 Main Street\nColombo 01\n0771234567"
///   waybill resolve --stdin --topk 5 < address.txt
///   waybill cities
///   waybill refresh
///   waybill serve --port 8080
#[derive(Parser)]
#[command(name = "waybill", version, about, long_about = None)]
struct Cli {
    /// Config file (JSON). Defaults to <config dir>/waybill/config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Offline mode: never contact the sheet, use the built-in dataset.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve an address to its delivery city.
    Resolve {
        /// Address text. Literal "\n" sequences are treated as line breaks.
        address: Option<String>,

        /// Read the address from stdin.
        #[arg(long)]
        stdin: bool,

        /// Debug: show the top-K scored candidates.
        #[arg(long)]
        topk: Option<usize>,
    },
    /// List the cities in the current gazetteer.
    Cities,
    /// Force a gazetteer refresh and report what happened.
    Refresh,
    /// Start the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());
    let resolver = AddressResolver::from_config(&config, cli.offline);

    match cli.command {
        Command::Resolve { address, stdin, topk } => {
            let Some(address) = read_address(address, stdin) else {
                eprintln!("Error: No address given. Pass it as an argument or use --stdin.");
                return ExitCode::FAILURE;
            };
            resolve(&resolver, &address, topk)
        }
        Command::Cities => {
            let snapshot = resolver.gazetteer();
            eprintln!("  {} cities ({} data)", snapshot.len(), snapshot.origin);
            print_json(&snapshot.records)
        }
        Command::Refresh => {
            let outcome = resolver.refresh_gazetteer(true);
            match &outcome {
                RefreshOutcome::Fresh => eprintln!("  Gazetteer already fresh"),
                RefreshOutcome::Fetched { records } => eprintln!("  Fetched {} cities", records),
                RefreshOutcome::KeptPrevious { reason } => {
                    eprintln!("  Refresh failed ({}); still serving the previous sheet", reason)
                }
                RefreshOutcome::Fallback { reason } => {
                    eprintln!("  Refresh failed ({}); serving the built-in dataset", reason)
                }
            }
            ExitCode::SUCCESS
        }
        Command::Serve { host, port } => serve(resolver, &host, port),
    }
}

fn read_address(arg: Option<String>, stdin: bool) -> Option<String> {
    if stdin {
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            error!("Failed to read stdin: {}", e);
            return None;
        }
        return Some(buf);
    }
    arg.map(|a| a.replace("\\n", "\n"))
}

fn resolve(resolver: &AddressResolver, address: &str, topk: Option<usize>) -> ExitCode {
    let resolution = match resolver.resolve_detailed(address) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(topk) = topk {
        eprintln!("  Top-{} candidates ({} data):", topk, resolution.origin);
        for (i, c) in resolution.candidates.iter().enumerate().take(topk) {
            let b = &c.breakdown;
            eprintln!(
                "    {}. {} score={} (line={}, any={}, words={}, postal={}, district={}, zone={}, first={})",
                i + 1,
                c.city,
                c.score,
                b.positional,
                b.any_line,
                b.words,
                b.postal,
                b.district,
                b.zone,
                b.first_line,
            );
        }
    }

    match &resolution.city {
        Some(city) => eprintln!("  \u{1F4E6} {}", city),
        None => eprintln!("  Could not determine the city with confidence"),
    }
    print_json(&resolution)
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn serve(resolver: AddressResolver, host: &str, port: u16) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Cannot start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    eprintln!("  Press Ctrl+C to stop.");
    match runtime.block_on(waybill_locator::server::start(Arc::new(resolver), host, port)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error on {}:{}: {}", host, port, e);
            ExitCode::FAILURE
        }
    }
}
