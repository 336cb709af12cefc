use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cache::{Cache, CacheConfig};
use sim::{run_trace, SimStats};
use trace::Trace;

mod cache;
mod sim;
mod trace;

#[derive(Parser)]
#[command(
    name = "lru_cache_sim",
    version = "0.1.0",
    about = "Set-associative LRU cache simulator driven by Valgrind memory traces"
)]
struct Cli {
    /// Number of set index bits (the cache has 2^s sets)
    #[arg(short = 's', long = "set-bits", value_name = "BITS")]
    set_bits: u32,

    /// Associativity: number of lines per set
    #[arg(short = 'E', long = "associativity", value_name = "LINES")]
    associativity: u64,

    /// Number of block offset bits (each block holds 2^b bytes)
    #[arg(short = 'b', long = "block-bits", value_name = "BITS")]
    block_bits: u32,

    /// The path of the trace file to replay
    #[arg(short = 't', long = "trace", value_name = "TRACE_FILE")]
    trace: PathBuf,

    /// Echo every data reference with its outcome
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(stats) => {
            println!(
                "hits:{} misses:{} evictions:{}",
                stats.hits, stats.misses, stats.evictions
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("lru_cache_sim: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<SimStats, Box<dyn Error>> {
    let config = CacheConfig {
        set_bits: cli.set_bits,
        associativity: cli.associativity,
        block_bits: cli.block_bits,
    };
    let cache = Cache::new(config)?;
    let trace = Trace::open(&cli.trace)
        .map_err(|err| format!("could not open trace file {}: {err}", cli.trace.display()))?;
    Ok(run_trace(trace, cache, cli.verbose)?)
}
