#![warn(clippy::all, clippy::pedantic)]

use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use csv::Writer;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use trancheflow::algo::solve::{solve_best_ratio, solve_cheapest_opening, solve_source_saturating};
use trancheflow::{FlowNetwork, TrancheEdge};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    /// Augment along the path with the cheapest opening cost
    CheapestOpening,
    /// Saturate source-adjacent headroom in best flow-per-cost order
    SourceSaturating,
    /// Augment the quote with the highest flow per cost
    BestRatio,
}

#[derive(Parser)]
#[command(name = "trancheflow-cli", version, about = "Routes a flow demand through a tranche-structured network")]
struct Args {
    /// CSV file of tranche edges: start,end,capacities,unit_costs,fixed_costs
    #[arg(long)]
    input: PathBuf,

    /// Flow demand to route from node 0 to the highest node
    #[arg(long)]
    demand: f64,

    /// Augmentation strategy
    #[arg(long, value_enum, default_value_t = Strategy::CheapestOpening)]
    strategy: Strategy,

    /// CSV file for the per-edge results
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

// Read the tranche edges from a CSV file
fn read_edges_csv(filepath: &PathBuf) -> Result<Vec<TrancheEdge>, Box<dyn Error>> {
    let file = File::open(filepath)?;
    let mut rdr = csv::Reader::from_reader(file);
    let rows: Result<Vec<TrancheEdge>, _> = rdr.deserialize().collect();
    Ok(rows?)
}

// Write the routed flows and incurred costs
fn write_flows_csv(net: &FlowNetwork, filepath: &PathBuf) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(filepath)?;
    wtr.write_record(["start", "end", "flow", "cost"])?;
    for edge in net.tranche_edges() {
        wtr.write_record([
            edge.start().to_string(),
            edge.end().to_string(),
            edge.flow().to_string(),
            edge.incurred_cost().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let edges = read_edges_csv(&args.input)?;
    // Echo each edge's tranche table before solving
    for edge in &edges {
        for (level, tranche) in edge.levels().iter().enumerate() {
            log::debug!(
                "edge {} -> {} tranche {level}: capacity = {}, unit cost = {}, fixed cost = {}",
                edge.start(),
                edge.end(),
                tranche.capacity(),
                tranche.unit_cost(),
                tranche.fixed_cost()
            );
        }
    }
    let nodes = edges
        .iter()
        .map(|e| e.start().max(e.end()))
        .max()
        .map(|top| top + 1)
        .ok_or("input file has no edges")?;

    let mut net = FlowNetwork::new(nodes, edges).map_err(|e| e.to_string())?;
    let met = match args.strategy {
        Strategy::CheapestOpening => solve_cheapest_opening(&mut net, args.demand),
        Strategy::SourceSaturating => solve_source_saturating(&mut net, args.demand),
        Strategy::BestRatio => solve_best_ratio(&mut net, args.demand),
    }
    .map_err(|e| e.to_string())?;

    if !met {
        log::warn!("demand {} not met, routed {}", args.demand, net.total_flow());
    }
    println!("{net}");

    if let Some(filepath) = &args.output {
        write_flows_csv(&net, filepath)?;
    }
    Ok(())
}
