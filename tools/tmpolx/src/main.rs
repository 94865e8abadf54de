// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use log::debug;
use log::info;
use topo_hints::read_nodelist;
use topo_hints::Engine;
use topo_hints::EngineParams;
use topo_hints::HintFormat;

/// tmpolx: Topology Manager policy explorer
///
/// Feeds per-resource NUMA affinity hints through a Topology Manager policy
/// and prints the merged hint together with the admission decision.
///
/// Hints are given one resource per argument, either in the compact form
///
///   'cpu:[{01 true} {10 true} {11 false}]'
///
/// or, with --json, as
///
///   '{"R":"cpu","H":[{"M":"01","P":true},{"M":"10","P":true}]}'
///
/// where the rightmost mask character stands for NUMA node 0.
#[derive(Debug, Parser)]
struct Opts {
    /// NUMA nodes of the machine, as a node list such as "0-3" or "0,1".
    /// Up to 8 nodes, numbered from 0.
    #[clap(short = 'N', long, default_value = "0-7")]
    numa: String,

    /// Topology Manager policy: none, best-effort, restricted or
    /// single-numa-node.
    #[clap(short = 'P', long, default_value = "none")]
    policy: String,

    /// Interpret hints as JSON instead of the compact form.
    #[clap(short = 'J', long, action = clap::ArgAction::SetTrue)]
    json: bool,

    /// Enable verbose output. Specify twice to log every merge candidate.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Resource hints, one resource per argument.
    hints: Vec<String>,
}

fn init_log(verbose: u8) -> Result<()> {
    let llv = match verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        llv,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    init_log(opts.verbose)?;
    debug!("opts={:?}", &opts);

    let numa_nodes = read_nodelist(&opts.numa)
        .with_context(|| format!("bad format for NUMA configuration {:?}", opts.numa))?;

    let params = EngineParams {
        policy_name: opts.policy,
        numa_nodes,
        raw_hints: opts.hints,
        hint_format: if opts.json {
            HintFormat::Json
        } else {
            HintFormat::Compact
        },
    };

    let engine = Engine::from_params(&params).context("Failed to set up the policy engine")?;
    info!("{}", engine);

    let result = engine.run().context("Failed to merge hints")?;
    println!("{}", result);

    Ok(())
}
