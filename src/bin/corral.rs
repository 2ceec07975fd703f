// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::{Parser, Subcommand};

use corral_lib::cluster::ClusterType;
use corral_lib::config::Config;
use corral_lib::error::ProvisionError;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse and validate a provisioning config, printing the resulting
    /// plan without touching any node.
    Validate,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ProvisionError> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => corral_lib::default_config_path(),
    };

    match cli.command {
        Commands::Validate => validate(&path),
    }
}

fn validate(path: &str) -> Result<(), ProvisionError> {
    let config = Config::from_path(path)?;
    let (cluster, nodes) = config.to_descriptors()?;

    println!("{cluster}");
    for (i, node) in nodes.iter().enumerate() {
        let access = match &node.ssh {
            Some(ssh) => format!("ssh as {}@{}", ssh.username, ssh.port),
            None => "pre-discovered".to_string(),
        };
        let root = if cluster.kind == ClusterType::Gluster && i == 0 {
            " [peering root]"
        } else {
            ""
        };
        println!("  {node} role={} {access}{root}", node.role);
    }

    Ok(())
}
