use clap::{Parser, Subcommand};

/// Usage gateway — authenticated caching proxy for the billing/usage API
#[derive(Parser)]
#[command(name = "usage-gateway", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to bind (overrides GATEWAY_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
