//! CLI argument definitions using Clap derive macros

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "vyos-config", about = "VyOS Configuration CLI", version)]
pub struct Cli {
    /// Interface to configure (e.g. eth1)
    #[arg(long)]
    pub interface: Option<String>,

    /// Description for the interface
    #[arg(long)]
    pub description: Option<String>,

    /// Enable source NAT (masquerade) for the LAN subnet
    #[arg(long)]
    pub enable_nat: bool,

    /// DHCP scope addresses
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub dhcp_scope: Option<Vec<String>>,

    /// Enable DNS forwarding for the LAN
    #[arg(long)]
    pub enable_dns: bool,

    /// Print the commands that would be sent without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Save the committed configuration to the boot config
    #[arg(long)]
    pub save: bool,
}
