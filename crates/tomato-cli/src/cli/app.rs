//! # CLI Application
//!
//! CLI definition and command dispatch using clap.

use clap::{Args, Parser, Subcommand};

use super::commands::{cmd_init, cmd_vpn};
use super::output;
use tomato_protocol::Result;

/// tomato - point-to-point encrypted UDP tunnel
#[derive(Parser)]
#[command(
    name = "tomato",
    version = env!("CARGO_PKG_VERSION"),
    about = "Point-to-point encrypted UDP tunnel over a TUN interface",
    long_about = None,
    after_help = "Examples:\n  \
        sudo tomato vpn -c tomato.toml\n  \
        sudo tomato vpn --la :1080 --pa peer.example.com:1080 --lp mine --pp theirs\n  \
        sudo tomato vpn -c server.toml -d -v\n  \
        tomato init > tomato.toml",
    styles = get_styles(),
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tunnel
    #[command(visible_alias = "up")]
    Vpn(VpnArgs),

    /// Create config template
    Init {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Tunnel options; each one overrides the config file
#[derive(Args, Debug, Default)]
pub struct VpnArgs {
    /// Config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// TUN interface name
    #[arg(short = 'I', long = "iface")]
    pub interface: Option<String>,

    /// Local UDP address (host:port or :port)
    #[arg(long = "la", value_name = "ADDR")]
    pub local: Option<String>,

    /// Peer UDP address (host:port)
    #[arg(long = "pa", value_name = "ADDR")]
    pub peer: Option<String>,

    /// Password for outbound frames
    #[arg(long = "lp", value_name = "PASSWORD")]
    pub local_password: Option<String>,

    /// Password for inbound frames
    #[arg(long = "pp", value_name = "PASSWORD")]
    pub peer_password: Option<String>,

    /// Seconds a frame timestamp may differ from the local clock
    #[arg(long = "pvt", value_name = "SECS")]
    pub packet_valid_time: Option<u64>,

    /// Seconds without peer contact before a roaming end pauses
    #[arg(long = "avt", value_name = "SECS")]
    pub address_valid_time: Option<u64>,

    /// Learn the peer address from authenticated frames
    #[arg(short = 'd', long = "roaming")]
    pub roaming: bool,

    /// Log every frame sent, received or dropped
    #[arg(short, long)]
    pub verbose: bool,
}

fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            clap::builder::styling::AnsiColor::BrightCyan
                .on_default()
                .bold(),
        )
        .header(
            clap::builder::styling::AnsiColor::BrightCyan
                .on_default()
                .bold(),
        )
        .literal(clap::builder::styling::AnsiColor::BrightGreen.on_default())
        .placeholder(clap::builder::styling::AnsiColor::Cyan.on_default())
        .valid(clap::builder::styling::AnsiColor::BrightGreen.on_default())
        .invalid(clap::builder::styling::AnsiColor::BrightRed.on_default())
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Vpn(args) => cmd_vpn(args),
        Commands::Init { output } => cmd_init(output.as_deref()),
    }
}

/// Print error and exit
pub fn exit_with_error(e: impl std::fmt::Display) -> ! {
    output::print_error(e);
    std::process::exit(1);
}
