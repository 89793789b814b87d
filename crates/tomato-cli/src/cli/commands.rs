//! # CLI Commands
//!
//! Command implementations for the tunnel CLI.

use super::app::VpnArgs;
use super::output::{print_connected, print_success};
use tomato_core::{example_config, ConfigError, VpnConfig};
use tomato_lib::Tunnel;
use tomato_protocol::{Result, VpnError};

fn config_error(e: ConfigError) -> VpnError {
    VpnError::Config(e.to_string())
}

/// Load the config file (if any) and lay the command-line flags over it
pub(crate) fn build_config(args: VpnArgs) -> std::result::Result<VpnConfig, ConfigError> {
    let mut cfg = match &args.config {
        Some(path) => VpnConfig::from_file(path)?,
        None => VpnConfig::default(),
    };

    if let Some(interface) = args.interface {
        cfg.tunnel.interface = interface;
    }
    if let Some(local) = args.local {
        cfg.tunnel.local = local;
    }
    if let Some(peer) = args.peer {
        cfg.tunnel.peer = Some(peer);
    }
    if let Some(password) = args.local_password {
        cfg.crypto.local_password = Some(password);
    }
    if let Some(password) = args.peer_password {
        cfg.crypto.peer_password = Some(password);
    }
    if let Some(secs) = args.packet_valid_time {
        cfg.tunnel.packet_valid_time = secs;
    }
    if let Some(secs) = args.address_valid_time {
        cfg.tunnel.address_valid_time = secs;
    }
    // Flags can only switch these on
    cfg.tunnel.roaming |= args.roaming;
    cfg.logging.trace |= args.verbose;

    cfg.validate()?;
    Ok(cfg)
}

fn setup_logging(level: &str, trace: bool) {
    let filter = if trace { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .init();
}

/// Run the tunnel until one direction fails
pub fn cmd_vpn(args: VpnArgs) -> Result<()> {
    let cfg = build_config(args).map_err(config_error)?;
    setup_logging(&cfg.logging.level, cfg.logging.trace);

    let tunnel = Tunnel::open(&cfg)?;
    print_connected(&format!(
        "Tunnel up on {} ({} -> {})",
        cfg.tunnel.interface,
        cfg.tunnel.local,
        tunnel.session().peer.current_addr()
    ));

    tunnel.run()
}

/// Create config template
pub fn cmd_init(output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, example_config())?;
            print_success(&format!("Config written to {}", path));
        }
        None => print!("{}", example_config()),
    }
    Ok(())
}
