//! Startup banner

use super::config::is_all_interfaces;
use super::constants::{API_PREFIX, APP_NAME};

/// Label column width
const W: usize = 12;

/// Print the startup banner with URLs
pub fn print_banner(host: &str, port: u16, analytics_url: &str, coalesce: bool) {
    // Use localhost for display when binding to all interfaces
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m \x1b[36mhttp://{}:{}{}\x1b[0m",
        "API:", display_host, port, API_PREFIX
    );
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Analytics:", analytics_url
    );
    if !coalesce {
        println!("  \x1b[90m➜  {:<W$} coalescing disabled\x1b[0m", "Dispatch:");
    }
    println!();
}
