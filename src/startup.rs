// Startup module - banner and capture instructions
//
// Printed once before the interactive loop takes over. Shows version info,
// where the config came from, and how to capture the request in the browser.

use crate::config::{Config, VERSION};

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// Print the startup banner and the capture walkthrough
pub fn print_banner(config: &Config) {
    use colors::*;

    println!();
    println!("  {BOLD}{CYAN}ghostedit{RESET} {DIM}v{VERSION}{RESET}");
    println!("  {DIM}Re-edit a sent message with no edited mark{RESET}");
    println!();

    // Config file status
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("  {DIM}Config:{RESET} {GREEN}✓{RESET} {}", path.display());
        } else {
            println!("  {DIM}Config:{RESET} {DIM}(using defaults){RESET}");
        }
    }
    println!(
        "  {DIM}Dispatch timeout:{RESET} {}s",
        config.timeout_secs
    );
    println!();

    println!("  {BOLD}How to capture the request:{RESET}");
    println!("  1. Open DevTools ({YELLOW}Ctrl+Shift+I{RESET}) on the Discord tab, Network panel");
    println!("  2. Send a message and find the request to the {BOLD}messages{RESET} endpoint");
    println!("  3. Right-click it and choose {BOLD}Copy as fetch{RESET}");
    println!();
}
