use std::{env, env::VarError};

/// The server takes no arguments. If any are given, print the help text and the current configuration, and return
/// `true` so that the caller can exit.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // OLC_WEBHOOK_SECRET is deliberately absent
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "OLC_HOST",
        "OLC_PORT",
        "OLC_DATABASE_URL",
        "OLC_REDIS_URL",
        "OLC_LOCK_TTL_MS",
        "OLC_LOCK_MAX_ATTEMPTS",
        "OLC_LOCK_RETRY_INTERVAL_MS",
        "OLC_MAX_PROCESSING_DELAY_MS",
        "OLC_WEBHOOK_SIGNATURE_MODE",
        "OLC_WEBHOOK_SIGNATURE_HEADER",
        "OLC_REQUEST_TIMEOUT_MS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
