use std::{
    env,
    fs,
    io::{self, Read},
    path::Path,
};

use anyhow::{anyhow, Context, Result};
use log::warn;
use olc_common::Secret;

/// Reads the webhook body from `file`, or from stdin when no file is given. The bytes are returned untouched, since a
/// raw signature covers every one of them.
pub fn read_body(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path).with_context(|| format!("Could not read {}", path.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("Could not read the body from stdin")?;
            Ok(buf)
        },
    }
}

/// Uses the secret given on the command line, falling back to `OLC_WEBHOOK_SECRET`.
pub fn resolve_secret(secret: Option<String>) -> Result<Secret<String>> {
    let secret = secret
        .or_else(|| env::var("OLC_WEBHOOK_SECRET").ok())
        .ok_or_else(|| anyhow!("No secret given. Use --secret or set OLC_WEBHOOK_SECRET."))?;
    if secret.is_empty() {
        warn!("The webhook secret is empty");
    }
    Ok(Secret::new(secret))
}
