use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use order_lifecycle_engine::webhook::SignatureMode;

mod input;
mod signature;

use crate::signature::{print_canonical_payload, print_signature, print_verification};

#[derive(Parser, Debug)]
#[command(version = "0.1.0", about = "Tools for working with the order lifecycle server")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "sign", about = "Sign a shipping webhook body, as a shipping carrier would")]
    Sign(SignParams),
    #[clap(name = "verify", about = "Check a shipping webhook signature, as the server would")]
    Verify(VerifyParams),
    #[clap(name = "canonical", about = "Print the bytes that a canonical signature covers")]
    Canonical(BodyParams),
}

#[derive(Debug, Args)]
pub struct BodyParams {
    /// Read the webhook body from this file. The body is read from stdin if omitted.
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SignParams {
    /// The shared webhook secret. Falls back to OLC_WEBHOOK_SECRET.
    #[arg(short = 's', long = "secret")]
    secret: Option<String>,
    /// `canonical` signs shipment_id, order_id, event_type and timestamp only. `raw` signs the whole body.
    #[arg(short = 'm', long = "mode", default_value = "canonical")]
    mode: SignatureMode,
    #[command(flatten)]
    body: BodyParams,
}

#[derive(Debug, Args)]
pub struct VerifyParams {
    #[command(flatten)]
    sign: SignParams,
    /// The hex signature to check, e.g. the value of the X-Webhook-Signature header
    #[arg(short = 'x', long = "signature")]
    signature: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    match cli.command {
        Command::Sign(params) => print_signature(params),
        Command::Verify(params) => {
            if !print_verification(params)? {
                std::process::exit(1);
            }
            Ok(())
        },
        Command::Canonical(params) => print_canonical_payload(params),
    }
}
