use anyhow::{Context, Result};
use order_lifecycle_engine::webhook::{SignatureMode, WebhookVerifier};

use crate::{
    input::{read_body, resolve_secret},
    BodyParams,
    SignParams,
    VerifyParams,
};

pub fn print_signature(params: SignParams) -> Result<()> {
    let body = read_body(params.body.file.as_deref())?;
    let verifier = WebhookVerifier::new(resolve_secret(params.secret)?);
    let signature = verifier.sign(params.mode, &body).context("Could not sign the webhook body")?;
    println!("{signature}");
    Ok(())
}

/// Prints the verdict and returns whether the signature is valid.
pub fn print_verification(params: VerifyParams) -> Result<bool> {
    let VerifyParams { sign, signature } = params;
    let body = read_body(sign.body.file.as_deref())?;
    let verifier = WebhookVerifier::new(resolve_secret(sign.secret)?);
    match verifier.verify(sign.mode, &body, signature.trim()) {
        Ok(()) => {
            println!("✅️ Valid {} signature", sign.mode);
            if sign.mode == SignatureMode::Canonical {
                println!("   Only shipment_id, order_id, event_type and timestamp are covered.");
            }
            Ok(true)
        },
        Err(e) => {
            println!("❌️ {e}");
            if let Ok(expected) = verifier.sign(sign.mode, &body) {
                println!("   Expected: {expected}");
            }
            Ok(false)
        },
    }
}

pub fn print_canonical_payload(params: BodyParams) -> Result<()> {
    let body = read_body(params.file.as_deref())?;
    let canonical = WebhookVerifier::canonical_bytes(&body).context("Could not canonicalize the webhook body")?;
    println!("{}", String::from_utf8_lossy(&canonical));
    Ok(())
}
