// Binary entry point for turnstile
// This is a thin wrapper that delegates to the library implementation

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = turnstile::shell::run().await {
        eprintln!("turnstile fatal error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
