use anyhow::{anyhow, Result};
use dotenv::dotenv;
use rand::rngs::OsRng;
use rand::TryRngCore;

use meteora_lp_console::config;
use meteora_lp_console::db::ClientStore;

const SECRET_BYTES: usize = 32;

/// Random bytes from the OS, base58 encoded for easy copy/paste into the agent's env
fn generate_secret() -> Result<String> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| anyhow!("OS random source unavailable: {}", e))?;
    Ok(bs58::encode(bytes).into_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = config::load_config()?;

    let secret = generate_secret()?;

    let store = ClientStore::new(&config.database_path).await?;
    store.save_secret(&secret).await?;

    println!("Generated new shared secret:");
    println!("Stored in: {}", config.database_path);
    println!("Secret: {}", secret);
    println!("Configure the agent with the same value to accept commands from this console.");

    Ok(())
}
