//! Announce command - broadcast the activation window message.

use anyhow::Result;
use haltkit_core::broadcast_activation;

pub fn run(name: &str, json: bool) -> Result<()> {
    let message = broadcast_activation(name)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "name": name, "messageId": message })
        );
    } else {
        println!("✓ Broadcast {} (message {:#x})", name, message);
    }
    Ok(())
}
