//! Config command - show the effective settings.

use anyhow::Result;
use haltkit_core::{ConfigStore, Settings};

pub fn show(store: &ConfigStore, settings: &Settings, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    println!("Config file: {}", store.path().display());
    println!();
    println!("Abort grace:        {} ms", settings.abort_grace_ms);
    println!("Round wait:         {} ms", settings.round_wait_ms);
    println!("Control poll:       {} ms", settings.control_poll_ms);
    println!("Reap rounds:        {}", settings.reap_rounds);
    println!("Activation message: {}", settings.activation_message);
    Ok(())
}
