//! Foreground command - raise the windows of a process tree.

use anyhow::Result;
use haltkit_core::{Escalation, Pid, ProcessTreeController, Settings};

pub async fn run(pid: Pid, settings: Settings, json: bool) -> Result<()> {
    let controller = ProcessTreeController::for_current_platform(settings)?;
    let outcome = tokio::task::spawn_blocking(move || controller.raise_to_foreground(pid)).await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        Escalation::Drained { .. } => println!("Process {} has no descendants.", pid),
        Escalation::Escalated { remaining } => {
            println!("✓ Raised descendants of {} ({} direct children)", pid, remaining)
        }
    }
    Ok(())
}
