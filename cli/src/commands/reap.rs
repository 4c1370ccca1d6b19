//! Reap command - wait for, then kill, the descendants of a process.

use anyhow::Result;
use haltkit_core::{Escalation, Pid, ProcessTreeController, Settings};

pub async fn run(pid: Pid, rounds: Option<u32>, settings: Settings, json: bool) -> Result<()> {
    let rounds = rounds.unwrap_or(settings.reap_rounds);
    let controller = ProcessTreeController::for_current_platform(settings)?;

    let outcome = tokio::task::spawn_blocking(move || {
        controller.reap_descendants_with_rounds(pid, rounds)
    })
    .await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        Escalation::Drained { round } => {
            println!("✓ Descendants of {} exited on their own (round {})", pid, round)
        }
        Escalation::Escalated { remaining } => println!(
            "✓ Killed the remaining descendants of {} ({} direct children)",
            pid, remaining
        ),
    }
    Ok(())
}
