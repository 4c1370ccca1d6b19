//! Children command - list the direct children of a process.

use anyhow::Result;
use haltkit_core::ports::{ProcessActions, ProcessTable};
use haltkit_core::{Pid, PlatformProcessActions, PlatformProcessTable};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChildEntry {
    pid: Pid,
    running: bool,
}

pub fn run(pid: Pid, json: bool) -> Result<()> {
    let table = PlatformProcessTable::new();
    let actions = PlatformProcessActions::new();

    let children: Vec<ChildEntry> = table
        .children_of(pid)?
        .into_iter()
        .map(|child| ChildEntry {
            pid: child,
            running: actions.is_running(child),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&children)?);
        return Ok(());
    }

    if children.is_empty() {
        println!("Process {} has no children.", pid);
        return Ok(());
    }

    println!("{:<8} STATE", "PID");
    println!("{}", "-".repeat(20));
    for child in &children {
        let state = if child.running { "running" } else { "exited" };
        println!("{:<8} {}", child.pid, state);
    }

    println!("\nTotal: {} children", children.len());
    Ok(())
}
