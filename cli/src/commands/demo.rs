//! Demo command - run a heartbeat worker and stop it with escalation.

use std::time::Duration;

use anyhow::Result;
use haltkit_core::{RunOutcome, Settings, TerminableWorker};
use serde::Serialize;

/// Options given on the command line.
pub struct DemoOptions {
    pub label: String,
    pub cooperative: bool,
    pub run_for: Duration,
    pub cooperative_timeout: Duration,
}

/// Parameters handed to each worker run.
#[derive(Clone)]
struct Heartbeat {
    label: String,
    interval: Duration,
    cooperative: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoReport {
    label: String,
    cooperative: bool,
    escalated: bool,
    still_alive: bool,
    outcome: Option<RunOutcome>,
    last_error: Option<String>,
}

pub async fn run(options: DemoOptions, settings: Settings, json: bool) -> Result<()> {
    let report = tokio::task::spawn_blocking(move || drive(options, &settings)).await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Worker:      {}", report.label);
    println!(
        "Mode:        {}",
        if report.cooperative { "cooperative" } else { "non-cooperative" }
    );
    println!("Escalated:   {}", if report.escalated { "yes" } else { "no" });
    println!("Still alive: {}", if report.still_alive { "yes" } else { "no" });
    match report.outcome {
        Some(outcome) => println!("Outcome:     {:?}", outcome),
        None => println!("Outcome:     -"),
    }
    println!(
        "Last error:  {}",
        report.last_error.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn drive(options: DemoOptions, settings: &Settings) -> Result<DemoReport> {
    let mut worker = TerminableWorker::builder()
        .work_with_arg(|beat: Heartbeat, signal| {
            let mut count = 0u64;
            loop {
                if beat.cooperative {
                    signal.check()?;
                } else if signal.is_aborted() {
                    // Deaf to polite requests; only the abort gets through.
                    return signal.check();
                }
                count += 1;
                eprintln!("{} is alive ({})", beat.label, count);
                std::thread::sleep(beat.interval);
            }
        })
        .name("haltkit-demo")
        .settings(settings)
        .build()?;

    worker.start_with(Heartbeat {
        label: options.label.clone(),
        interval: Duration::from_millis(100),
        cooperative: options.cooperative,
    })?;

    std::thread::sleep(options.run_for);
    worker.request_cancel();

    let mut escalated = false;
    if !worker.wait_until_finished(options.cooperative_timeout) {
        escalated = true;
        worker.force_abort();
        // Give the heartbeat one interval to notice before reporting.
        worker.wait_until_finished(Duration::from_millis(200));
    }

    Ok(DemoReport {
        label: options.label,
        cooperative: options.cooperative,
        escalated,
        still_alive: worker.is_alive(),
        outcome: worker.last_outcome(),
        last_error: worker.last_error().map(|e| e.to_string()),
    })
}
