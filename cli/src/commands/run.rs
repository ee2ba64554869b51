use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};

use taskforge_core::api::{
    CliError, ExecutionState, Scheduler, SchedulerEvent, SessionError, StepOutcome, TaskStatus,
};
use taskforge_plugins::factory;

use super::cli::RunArgs;
use crate::progress::ProgressMonitor;
use crate::workspace::Workspace;

pub async fn run(ws: &Workspace, args: RunArgs) -> Result<i32, CliError> {
    let mut config = ws.cfg().scheduler.clone();
    if let Some(pacing_ms) = args.pacing_ms {
        config.pacing_ms = pacing_ms;
    }
    let pacing = Duration::from_millis(config.pacing_ms);

    let mut session = ws.open_planned().await?;
    let progress = session
        .plan()
        .map(|plan| plan.progress())
        .ok_or(SessionError::NoPlan)?;

    let executor = factory::build_executor(ws.cfg())?;
    let scheduler = Scheduler::new(executor, config);

    let show_progress = !args.no_progress && atty::is(atty::Stream::Stderr);
    let monitor = ProgressMonitor::new(progress, show_progress);
    let pump = tokio::spawn(pump_events(scheduler.subscribe(), monitor));

    let pause = scheduler.pause_handle();
    {
        let pause = pause.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("ctrl-c received; pausing after the current task");
                pause.request();
            }
        });
    }

    scheduler.start(&mut session)?;
    let outcome = loop {
        if pause.is_requested() && session.state() == ExecutionState::Running {
            scheduler.pause(&mut session)?;
            break StepOutcome::NotRunning {
                state: session.state(),
            };
        }

        let outcome = scheduler.step(&mut session).await?;
        ws.save(&session).await?;
        if !outcome.can_continue() {
            break outcome;
        }
        if !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
    };
    ws.save(&session).await?;

    drop(scheduler);
    let mut monitor = match pump.await {
        Ok(monitor) => monitor,
        Err(e) => return Err(CliError::Command(format!("event pump failed: {e}"))),
    };

    let result = describe(&outcome);
    match &result {
        Ok(msg) => monitor.finish(msg),
        Err(CliError::Paused(msg)) => monitor.finish(msg),
        Err(_) => monitor.finish("stopped"),
    }
    drop(monitor);

    let msg = result?;
    println!("{msg}");
    Ok(0)
}

/// Maps the final outcome to a success message or a paused error.
fn describe(outcome: &StepOutcome) -> Result<String, CliError> {
    match outcome {
        StepOutcome::Finished => Ok("all tasks completed".to_string()),
        StepOutcome::Dispatched {
            task_id,
            status: TaskStatus::Failed,
            ..
        } => Err(CliError::Paused(format!("task '{task_id}' failed"))),
        StepOutcome::Paused { failed } => Err(CliError::Paused(format!(
            "failed task(s): {}",
            failed.join(", ")
        ))),
        StepOutcome::Stalled { pending } => Err(CliError::Paused(format!(
            "no task is ready; waiting on: {}",
            pending.join(", ")
        ))),
        StepOutcome::NotRunning { state } => {
            Err(CliError::Paused(format!("execution stopped ({state})")))
        }
        StepOutcome::Busy { task_id } => {
            Err(CliError::Paused(format!("task '{task_id}' is still in flight")))
        }
        StepOutcome::Dispatched { task_id, .. } => Ok(format!("task '{task_id}' completed")),
    }
}

async fn pump_events(
    mut rx: broadcast::Receiver<SchedulerEvent>,
    mut monitor: ProgressMonitor,
) -> ProgressMonitor {
    loop {
        match rx.recv().await {
            Ok(event) => {
                log_event(&event);
                match &event {
                    SchedulerEvent::TaskStarted { task_id, role, .. } => {
                        monitor.start_task(task_id, role)
                    }
                    SchedulerEvent::TaskCompleted {
                        task_id,
                        duration_ms,
                        ..
                    } => monitor.complete_task(task_id, true, *duration_ms),
                    SchedulerEvent::TaskFailed {
                        task_id,
                        duration_ms,
                        ..
                    } => monitor.complete_task(task_id, false, *duration_ms),
                    SchedulerEvent::StateChanged { to, .. } => monitor.set_message(to.as_str()),
                    SchedulerEvent::Stalled { .. } => monitor.set_message("stalled"),
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "dropped scheduler events");
            }
            Err(RecvError::Closed) => return monitor,
        }
    }
}

fn log_event(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::StateChanged { from, to, .. } => {
            tracing::debug!("execution {} -> {}", from, to);
        }
        SchedulerEvent::TaskStarted { task_id, role, .. } => {
            tracing::debug!(task_id = %task_id, role = %role, "task started");
        }
        SchedulerEvent::TaskCompleted {
            task_id,
            artifact_id,
            duration_ms,
            ..
        } => {
            tracing::info!(
                task_id = %task_id,
                artifact_id = artifact_id.as_deref().unwrap_or("-"),
                "task completed in {}ms",
                duration_ms
            );
        }
        SchedulerEvent::TaskFailed { task_id, error, .. } => {
            tracing::error!(task_id = %task_id, "task failed: {}", error);
        }
        SchedulerEvent::Stalled { pending, .. } => {
            tracing::warn!(pending = ?pending, "execution stalled");
        }
    }
}
