mod common;

use std::sync::Arc;

use common::{fast_config, plan, session_with, task, Script, ScriptedExecutor};
use pretty_assertions::assert_eq;
use taskforge_core::api::{
    AgentOutput, ContextMode, ExecutionState, GraphError, PlanError, Scheduler,
    SchedulerConfig, SchedulerEvent, SessionError, StepOutcome, Task, TaskStatus, Team,
};

#[tokio::test]
async fn runs_acyclic_plan_to_finished_in_dependency_order() {
    let executor = ScriptedExecutor::new();
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session = session_with(plan(vec![
        task("report", &["analyze"]),
        task("collect", &[]),
        task("analyze", &["collect"]),
    ]))
    .await;

    scheduler.start(&mut session).unwrap();
    let outcome = scheduler.run(&mut session).await.unwrap();

    assert_eq!(outcome, StepOutcome::Finished);
    assert_eq!(session.state(), ExecutionState::Finished);
    assert_eq!(executor.call_order(), vec!["collect", "analyze", "report"]);
    assert!(session.plan().unwrap().all_completed());
    assert_eq!(
        session.plan().unwrap().task("report").unwrap().output(),
        Some("done:report")
    );
    assert_eq!(session.in_flight(), None);
}

#[tokio::test]
async fn never_more_than_one_task_in_flight() {
    let executor = ScriptedExecutor::new();
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session = session_with(plan(vec![
        task("a", &[]),
        task("b", &[]),
        task("c", &["a"]),
        task("d", &["b", "c"]),
    ]))
    .await;

    scheduler.start(&mut session).unwrap();
    scheduler.run(&mut session).await.unwrap();

    assert_eq!(executor.max_concurrent(), 1);
    assert_eq!(executor.calls().len(), 4);
}

#[tokio::test]
async fn failure_pauses_and_resume_stays_paused() {
    let executor = ScriptedExecutor::new();
    executor.script("only", Script::Fail("boom".into()));
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session = session_with(plan(vec![task("only", &[])])).await;

    scheduler.start(&mut session).unwrap();
    let outcome = scheduler.step(&mut session).await.unwrap();
    assert_eq!(
        outcome,
        StepOutcome::Dispatched {
            task_id: "only".into(),
            status: TaskStatus::Failed,
            artifact_id: None,
        }
    );
    let failed = session.plan().unwrap().task("only").unwrap();
    assert_eq!(failed.status(), TaskStatus::Failed);
    assert_eq!(failed.error(), Some("boom"));
    assert_eq!(session.state(), ExecutionState::Paused);

    scheduler.resume(&mut session).unwrap();
    let outcome = scheduler.step(&mut session).await.unwrap();
    assert_eq!(
        outcome,
        StepOutcome::Paused {
            failed: vec!["only".into()]
        }
    );
    assert_eq!(session.state(), ExecutionState::Paused);
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn panicking_executor_fails_the_task_and_clears_in_flight() {
    let executor = ScriptedExecutor::new();
    executor.script("crash", Script::Panic("kaboom".into()));
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session = session_with(plan(vec![task("crash", &[]), task("after", &[])])).await;

    scheduler.start(&mut session).unwrap();
    let outcome = scheduler.step(&mut session).await.unwrap();

    assert_eq!(
        outcome,
        StepOutcome::Dispatched {
            task_id: "crash".into(),
            status: TaskStatus::Failed,
            artifact_id: None,
        }
    );
    assert_eq!(session.in_flight(), None);
    assert_eq!(session.state(), ExecutionState::Paused);
    let crashed = session.plan().unwrap().task("crash").unwrap();
    assert_eq!(crashed.status(), TaskStatus::Failed);
    assert_eq!(crashed.error(), Some("executor panicked: kaboom"));

    scheduler.resume(&mut session).unwrap();
    let outcome = scheduler.step(&mut session).await.unwrap();
    assert!(matches!(outcome, StepOutcome::Dispatched { ref task_id, .. } if task_id == "after"));
}

#[tokio::test]
async fn failure_leaves_independent_work_for_resume() {
    let executor = ScriptedExecutor::new();
    executor.script("a", Script::Fail("bad input".into()));
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session = session_with(plan(vec![
        task("a", &[]),
        task("b", &["a"]),
        task("c", &[]),
    ]))
    .await;

    scheduler.start(&mut session).unwrap();
    let outcome = scheduler.run(&mut session).await.unwrap();
    assert!(matches!(
        outcome,
        StepOutcome::Dispatched {
            status: TaskStatus::Failed,
            ..
        }
    ));

    scheduler.resume(&mut session).unwrap();
    let outcome = scheduler.run(&mut session).await.unwrap();
    assert_eq!(
        outcome,
        StepOutcome::Paused {
            failed: vec!["a".into()]
        }
    );
    let plan = session.plan().unwrap();
    assert_eq!(plan.task("b").unwrap().status(), TaskStatus::Pending);
    assert_eq!(plan.task("c").unwrap().status(), TaskStatus::Completed);
    assert_eq!(executor.call_order(), vec!["a", "c"]);
}

#[tokio::test]
async fn mutual_dependency_stalls_without_state_change() {
    let executor = ScriptedExecutor::new();
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut events = scheduler.subscribe();
    let mut session = session_with(plan(vec![task("a", &["b"]), task("b", &["a"])])).await;

    scheduler.start(&mut session).unwrap();
    for _ in 0..3 {
        let outcome = scheduler.step(&mut session).await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Stalled {
                pending: vec!["a".into(), "b".into()]
            }
        );
        assert_eq!(session.state(), ExecutionState::Running);
    }
    assert!(executor.calls().is_empty());

    let outcome = scheduler.run(&mut session).await.unwrap();
    assert!(matches!(outcome, StepOutcome::Stalled { .. }));

    let first = events.recv().await.unwrap();
    assert!(matches!(
        first,
        SchedulerEvent::StateChanged {
            to: ExecutionState::Running,
            ..
        }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        SchedulerEvent::Stalled { .. }
    ));
}

#[tokio::test]
async fn strict_graph_refuses_cyclic_plan() {
    let executor = ScriptedExecutor::new();
    let config = SchedulerConfig {
        strict_graph: true,
        ..fast_config()
    };
    let scheduler = Scheduler::new(executor, config);
    let mut session = session_with(plan(vec![task("a", &["b"]), task("b", &["a"])])).await;

    let err = scheduler.start(&mut session).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Graph(GraphError::CircularDependency(_))
    ));
    assert_eq!(session.state(), ExecutionState::Idle);
}

#[tokio::test]
async fn step_does_nothing_unless_running() {
    let executor = ScriptedExecutor::new();
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session = session_with(plan(vec![task("a", &[])])).await;

    let outcome = scheduler.step(&mut session).await.unwrap();
    assert_eq!(
        outcome,
        StepOutcome::NotRunning {
            state: ExecutionState::Idle
        }
    );
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn pause_request_stops_before_next_dispatch() {
    let executor = ScriptedExecutor::new();
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session = session_with(plan(vec![task("a", &[]), task("b", &[])])).await;

    scheduler.start(&mut session).unwrap();
    scheduler.step(&mut session).await.unwrap();
    scheduler.pause_handle().request();

    let outcome = scheduler.run(&mut session).await.unwrap();
    assert_eq!(
        outcome,
        StepOutcome::NotRunning {
            state: ExecutionState::Paused
        }
    );
    assert_eq!(executor.call_order(), vec!["a"]);

    scheduler.resume(&mut session).unwrap();
    assert_eq!(
        scheduler.run(&mut session).await.unwrap(),
        StepOutcome::Finished
    );
}

#[tokio::test]
async fn edits_rejected_while_running_allowed_when_paused() {
    let executor = ScriptedExecutor::new();
    let scheduler = Scheduler::new(executor, fast_config());
    let mut session = session_with(plan(vec![task("a", &[])])).await;

    scheduler.start(&mut session).unwrap();
    assert_eq!(
        session.add_task(task("late", &[])),
        Err(PlanError::EditWhileRunning)
    );

    scheduler.pause(&mut session).unwrap();
    session.add_task(task("late", &["a"])).unwrap();
    scheduler.resume(&mut session).unwrap();
    assert_eq!(
        scheduler.run(&mut session).await.unwrap(),
        StepOutcome::Finished
    );
}

#[tokio::test]
async fn missing_role_fails_the_task() {
    let executor = ScriptedExecutor::new();
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session =
        session_with(plan(vec![Task::new("orphan", "no role", "ghost-role")])).await;

    scheduler.start(&mut session).unwrap();
    scheduler.step(&mut session).await.unwrap();

    let task = session.plan().unwrap().task("orphan").unwrap();
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.error(), Some("role 'ghost-role' not found in plan"));
    assert_eq!(session.state(), ExecutionState::Paused);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn artifacts_flow_into_later_context() {
    let executor = ScriptedExecutor::new();
    executor.with_files("design", &[("design.md", "v1")]);
    executor.with_files("build", &[("src/main.rs", "fn main() {}")]);
    let scheduler = Scheduler::new(executor.clone(), fast_config());
    let mut session = session_with(plan(vec![
        task("design", &[]),
        task("build", &["design"]),
        task("review", &["build"]),
    ]))
    .await;

    scheduler.start(&mut session).unwrap();
    scheduler.run(&mut session).await.unwrap();

    let calls = executor.calls();
    assert_eq!(calls[0].context, Vec::<String>::new());
    assert_eq!(calls[1].context, vec!["design"]);
    assert_eq!(calls[2].context, vec!["design", "build"]);
    assert_eq!(calls[2].goal, "build the thing");
    assert_eq!(calls[2].role, "dev");

    let plan = session.plan().unwrap();
    let design_artifact = plan.task("design").unwrap().artifact_id().unwrap();
    assert!(session.artifacts().get(design_artifact).is_some());
    assert_eq!(plan.task("review").unwrap().artifact_id(), None);
    assert_eq!(session.artifacts().len(), 2);
}

#[tokio::test]
async fn dependency_context_mode_filters_unrelated_artifacts() {
    let executor = ScriptedExecutor::new();
    executor.with_files("docs", &[("README.md", "hi")]);
    executor.with_files("core", &[("lib.rs", "")]);
    let config = SchedulerConfig {
        context_mode: ContextMode::Dependencies,
        ..fast_config()
    };
    let scheduler = Scheduler::new(executor.clone(), config);
    let mut session = session_with(plan(vec![
        task("docs", &[]),
        task("core", &[]),
        task("cli", &["core"]),
    ]))
    .await;

    scheduler.start(&mut session).unwrap();
    scheduler.run(&mut session).await.unwrap();

    let cli_call = executor
        .calls()
        .into_iter()
        .find(|c| c.task_id == "cli")
        .unwrap();
    assert_eq!(cli_call.context, vec!["core"]);
}

#[tokio::test]
async fn team_metadata_is_merged_into_plan() {
    let executor = ScriptedExecutor::new();
    let output = AgentOutput {
        team: Some(Team {
            notes: Some("pair on the parser".into()),
            prompts: vec![],
        }),
        ..AgentOutput::text("ok")
    };
    executor.script("a", Script::Ok(output));
    let scheduler = Scheduler::new(executor, fast_config());
    let mut session = session_with(plan(vec![task("a", &[])])).await;

    scheduler.start(&mut session).unwrap();
    scheduler.run(&mut session).await.unwrap();

    assert_eq!(
        session.plan().unwrap().team_notes(),
        Some("pair on the parser")
    );
}

#[tokio::test]
async fn empty_plan_finishes_immediately() {
    let scheduler = Scheduler::new(Arc::new(ScriptedExecutor::default()), fast_config());
    let mut session = session_with(plan(vec![])).await;

    scheduler.start(&mut session).unwrap();
    assert_eq!(
        scheduler.step(&mut session).await.unwrap(),
        StepOutcome::Finished
    );
    assert!(scheduler.start(&mut session).is_err());
}
