#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taskforge_core::api::{
    AgentOutput, Artifact, ExecutorError, File, InMemoryArtifactRepository, Plan, Planner,
    PlanningError, Role, SchedulerConfig, Session, Task, TaskExecutor,
};

/// What the scripted executor does for one task id.
#[derive(Clone)]
pub enum Script {
    Ok(AgentOutput),
    Fail(String),
    Panic(String),
}

#[derive(Debug, Clone)]
pub struct Call {
    pub task_id: String,
    pub role: String,
    pub goal: String,
    /// Task ids of the context artifacts, in order.
    pub context: Vec<String>,
}

/// Executor that answers from a per-task script. Tasks without a script
/// succeed with output `done:<id>` and no files.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<Call>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, task_id: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(task_id.to_string(), script);
    }

    pub fn with_files(&self, task_id: &str, files: &[(&str, &str)]) {
        let files = files.iter().map(|(p, c)| File::new(*p, *c)).collect();
        self.script(
            task_id,
            Script::Ok(AgentOutput::text(format!("done:{task_id}")).with_files(files)),
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_order(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.task_id).collect()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute(
        &self,
        task: &Task,
        role: &Role,
        goal: &str,
        context: &[Artifact],
    ) -> Result<AgentOutput, ExecutorError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        self.calls.lock().unwrap().push(Call {
            task_id: task.id.clone(),
            role: role.title.clone(),
            goal: goal.to_string(),
            context: context.iter().map(|a| a.task_id.clone()).collect(),
        });
        tokio::task::yield_now().await;

        let script = self.scripts.lock().unwrap().get(&task.id).cloned();
        self.active.fetch_sub(1, Ordering::SeqCst);

        match script {
            Some(Script::Ok(output)) => Ok(output),
            Some(Script::Fail(msg)) => Err(ExecutorError::Execution(msg)),
            Some(Script::Panic(msg)) => panic!("{msg}"),
            None => Ok(AgentOutput::text(format!("done:{}", task.id))),
        }
    }
}

/// Planner that hands back a fixed plan, or fails.
pub struct ScriptedPlanner {
    pub plan: Option<Plan>,
    pub seen_files: Mutex<Vec<File>>,
}

impl ScriptedPlanner {
    pub fn returning(plan: Plan) -> Self {
        Self {
            plan: Some(plan),
            seen_files: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            plan: None,
            seen_files: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn plan(&self, _goal: &str, initial_files: &[File]) -> Result<Plan, PlanningError> {
        *self.seen_files.lock().unwrap() = initial_files.to_vec();
        self.plan
            .clone()
            .ok_or_else(|| PlanningError::Request("planner offline".to_string()))
    }
}

pub fn task(id: &str, deps: &[&str]) -> Task {
    Task::new(id, format!("work on {id}"), "dev").with_deps(deps.iter().copied())
}

pub fn plan(tasks: Vec<Task>) -> Plan {
    Plan::new(
        "build the thing",
        "split by layer",
        vec![Role::new("dev", "writes code")],
        tasks,
    )
}

pub async fn session_with(plan: Plan) -> Session {
    let mut session = Session::new(Arc::new(InMemoryArtifactRepository::new()));
    session
        .replace_plan(plan)
        .await
        .expect("replace plan in fresh session");
    session
}

pub fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        pacing_ms: 0,
        ..SchedulerConfig::default()
    }
}
