//! Prompt rendering and response parsing for the AI service.

use serde::Deserialize;
use taskforge_core::api::{AgentOutput, Artifact, File, Plan, Role, Task, Team};

pub(crate) const PLANNER_SYSTEM_PROMPT: &str = "\
You are an expert Project Manager and System Architect.
Break the objective down into a step-by-step execution plan.
The plan must:
1. Define specialized roles, each with a title and a purpose.
2. Define specific tasks, each assigned to one role title (and optionally an agent).
3. Give tasks logical dependencies through `deps`, listing ids of tasks that must finish first.
4. Explain the structure of the plan in `reasoning`.
Task ids are short snake_case strings such as `init_setup` or `research_topic`.
Respond with a single JSON object:
{\"high_level_goal\": string, \"reasoning\": string,
 \"roles\": [{\"title\": string, \"purpose\": string}],
 \"tasks\": [{\"id\": string, \"description\": string, \"role\": string, \"agent\": string|null, \"deps\": [string]}],
 \"team\": {\"notes\": string|null}|null}";

pub(crate) const EXECUTOR_SYSTEM_PROMPT: &str = "\
You are one member of a team executing a plan. Do the task you are given and \
respond with a single JSON object.";

pub(crate) fn planner_prompt(goal: &str, initial_files: &[File]) -> String {
    let mut prompt = format!("The goal is: {goal}");
    if !initial_files.is_empty() {
        prompt.push_str("\n\nINITIAL CONTEXT FILES PROVIDED BY USER:\n");
        for file in initial_files {
            prompt.push_str(&format!(
                "\n--- START FILE: {} ---\n{}\n--- END FILE ---\n",
                file.path, file.content
            ));
        }
        prompt.push_str(
            "\nUse these files to understand the requirements, existing code, \
             or data structures when creating the plan.",
        );
    }
    prompt
}

pub(crate) fn render_context(context: &[Artifact]) -> String {
    if context.is_empty() {
        return "No previous context.".to_string();
    }
    context
        .iter()
        .map(|artifact| {
            let files = artifact
                .files
                .iter()
                .map(|f| format!("FILE: {}\nCONTENT:\n{}", f.path, f.content))
                .collect::<Vec<_>>()
                .join("\n\n");
            format!(
                "--- ARTIFACT FROM TASK: {} ---\n{}\n--- END ARTIFACT ---",
                artifact.task_id, files
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn executor_prompt(task: &Task, role: &Role, goal: &str, context: &[Artifact]) -> String {
    let agent_line = task
        .agent_hint
        .as_deref()
        .map(|a| format!("AGENT: {a}\n"))
        .unwrap_or_default();
    format!(
        "GOAL: {goal}\n\n\
         CURRENT TASK:\n\
         ID: {id}\n\
         Description: {description}\n\n\
         YOUR ROLE: {title}\n\
         PURPOSE: {purpose}\n\
         {agent_line}\n\
         PREVIOUS CONTEXT:\n\
         {context}\n\n\
         INSTRUCTIONS:\n\
         Execute the task. Return a structured JSON response.\n\
         1. 'reasoning': Explain your thought process.\n\
         2. 'output': A summary of your work.\n\
         3. 'artifact': (Optional) If you created code or files, provide them here as \
         {{\"files\": [{{\"path\": ..., \"content\": ...}}]}}.\n",
        id = task.id,
        description = task.description,
        title = role.title,
        purpose = role.purpose,
        context = render_context(context),
    )
}

/// Removes a surrounding Markdown code fence, if any.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub(crate) fn parse_agent_output(text: &str) -> Result<AgentOutput, String> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err("empty response".to_string());
    }
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| format!("agent produced invalid JSON: {e}"))?;
    if !value.is_object() {
        return Err("agent response must be a JSON object".to_string());
    }
    serde_json::from_value::<AgentOutput>(value)
        .map_err(|e| format!("agent response has the wrong shape: {e}"))
}

#[derive(Debug, Deserialize)]
struct TaskDraft {
    id: String,
    description: String,
    role: String,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    deps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlanDraft {
    #[serde(default)]
    high_level_goal: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(default)]
    tasks: Vec<TaskDraft>,
    #[serde(default)]
    team: Option<Team>,
}

/// Parses the planner's JSON. Every task comes back `pending`; a missing
/// goal falls back to the one that was requested.
pub(crate) fn parse_plan(text: &str, requested_goal: &str) -> Result<Plan, String> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err("empty response".to_string());
    }
    let draft: PlanDraft =
        serde_json::from_str(body).map_err(|e| format!("planner produced invalid JSON: {e}"))?;
    if draft.tasks.is_empty() {
        return Err("plan has no tasks".to_string());
    }

    let goal = if draft.high_level_goal.trim().is_empty() {
        requested_goal.to_string()
    } else {
        draft.high_level_goal
    };
    let tasks = draft
        .tasks
        .into_iter()
        .map(|t| {
            let task = Task::new(t.id.trim(), t.description, t.role.trim()).with_deps(t.deps);
            match t.agent.filter(|a| !a.trim().is_empty()) {
                Some(agent) => task.with_agent(agent),
                None => task,
            }
        })
        .collect();

    let plan = Plan::new(goal, draft.reasoning, draft.roles, tasks);
    Ok(match draft.team {
        Some(team) => plan.with_team(team),
        None => plan,
    })
}
