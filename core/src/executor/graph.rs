use std::collections::{HashMap, HashSet};

use crate::error::GraphError;
use crate::plan::{Plan, Task, TaskStatus};

/// A task is ready when it is `pending` and every dependency resolves to a
/// `completed` task. A dependency id with no matching task never resolves.
pub fn is_ready(task: &Task, all_tasks: &[Task]) -> bool {
    if task.status() != TaskStatus::Pending {
        return false;
    }
    task.deps.iter().all(|dep| {
        all_tasks
            .iter()
            .find(|t| t.id == *dep)
            .is_some_and(|t| t.status() == TaskStatus::Completed)
    })
}

/// First ready task in declared order.
pub fn next_ready(tasks: &[Task]) -> Option<&Task> {
    tasks.iter().find(|t| is_ready(t, tasks))
}

/// Ids of every task reachable through `deps` from `task_id` (excluding the
/// task itself). Cycles and dangling ids are tolerated.
pub fn transitive_dependencies(tasks: &[Task], task_id: &str) -> HashSet<String> {
    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut seen = HashSet::new();
    let mut stack: Vec<&str> = by_id
        .get(task_id)
        .map(|t| t.deps.iter().map(String::as_str).collect())
        .unwrap_or_default();

    while let Some(id) = stack.pop() {
        if id == task_id || !seen.insert(id.to_string()) {
            continue;
        }
        if let Some(task) = by_id.get(id) {
            stack.extend(task.deps.iter().map(String::as_str));
        }
    }
    seen
}

/// Dependency graph of a plan, used for the preflight check and for
/// computing a full execution order.
#[derive(Debug, Clone)]
pub struct PlanGraph {
    /// task_id -> list of dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// task_id -> list of tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// task_id -> role title
    roles: HashMap<String, String>,

    known_roles: HashSet<String>,

    /// Declared order (for stable output)
    insertion_order: Vec<String>,
}

impl PlanGraph {
    pub fn from_plan(plan: &Plan) -> Result<Self, GraphError> {
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut roles = HashMap::new();
        let mut insertion_order = Vec::new();

        for task in plan.tasks() {
            if edges.contains_key(&task.id) {
                return Err(GraphError::DuplicateTaskId(task.id.clone()));
            }

            edges.insert(task.id.clone(), task.deps.clone());
            roles.insert(task.id.clone(), task.role_title.clone());
            insertion_order.push(task.id.clone());

            for dep in &task.deps {
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
            }
        }

        let known_roles = plan.roles().iter().map(|r| r.title.clone()).collect();

        Ok(Self {
            edges,
            reverse_edges,
            roles,
            known_roles,
            insertion_order,
        })
    }

    /// Checks self-dependencies, dangling dependencies, unknown roles and
    /// cycles, in that order.
    pub fn validate(&self) -> Result<(), GraphError> {
        for task_id in &self.insertion_order {
            let deps = self.deps_of(task_id);
            if deps.iter().any(|d| d == task_id) {
                return Err(GraphError::SelfDependency(task_id.clone()));
            }
            for dep in deps {
                if !self.edges.contains_key(dep) {
                    return Err(GraphError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
            if let Some(role) = self.roles.get(task_id) {
                if !self.known_roles.contains(role) {
                    return Err(GraphError::RoleNotFound {
                        task_id: task_id.clone(),
                        role: role.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = self.detect_cycle() {
            return Err(GraphError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Order in which the scheduler would dispatch tasks if every task
    /// succeeds: repeatedly take the first task (in declared order) whose
    /// dependencies are all done.
    pub fn execution_order(&self) -> Result<Vec<String>, GraphError> {
        let mut remaining: HashMap<&str, usize> = self
            .insertion_order
            .iter()
            .map(|id| (id.as_str(), self.deps_of(id).len()))
            .collect();
        let mut done: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(self.insertion_order.len());

        while order.len() < self.insertion_order.len() {
            let Some(next) = self
                .insertion_order
                .iter()
                .find(|id| !done.contains(id.as_str()) && remaining.get(id.as_str()) == Some(&0))
            else {
                return Err(GraphError::CircularDependency(
                    "Unable to complete execution order (cycle or missing dependency)".to_string(),
                ));
            };

            done.insert(next.as_str());
            order.push(next.clone());

            if let Some(dependents) = self.reverse_edges.get(next) {
                for dependent in dependents {
                    if let Some(degree) = remaining.get_mut(dependent.as_str()) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }
        }

        Ok(order)
    }

    fn deps_of(&self, task_id: &str) -> &[String] {
        self.edges.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Detect circular dependencies using DFS
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        for dep in self.deps_of(node) {
            // Dependency already on the current path
            if let Some(pos) = stack.iter().position(|x| x == dep) {
                stack.push(dep.clone());
                *stack = stack[pos..].to_vec();
                return true;
            }

            if self.edges.contains_key(dep)
                && !visited.contains(dep)
                && self.dfs_cycle(dep, visited, stack)
            {
                return true;
            }
        }

        stack.pop();
        false
    }
}

/// Runs the full preflight on a plan.
pub fn validate_plan(plan: &Plan) -> Result<(), GraphError> {
    PlanGraph::from_plan(plan)?.validate()
}

fn format_cycle_path(stack: &[String]) -> String {
    stack.join(" -> ")
}
