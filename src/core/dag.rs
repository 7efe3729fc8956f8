//! Call-graph validation for task references.
//!
//! Before anything runs, the tasks reachable from the requested task are
//! walked depth-first along their task-reference commands. An edge back to a
//! task still on the current path is a cycle; an edge to a task already fully
//! explored through another path is a legal shared dependency.
//!
//! Planning is pure: it spawns nothing and touches no file.

use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use super::task::TaskSet;
use super::types::TaskName;

/// Errors found while planning a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DagError {
    /// A task name absent from the task set.
    #[error("unknown task: `{name}`")]
    UnknownTask { name: TaskName },

    /// A task reference closing a cycle.
    #[error("plan task `{start}`: tasks cycle: calling task `{to}` from task `{from}`")]
    CycleDetected {
        start: TaskName,
        from: TaskName,
        to: TaskName,
    },
}

struct Visit<'a> {
    name: &'a TaskName,
    callees: Vec<&'a TaskName>,
    next: usize,
}

/// Validate that `start` exists and that its call graph is acyclic.
pub fn plan(tasks: &TaskSet, start: &str) -> Result<(), DagError> {
    let Some((start_name, start_task)) = tasks.entry(start) else {
        return Err(DagError::UnknownTask {
            name: TaskName::new(start),
        });
    };

    let mut on_path: HashSet<&TaskName> = HashSet::new();
    let mut explored: HashSet<&TaskName> = HashSet::new();
    let mut edges = 0usize;
    let mut stack = vec![Visit {
        name: start_name,
        callees: start_task.referenced_tasks().collect(),
        next: 0,
    }];
    on_path.insert(start_name);

    while let Some(top) = stack.last_mut() {
        let Some(&callee) = top.callees.get(top.next) else {
            on_path.remove(top.name);
            explored.insert(top.name);
            stack.pop();
            continue;
        };
        top.next += 1;
        edges += 1;
        let caller = top.name;

        let Some((callee, task)) = tasks.entry(callee.as_str()) else {
            return Err(DagError::UnknownTask {
                name: callee.clone(),
            });
        };

        if on_path.contains(callee) {
            return Err(DagError::CycleDetected {
                start: start_name.clone(),
                from: caller.clone(),
                to: callee.clone(),
            });
        }

        if explored.contains(callee) {
            continue;
        }

        on_path.insert(callee);
        stack.push(Visit {
            name: callee,
            callees: task.referenced_tasks().collect(),
            next: 0,
        });
    }

    debug!(
        task = start,
        tasks = explored.len(),
        edges,
        "call graph is acyclic"
    );

    Ok(())
}
