//! Dependency graph over interned task indices.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use super::types::Relation;
use crate::error::SchedulingError;
use crate::interner::{TaskIdx, TaskIndex};
use crate::models::{Dependency, Task};

/// Validated, acyclic dependency graph for one project snapshot.
///
/// Adjacency lists are indexed by [`TaskIdx`], which follows the order of the
/// task slice the graph was built from.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    index: TaskIndex,
    predecessors: Vec<Vec<(TaskIdx, Relation)>>,
    successors: Vec<Vec<(TaskIdx, Relation)>>,
    topo_order: Vec<TaskIdx>,
}

impl DependencyGraph {
    /// Build and validate the graph.
    ///
    /// Fails on duplicate task ids, dependencies naming unknown tasks, and cycles.
    pub fn build(tasks: &[Task], dependencies: &[Dependency]) -> Result<Self, SchedulingError> {
        let index = TaskIndex::from_ids(tasks.iter().map(|t| t.id.as_str()))?;
        let n = index.len();

        let mut predecessors: Vec<Vec<(TaskIdx, Relation)>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<(TaskIdx, Relation)>> = vec![Vec::new(); n];

        for dep in dependencies {
            let pred = index
                .get(&dep.predecessor_id)
                .ok_or_else(|| SchedulingError::unknown_task(&dep.predecessor_id))?;
            let succ = index
                .get(&dep.successor_id)
                .ok_or_else(|| SchedulingError::unknown_task(&dep.successor_id))?;
            let relation = Relation::from(dep);
            predecessors[succ as usize].push((pred, relation));
            successors[pred as usize].push((succ, relation));
        }

        let topo_order = topological_sort(tasks, &index, &predecessors, &successors)?;

        Ok(Self {
            index,
            predecessors,
            successors,
            topo_order,
        })
    }

    pub fn index(&self) -> &TaskIndex {
        &self.index
    }

    #[inline]
    pub fn predecessors(&self, idx: TaskIdx) -> &[(TaskIdx, Relation)] {
        &self.predecessors[idx as usize]
    }

    #[inline]
    pub fn successors(&self, idx: TaskIdx) -> &[(TaskIdx, Relation)] {
        &self.successors[idx as usize]
    }

    #[inline]
    pub fn has_successors(&self, idx: TaskIdx) -> bool {
        !self.successors[idx as usize].is_empty()
    }

    /// Every task, predecessors before successors.
    pub fn topo_order(&self) -> &[TaskIdx] {
        &self.topo_order
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Kahn's algorithm with a deterministic ready set.
///
/// Ready tasks are released by (priority, name, id) so the same snapshot always
/// yields the same order.
fn topological_sort(
    tasks: &[Task],
    index: &TaskIndex,
    predecessors: &[Vec<(TaskIdx, Relation)>],
    successors: &[Vec<(TaskIdx, Relation)>],
) -> Result<Vec<TaskIdx>, SchedulingError> {
    let n = index.len();
    let mut in_degree: Vec<usize> = predecessors.iter().map(|p| p.len()).collect();

    let key = move |idx: TaskIdx| {
        let task = &tasks[idx as usize];
        Reverse((task.priority, task.name.as_str(), task.id.as_str(), idx))
    };

    let mut ready: BinaryHeap<_> = (0..n as TaskIdx)
        .filter(|&idx| in_degree[idx as usize] == 0)
        .map(key)
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse((_, _, _, idx))) = ready.pop() {
        order.push(idx);
        for &(succ, _) in &successors[idx as usize] {
            let degree = &mut in_degree[succ as usize];
            *degree -= 1;
            if *degree == 0 {
                ready.push(key(succ));
            }
        }
    }

    if order.len() != n {
        let (predecessor, successor) = find_cycle_edge(&in_degree, predecessors);
        return Err(SchedulingError::Cycle {
            predecessor: index.resolve(predecessor).unwrap_or_default().to_string(),
            successor: index.resolve(successor).unwrap_or_default().to_string(),
        });
    }

    Ok(order)
}

/// Find one edge lying on a cycle among the tasks Kahn's algorithm left behind.
///
/// Every leftover task still has a leftover predecessor, so walking predecessors
/// from the lowest leftover index must revisit a task; the edge that closes the
/// loop is on the cycle.
fn find_cycle_edge(
    in_degree: &[usize],
    predecessors: &[Vec<(TaskIdx, Relation)>],
) -> (TaskIdx, TaskIdx) {
    let blocked = |idx: TaskIdx| in_degree[idx as usize] > 0;

    let Some(mut current) = (0..in_degree.len() as TaskIdx).find(|&idx| blocked(idx)) else {
        return (0, 0);
    };
    let mut visited = FxHashSet::default();
    loop {
        visited.insert(current);
        let Some(&(pred, _)) = predecessors[current as usize]
            .iter()
            .find(|(pred, _)| blocked(*pred))
        else {
            return (current, current);
        };
        if visited.contains(&pred) {
            return (pred, current);
        }
        current = pred;
    }
}
