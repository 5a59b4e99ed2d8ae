//! Dense integer ids for tasks.
//!
//! Task ids are mapped once per scheduler build; both CPM passes then work on
//! plain vectors indexed by [`TaskIdx`], in the order the tasks were given.

use rustc_hash::FxHashMap;

use crate::error::SchedulingError;

/// Position of a task in the input slice.
pub type TaskIdx = u32;

/// Two-way map between task ids and their [`TaskIdx`].
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    by_id: FxHashMap<String, TaskIdx>,
    ids: Vec<String>,
}

impl TaskIndex {
    /// Number the ids in iteration order. A repeated id is a configuration error.
    pub fn from_ids<'a>(ids: impl ExactSizeIterator<Item = &'a str>) -> Result<Self, SchedulingError> {
        let mut by_id = FxHashMap::with_capacity_and_hasher(ids.len(), Default::default());
        let mut numbered = Vec::with_capacity(ids.len());
        for id in ids {
            let idx = numbered.len() as TaskIdx;
            if by_id.insert(id.to_string(), idx).is_some() {
                return Err(SchedulingError::Configuration(format!(
                    "duplicate task id: {}",
                    id
                )));
            }
            numbered.push(id.to_string());
        }
        Ok(Self {
            by_id,
            ids: numbered,
        })
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<TaskIdx> {
        self.by_id.get(id).copied()
    }

    #[inline]
    pub fn resolve(&self, idx: TaskIdx) -> Option<&str> {
        self.ids.get(idx as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
