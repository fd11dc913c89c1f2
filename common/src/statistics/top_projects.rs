use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::utils::modal::ActivityEntry;

/// Anything that carries a project name and a duration in seconds.
pub trait ProjectDuration {
    fn project_name(&self) -> Option<&str>;
    fn duration(&self) -> u64;
}

/// Minimal activity record, for callers that do not hold full [`ActivityEntry`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectActivity {
    pub project_name: Option<String>,
    pub duration: u64,
}

impl ProjectDuration for ProjectActivity {
    fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    fn duration(&self) -> u64 {
        self.duration
    }
}

impl ProjectDuration for ActivityEntry {
    fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    fn duration(&self) -> u64 {
        self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTotal {
    /// `None` is the bucket for entries without a project name.
    pub project_name: Option<String>,
    pub duration: u64,
}

/// Total duration per project, largest first.
///
/// Missing and empty project names share a single `None` bucket. Ties keep
/// the order in which projects first appear in `entries`.
pub fn all_time_top_projects<T>(entries: &[T]) -> Vec<ProjectTotal>
where
    T: ProjectDuration,
{
    let mut index: HashMap<Option<&str>, usize> = HashMap::new();
    let mut totals: Vec<ProjectTotal> = Vec::new();

    for entry in entries {
        let key = entry.project_name().filter(|name| !name.is_empty());
        let slot = *index.entry(key).or_insert_with(|| {
            totals.push(ProjectTotal {
                project_name: key.map(str::to_owned),
                duration: 0,
            });
            totals.len() - 1
        });
        totals[slot].duration += entry.duration();
    }

    totals.sort_by(|a, b| b.duration.cmp(&a.duration));
    totals
}
