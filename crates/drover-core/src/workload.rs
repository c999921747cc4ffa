use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse lifecycle vocabulary used by the orchestration layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Running,
    Succeeded,
    Failed,
    /// Kept for snapshot shapes the rules below do not cover; [`derive`] never returns it.
    Unknown,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Running => "Running",
            LifecycleState::Succeeded => "Succeeded",
            LifecycleState::Failed => "Failed",
            LifecycleState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = std::convert::Infallible;

    /// Unrecognised names map to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Running" => LifecycleState::Running,
            "Succeeded" => LifecycleState::Succeeded,
            "Failed" => LifecycleState::Failed,
            _ => LifecycleState::Unknown,
        })
    }
}

/// The raw workload fields status derivation looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    /// Completion timestamp as reported by the cluster. Only presence matters.
    pub completion_time: Option<String>,
    /// Declared number of successful completions (`spec.completions`).
    pub required_completions: Option<i32>,
    /// Observed succeeded pod count (`status.succeeded`).
    pub succeeded: Option<i32>,
    /// Condition types in the order the cluster reported them.
    pub condition_types: Vec<String>,
}

const FAILED_CONDITION: &str = "Failed";

/// Pure status derivation. First matching rule wins:
/// 1. no completion timestamp -> Running
/// 2. any `Failed` condition -> Failed
/// 3. succeeded count meets the declared completions (or is positive when none is declared) -> Succeeded
/// 4. otherwise Running (completed but short of the target)
pub fn derive(snapshot: &WorkloadSnapshot) -> LifecycleState {
    if snapshot.completion_time.is_none() {
        return LifecycleState::Running;
    }

    if snapshot.condition_types.iter().any(|t| t == FAILED_CONDITION) {
        return LifecycleState::Failed;
    }

    if let Some(succeeded) = snapshot.succeeded {
        let met = match snapshot.required_completions {
            Some(required) => succeeded >= required,
            None => succeeded > 0,
        };
        if met {
            return LifecycleState::Succeeded;
        }
    }

    LifecycleState::Running
}

impl WorkloadSnapshot {
    /// Extract a snapshot from a Kubernetes `batch/v1` Job object.
    ///
    /// Never fails: anything missing, null or of the wrong type reads as absent.
    pub fn from_job_manifest(job: &Value) -> Self {
        let completion_time = match job.pointer("/status/completionTime") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::String(_)) | Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        let condition_types = job
            .pointer("/status/conditions")
            .and_then(Value::as_array)
            .map(|conds| {
                conds
                    .iter()
                    .filter_map(|c| c.get("type").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            completion_time,
            required_completions: int32_at(job, "/spec/completions"),
            succeeded: int32_at(job, "/status/succeeded"),
            condition_types,
        }
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        derive(self)
    }
}

fn int32_at(v: &Value, pointer: &str) -> Option<i32> {
    v.pointer(pointer)
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed() -> WorkloadSnapshot {
        WorkloadSnapshot {
            completion_time: Some("2024-01-01T00:00:00Z".into()),
            ..Default::default()
        }
    }

    #[test]
    fn not_completed_is_running() {
        let snap = WorkloadSnapshot {
            completion_time: None,
            required_completions: Some(1),
            succeeded: Some(1),
            condition_types: vec!["Failed".into()],
        };
        assert_eq!(derive(&snap), LifecycleState::Running);
    }

    #[test]
    fn failed_condition_wins_over_success() {
        let snap = WorkloadSnapshot {
            required_completions: Some(1),
            succeeded: Some(1),
            condition_types: vec!["Complete".into(), "Failed".into()],
            ..completed()
        };
        assert_eq!(derive(&snap), LifecycleState::Failed);
    }

    #[test]
    fn partial_success_is_running() {
        let snap = WorkloadSnapshot {
            required_completions: Some(1),
            succeeded: Some(0),
            ..completed()
        };
        assert_eq!(derive(&snap), LifecycleState::Running);
    }

    #[test]
    fn required_met_is_succeeded() {
        let snap = WorkloadSnapshot {
            required_completions: Some(1),
            succeeded: Some(1),
            ..completed()
        };
        assert_eq!(derive(&snap), LifecycleState::Succeeded);
    }

    #[test]
    fn no_requirement_positive_count_is_succeeded() {
        let snap = WorkloadSnapshot {
            succeeded: Some(3),
            ..completed()
        };
        assert_eq!(derive(&snap), LifecycleState::Succeeded);
    }

    #[test]
    fn completed_without_counts_is_running() {
        assert_eq!(derive(&completed()), LifecycleState::Running);
    }

    #[test]
    fn condition_match_is_exact() {
        let snap = WorkloadSnapshot {
            succeeded: Some(1),
            condition_types: vec!["failed".into(), "FailureTarget".into()],
            ..completed()
        };
        assert_eq!(derive(&snap), LifecycleState::Succeeded);
    }

    #[test]
    fn extracts_job_fields() {
        let job = json!({
            "apiVersion": "batch/v1",
            "kind": "Job",
            "spec": { "completions": 2 },
            "status": {
                "completionTime": "2024-01-01T00:00:00Z",
                "succeeded": 2,
                "conditions": [{ "type": "Complete", "status": "True" }]
            }
        });
        let snap = WorkloadSnapshot::from_job_manifest(&job);
        assert_eq!(snap.completion_time.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(snap.required_completions, Some(2));
        assert_eq!(snap.succeeded, Some(2));
        assert_eq!(snap.condition_types, vec!["Complete".to_string()]);
        assert_eq!(snap.lifecycle_state(), LifecycleState::Succeeded);
    }

    #[test]
    fn degenerate_manifests_still_resolve() {
        for job in [
            json!(null),
            json!("not a job"),
            json!({}),
            json!({ "status": { "completionTime": null, "conditions": "nope" } }),
            json!({ "spec": { "completions": "one" }, "status": { "succeeded": 99999999999i64 } }),
        ] {
            let snap = WorkloadSnapshot::from_job_manifest(&job);
            assert_eq!(snap.lifecycle_state(), LifecycleState::Running);
        }
    }

    #[test]
    fn state_names_round_trip() {
        for s in [LifecycleState::Running, LifecycleState::Succeeded, LifecycleState::Failed, LifecycleState::Unknown] {
            assert_eq!(s.as_str().parse::<LifecycleState>().unwrap(), s);
        }
        assert_eq!("Pending".parse::<LifecycleState>().unwrap(), LifecycleState::Unknown);
    }
}
