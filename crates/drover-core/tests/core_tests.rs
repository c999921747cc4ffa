use drover_core::{derive, LifecycleState, Provider, Resource, ResourceField, TaskId, WorkloadSnapshot};
use serde_json::json;

fn job(completion: Option<&str>, completions: Option<i32>, succeeded: i32, conditions: &[&str]) -> serde_json::Value {
    let conditions: Vec<_> = conditions.iter().map(|t| json!({ "type": t })).collect();
    json!({
        "kind": "Job",
        "spec": { "completions": completions },
        "status": {
            "completionTime": completion,
            "succeeded": succeeded,
            "conditions": conditions,
        }
    })
}

#[test]
fn test_job_not_completed() {
    let snap = WorkloadSnapshot::from_job_manifest(&job(None, Some(1), 1, &[]));
    assert_eq!(derive(&snap), LifecycleState::Running);
}

#[test]
fn test_job_failed() {
    let snap = WorkloadSnapshot::from_job_manifest(&job(Some("2024-05-01T10:00:00Z"), Some(1), 0, &["Failed"]));
    assert_eq!(derive(&snap), LifecycleState::Failed);
}

#[test]
fn test_job_partially_successful() {
    let snap = WorkloadSnapshot::from_job_manifest(&job(Some("2024-05-01T10:00:00Z"), Some(1), 0, &[]));
    assert_eq!(derive(&snap), LifecycleState::Running);
}

#[test]
fn test_job_succeeded() {
    let snap = WorkloadSnapshot::from_job_manifest(&job(Some("2024-05-01T10:00:00Z"), Some(1), 1, &[]));
    assert_eq!(derive(&snap), LifecycleState::Succeeded);
}

#[test]
fn test_job_succeeded_without_declared_completions() {
    let snap = WorkloadSnapshot::from_job_manifest(&job(Some("2024-05-01T10:00:00Z"), None, 1, &["Complete"]));
    assert_eq!(derive(&snap), LifecycleState::Succeeded);
}

#[test]
fn test_derive_is_deterministic() {
    let snap = WorkloadSnapshot::from_job_manifest(&job(Some("t"), Some(3), 2, &["Suspended"]));
    let first = derive(&snap);
    for _ in 0..10 {
        assert_eq!(derive(&snap), first);
    }
}

#[test]
fn test_task_id_new() {
    let a = TaskId::new();
    let b = TaskId::new();
    assert_ne!(a, b);
    assert!(!a.is_empty());
}

#[test]
fn test_resource_projection() {
    let r = Resource {
        account_name: "cluster-a".into(),
        spinnaker_app: "shop".into(),
        task_id: TaskId::from_str("t-1"),
        api_group: "apps".into(),
        kind: "Deployment".into(),
        name: "web".into(),
        namespace: "prod".into(),
        resource_body: "{}".into(),
        version: "v1".into(),
    };
    let p = r.project(&[ResourceField::Kind, ResourceField::Namespace]);
    assert_eq!(p.kind, "Deployment");
    assert_eq!(p.namespace, "prod");
    assert!(p.account_name.is_empty());
    assert!(p.task_id.is_empty());
}

#[test]
fn test_provider_debug_redacts_token() {
    let p = Provider {
        name: "cluster-a".into(),
        host: "https://10.0.0.1".into(),
        ca_data: "ca".into(),
        bearer_token: "secret".into(),
    };
    let dbg = format!("{:?}", p);
    assert!(!dbg.contains("secret"));
    assert!(dbg.contains("cluster-a"));
    let summary = serde_json::to_value(p.summary()).unwrap();
    assert!(summary.get("bearer_token").is_none());
}
