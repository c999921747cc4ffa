use anyhow::{anyhow, ensure, Result};
use drover_core::{Provider, Resource, ResourceField, TaskId};

use crate::{Catalog, ErrorKind};

/// Shared backend contract suite. Runs against a fresh, empty catalog of any backend.
pub fn run_catalog_contract_suite(catalog: &dyn Catalog) -> Result<()> {
    providers(catalog)?;
    resources_by_task(catalog)?;
    resources_by_fields(catalog)?;
    accounts_by_application(catalog)?;
    permissions(catalog)?;
    Ok(())
}

fn providers(catalog: &dyn Catalog) -> Result<()> {
    catalog.register_provider(Provider {
        name: "cluster-a".into(),
        host: "https://10.0.0.1".into(),
        ca_data: "LS0tLS1CRUdJTg==".into(),
        bearer_token: "secret".into(),
    })?;

    let got = catalog.get_provider("cluster-a")?;
    ensure!(got.bearer_token == "secret", "get_provider must return the bearer token");
    ensure!(got.host == "https://10.0.0.1", "unexpected host {}", got.host);

    let listed = catalog.list_providers()?;
    ensure!(listed.len() == 1, "expected one provider, got {}", listed.len());
    ensure!(listed[0].name == "cluster-a" && listed[0].ca_data == "LS0tLS1CRUdJTg==", "unexpected listing {:?}", listed);

    let dup = catalog.register_provider(Provider {
        name: "cluster-a".into(),
        host: "https://10.0.0.2".into(),
        ca_data: String::new(),
        bearer_token: "other".into(),
    });
    match dup {
        Err(e) if e.kind() == ErrorKind::ConstraintViolation => {}
        other => return Err(anyhow!("duplicate provider name must be a constraint violation, got {:?}", other)),
    }
    // the rejected write left the original row alone
    ensure!(catalog.get_provider("cluster-a")?.bearer_token == "secret", "rejected insert changed the stored provider");

    match catalog.get_provider("missing") {
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        other => return Err(anyhow!("missing provider must be NotFound, got {:?}", other)),
    }
    Ok(())
}

fn resource(account: &str, app: &str, task: &TaskId, kind: &str, name: &str, namespace: &str) -> Resource {
    Resource {
        account_name: account.into(),
        spinnaker_app: app.into(),
        task_id: task.clone(),
        api_group: if kind == "Deployment" { "apps".into() } else { String::new() },
        kind: kind.into(),
        name: name.into(),
        namespace: namespace.into(),
        resource_body: format!(r#"{{"kind":"{kind}","metadata":{{"name":"{name}"}}}}"#),
        version: "v1".into(),
    }
}

fn resources_by_task(catalog: &dyn Catalog) -> Result<()> {
    let t1 = TaskId::from_str("task-1");
    let t2 = TaskId::from_str("task-2");
    let web = resource("cluster-a", "shop", &t1, "Deployment", "web", "prod");
    let svc = resource("cluster-a", "shop", &t1, "Service", "web", "prod");
    catalog.record_resource(web.clone())?;
    catalog.record_resource(svc.clone())?;
    catalog.record_resource(resource("cluster-b", "blog", &t2, "Deployment", "api", "staging"))?;

    let got = catalog.list_resources_by_task(&t1)?;
    ensure!(got.len() == 2, "task-1 must return exactly its two resources, got {}", got.len());
    for (got, want) in got.iter().zip([&web, &svc]) {
        ensure!(got.account_name == want.account_name, "account mismatch");
        ensure!(got.api_group == want.api_group, "api group mismatch");
        ensure!(got.kind == want.kind, "kind mismatch");
        ensure!(got.name == want.name, "name mismatch");
        ensure!(got.namespace == want.namespace, "namespace mismatch");
        ensure!(got.resource_body == want.resource_body, "body mismatch");
        ensure!(got.version == want.version, "version mismatch");
        ensure!(got.spinnaker_app.is_empty() && got.task_id.is_empty(), "by-task listing must not project app or task");
    }

    ensure!(catalog.list_resources_by_task(&TaskId::from_str("nope"))?.is_empty(), "unknown task must list nothing");
    ensure!(catalog.list_resources_by_task(&TaskId::default())?.is_empty(), "empty task id must list nothing");
    Ok(())
}

fn resources_by_fields(catalog: &dyn Catalog) -> Result<()> {
    match catalog.list_resources_by_fields(&[]) {
        Err(e) if e.kind() == ErrorKind::InvalidArgument => {}
        other => return Err(anyhow!("empty field list must be InvalidArgument, got {:?}", other)),
    }

    let pairs = catalog.list_resources_by_fields(&[ResourceField::Kind, ResourceField::Namespace])?;
    let pairs: Vec<(&str, &str)> = pairs.iter().map(|r| (r.kind.as_str(), r.namespace.as_str())).collect();
    ensure!(
        pairs == vec![("Deployment", "prod"), ("Deployment", "staging"), ("Service", "prod")],
        "unexpected kind/namespace combinations {:?}",
        pairs
    );

    let accounts = catalog.list_resources_by_fields(&[ResourceField::AccountName])?;
    ensure!(accounts.len() == 2, "expected two distinct accounts, got {}", accounts.len());
    ensure!(accounts.iter().all(|r| r.kind.is_empty() && r.name.is_empty()), "unprojected fields must stay empty");
    Ok(())
}

fn accounts_by_application(catalog: &dyn Catalog) -> Result<()> {
    let t3 = TaskId::from_str("task-3");
    catalog.record_resource(resource("cluster-c", "shop", &t3, "ConfigMap", "cfg", "prod"))?;
    catalog.record_resource(resource("cluster-a", "shop", &t3, "ConfigMap", "cfg", "prod"))?;

    let accounts = catalog.list_accounts_by_application("shop")?;
    ensure!(accounts == vec!["cluster-a".to_string(), "cluster-c".to_string()], "unexpected accounts {:?}", accounts);
    ensure!(catalog.list_accounts_by_application("unknown")?.is_empty(), "unknown app must list nothing");
    Ok(())
}

fn permissions(catalog: &dyn Catalog) -> Result<()> {
    ensure!(catalog.list_read_groups("cluster-a")?.is_empty(), "no grants means no read groups");
    ensure!(catalog.list_write_groups("cluster-a")?.is_empty(), "no grants means no write groups");

    catalog.grant_read("cluster-a", "devs")?;
    catalog.grant_read("cluster-a", "admins")?;
    catalog.grant_read("cluster-a", "devs")?;
    catalog.grant_write("cluster-a", "admins")?;
    catalog.grant_read("cluster-b", "ops")?;

    let read = catalog.list_read_groups("cluster-a")?;
    ensure!(read == vec!["admins".to_string(), "devs".to_string()], "unexpected read groups {:?}", read);
    let write = catalog.list_write_groups("cluster-a")?;
    ensure!(write == vec!["admins".to_string()], "unexpected write groups {:?}", write);
    ensure!(catalog.list_write_groups("cluster-b")?.is_empty(), "read grant must not imply write");
    Ok(())
}
