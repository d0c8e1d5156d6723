mod common;

use codesync_sync::{
    AnalysisReport, KindSelection, LocalSource, SyncConfig, Violation, WorkspaceConfig,
};
use codesync_types::{ResourceKind, VersionStamp};
use common::{class, component, function, manifest_json, orchestrator, reject, write, Reply, ScriptedRemote};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn workspace() -> WorkspaceConfig {
    SyncConfig::default().workspace
}

// ── Scenarios ───────────────────────────────────────────────────

#[tokio::test]
async fn new_class_is_submitted_at_epoch_and_recorded() {
    let dir = TempDir::new().unwrap();
    class(dir.path(), "Foo");
    let remote = ScriptedRemote::new();
    remote.replies("Foo", vec![Reply::Accept(1700000000123)]);

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let outcome = orch
        .push_named(ResourceKind::Class, "Foo", &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(remote.submissions_for("Foo")[0].version, 0);

    let manifest = manifest_json(dir.path());
    let entry = &manifest["class:Foo"];
    assert_eq!(entry["updateTime"], 1700000000123i64);
    assert_eq!(entry["apiName"], "Foo");
    assert_eq!(entry["type"], "class");
    assert_eq!(entry["nameSpace"], "library");
    assert_eq!(entry["content"], "class Foo {}");
}

#[tokio::test]
async fn duplicate_on_component_adopts_looked_up_version() {
    let dir = TempDir::new().unwrap();
    component(dir.path(), "Bar", &["index.js"]);
    write(
        dir.path(),
        codesync_manifest::MANIFEST_FILE_NAME,
        &json!({
            "component:Bar": { "updateTime": 42, "apiName": "Bar__c", "name": "Bar", "type": "component" }
        })
        .to_string(),
    );

    let remote = ScriptedRemote::new();
    remote.replies(
        "Bar__c",
        vec![reject("Bar__c already exists with same api name"), Reply::AcceptSilently],
    );
    remote.server_has("Bar__c", 57);

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let outcome = orch
        .push_named(ResourceKind::Component, "Bar", &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(outcome.success, "{}", outcome.message);
    let versions: Vec<i64> = remote.submissions_for("Bar__c").iter().map(|s| s.version).collect();
    assert_eq!(versions, vec![42, 57]);
    assert_eq!(outcome.version, Some(VersionStamp::from_server(57)));
    assert_eq!(manifest_json(dir.path())["component:Bar"]["updateTime"], 57);
}

// ── Idempotence ─────────────────────────────────────────────────

#[tokio::test]
async fn pushing_twice_converges() {
    let dir = TempDir::new().unwrap();
    component(dir.path(), "chart", &["a.js"]);
    let remote = ScriptedRemote::new();
    let source = LocalSource::new(dir.path());

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let first = orch.push_named(ResourceKind::Component, "chart", &source, &workspace()).await;
    let after_first = manifest_json(dir.path())["component:chart"].clone();

    let second = orch.push_named(ResourceKind::Component, "chart", &source, &workspace()).await;
    let after_second = manifest_json(dir.path())["component:chart"].clone();

    assert!(first.success && second.success);
    assert!(after_second["updateTime"].as_i64() >= after_first["updateTime"].as_i64());
    // The second push echoes the version the first one recorded.
    assert_eq!(
        Some(remote.submissions()[1].version),
        after_first["updateTime"].as_i64()
    );
    // Unchanged files hash to the same digest.
    assert_eq!(after_first["content"], after_second["content"]);
    assert!(after_first["content"].as_str().unwrap().starts_with("sha256:"));
}

// ── Batch isolation ─────────────────────────────────────────────

#[tokio::test]
async fn one_terminal_failure_does_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    for name in ["alpha", "bravo", "charlie", "delta"] {
        function(dir.path(), name);
    }
    let remote = ScriptedRemote::new();
    remote.always_reject("charlie", "Function charlie: illegal import java.io.File");

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let report = orch
        .push_all(
            KindSelection::One(ResourceKind::Function),
            &LocalSource::new(dir.path()),
            &workspace(),
        )
        .await;

    assert_eq!(report.success_count(), 3);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(
        report.failures(),
        vec![(
            "charlie".to_string(),
            "Function charlie: illegal import java.io.File".to_string()
        )]
    );
    assert_eq!(remote.submissions_for("delta").len(), 1);

    let manifest = manifest_json(dir.path());
    assert!(manifest.get("function:alpha").is_some());
    assert!(manifest.get("function:charlie").is_none());
    assert!(manifest.get("function:delta").is_some());
}

#[tokio::test]
async fn all_kinds_are_reported_per_kind() {
    let dir = TempDir::new().unwrap();
    component(dir.path(), "chart", &["a.js"]);
    write(dir.path(), "plugins/picker/plugin.xml", "<plugin/>");
    write(dir.path(), "plugins/broken/readme.md", "no metadata");
    function(dir.path(), "calc");
    class(dir.path(), "Util");
    let remote = ScriptedRemote::new();
    remote.compile_fails("Util", "unexpected token at line 1");

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let report = orch
        .push_all(KindSelection::All, &LocalSource::new(dir.path()), &workspace())
        .await;

    let by_kind = report.by_kind();
    assert_eq!(by_kind[&ResourceKind::Component].succeeded, 1);
    assert_eq!(by_kind[&ResourceKind::Plugin].succeeded, 1);
    assert_eq!(by_kind[&ResourceKind::Function].succeeded, 1);
    assert_eq!(by_kind[&ResourceKind::Class].failed, 1);
    assert_eq!(report.outcomes.len(), 4);
    assert!(!report.is_success());
}

#[tokio::test]
async fn missing_kind_directory_is_an_empty_batch() {
    let dir = TempDir::new().unwrap();
    let remote = ScriptedRemote::new();

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let report = orch
        .push_kind(ResourceKind::Plugin, &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(report.outcomes.is_empty());
    assert!(report.is_success());
}

// ── Preconditions and validation ────────────────────────────────

#[tokio::test]
async fn component_without_metadata_document_fails_before_upload() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "components/chart/sourceFiles/a.js", "x");
    let remote = ScriptedRemote::new();

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let outcome = orch
        .push_path(ResourceKind::Component, "components/chart", &LocalSource::new(dir.path()))
        .await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("component.xml"), "{}", outcome.message);
    assert!(remote.uploads().is_empty());
    assert!(remote.submissions().is_empty());
}

#[tokio::test]
async fn serious_violation_aborts_only_that_resource() {
    let dir = TempDir::new().unwrap();
    function(dir.path(), "bad");
    function(dir.path(), "good");
    let remote = ScriptedRemote::new();
    remote.analysis(
        "bad",
        AnalysisReport {
            success: true,
            message: None,
            violations: vec![
                Violation {
                    priority: 3,
                    message: "unused variable".into(),
                    line: Some(2),
                },
                Violation {
                    priority: 9,
                    message: "infinite loop".into(),
                    line: Some(4),
                },
            ],
        },
    );

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let report = orch
        .push_kind(ResourceKind::Function, &LocalSource::new(dir.path()), &workspace())
        .await;

    assert_eq!(report.success_count(), 1);
    let failures = report.failures();
    assert_eq!(failures[0].0, "bad");
    assert!(failures[0].1.contains("line 4: infinite loop"));
    assert!(!failures[0].1.contains("unused variable"));
    assert!(remote.submissions_for("bad").is_empty());
    assert!(remote.compiled().iter().all(|name| name != "bad"));
}

#[tokio::test]
async fn advisory_violations_do_not_block() {
    let dir = TempDir::new().unwrap();
    function(dir.path(), "calc");
    let remote = ScriptedRemote::new();
    remote.analysis(
        "calc",
        AnalysisReport {
            success: true,
            message: None,
            violations: vec![Violation {
                priority: 8,
                message: "method too long".into(),
                line: None,
            }],
        },
    );

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let outcome = orch
        .push_named(ResourceKind::Function, "calc", &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(remote.analyzed(), vec!["calc"]);
    assert_eq!(remote.compiled(), vec!["calc"]);
}

#[tokio::test]
async fn compile_failure_is_validation_failure() {
    let dir = TempDir::new().unwrap();
    class(dir.path(), "Util");
    let remote = ScriptedRemote::new();
    remote.compile_fails("Util", "unexpected token at line 1");

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let outcome = orch
        .push_named(ResourceKind::Class, "Util", &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(!outcome.success);
    assert!(outcome.message.starts_with("validation failed"));
    assert!(outcome.message.contains("unexpected token at line 1"));
}

#[tokio::test]
async fn bundles_skip_preflight() {
    let dir = TempDir::new().unwrap();
    component(dir.path(), "chart", &["a.js"]);
    let remote = ScriptedRemote::new();

    let mut orch = orchestrator(&remote, dir.path(), 2);
    orch.push_named(ResourceKind::Component, "chart", &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(remote.analyzed().is_empty());
    assert!(remote.compiled().is_empty());
}

#[tokio::test]
async fn unknown_name_fails_without_remote_calls() {
    let dir = TempDir::new().unwrap();
    let remote = ScriptedRemote::new();

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let outcome = orch
        .push_named(ResourceKind::Function, "ghost", &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(!outcome.success);
    assert!(outcome.key.is_none());
    assert!(remote.submissions().is_empty());
}

// ── Manifest handling ───────────────────────────────────────────

#[tokio::test]
async fn manifest_fields_feed_the_request_and_survive() {
    let dir = TempDir::new().unwrap();
    function(dir.path(), "calc");
    write(
        dir.path(),
        codesync_manifest::MANIFEST_FILE_NAME,
        &json!({
            "function:calc": {
                "updateTime": 8,
                "nameSpace": "button",
                "bindingObjectApiName": "AccountObj",
                "owner": "ops"
            },
            "class:Other": { "updateTime": 3 }
        })
        .to_string(),
    );
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![Reply::Accept(9)]);

    let mut orch = orchestrator(&remote, dir.path(), 2).with_tenant("71554");
    orch.push_named(ResourceKind::Function, "calc", &LocalSource::new(dir.path()), &workspace())
        .await;

    let body = &remote.submissions_for("calc")[0].body;
    assert_eq!(body["nameSpace"], "button");
    assert_eq!(body["bindingObjectApiName"], "AccountObj");
    assert_eq!(body["returnType"], "void");
    assert_eq!(body["updateTime"], 8);

    let manifest = manifest_json(dir.path());
    assert_eq!(manifest["function:calc"]["updateTime"], 9);
    assert_eq!(manifest["function:calc"]["owner"], "ops");
    assert_eq!(manifest["function:calc"]["tenantId"], "71554");
    assert_eq!(manifest["class:Other"], json!({ "updateTime": 3 }));
}

#[tokio::test]
async fn failed_push_leaves_manifest_untouched() {
    let dir = TempDir::new().unwrap();
    function(dir.path(), "calc");
    let original = json!({ "function:calc": { "updateTime": 8 } }).to_string();
    write(dir.path(), codesync_manifest::MANIFEST_FILE_NAME, &original);
    let remote = ScriptedRemote::new();
    remote.always_reject("calc", "current code online has a higher version");

    let mut orch = orchestrator(&remote, dir.path(), 1);
    let outcome = orch
        .push_named(ResourceKind::Function, "calc", &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(!outcome.success);
    assert_eq!(remote.submissions().len(), 2);
    assert_eq!(manifest_json(dir.path())["function:calc"]["updateTime"], 8);
}

#[tokio::test]
async fn unwritable_manifest_after_accepted_push_is_a_warning() {
    let dir = TempDir::new().unwrap();
    class(dir.path(), "Foo");
    write(dir.path(), codesync_manifest::MANIFEST_FILE_NAME, "{ not json");
    let remote = ScriptedRemote::new();
    remote.replies("Foo", vec![Reply::Accept(31)]);

    let mut orch = orchestrator(&remote, dir.path(), 2);
    let report = orch
        .push_all(KindSelection::One(ResourceKind::Class), &LocalSource::new(dir.path()), &workspace())
        .await;

    assert!(report.is_success());
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.version, Some(VersionStamp::from_server(31)));
    assert!(outcome.message.contains("manifest was not updated"), "{}", outcome.message);
    assert_eq!(report.warnings().len(), 1);
    assert_eq!(remote.submissions().len(), 1);
    assert_eq!(
        std::fs::read_to_string(dir.path().join(codesync_manifest::MANIFEST_FILE_NAME)).unwrap(),
        "{ not json"
    );
}
