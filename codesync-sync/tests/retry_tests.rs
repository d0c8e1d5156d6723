mod common;

use common::{reject, Reply, ScriptedRemote};
use codesync_sync::{ConflictResolver, FileSet, PushPayload, RemoteService, ResourceDescriptor, SyncError};
use codesync_types::{ResourceKey, ResourceKind, VersionStamp};
use std::sync::Arc;

const STALE: &str = "Upload failed: current code online has a higher version";
const DUPLICATE: &str = "Function calc already exists with same api name";
const TRANSIENT: &str = "System exception, please retry later";

fn payload(kind: ResourceKind, name: &str, version: i64) -> PushPayload {
    let key = ResourceKey::from_name(kind, name).unwrap();
    PushPayload {
        descriptor: ResourceDescriptor {
            api_name: key.api_name().to_string(),
            name: name.to_string(),
            kind,
            content: Some("def x() {}".into()),
            namespace: "common".into(),
            return_type: "void".into(),
            binding_target: "NONE".into(),
            lang: 0,
        },
        key,
        metadata_xml: None,
        files: FileSet::default(),
        static_assets: Vec::new(),
        version: VersionStamp::from_server(version),
        content_digest: String::new(),
    }
}

fn resolver(remote: &Arc<ScriptedRemote>, max_retries: u32) -> ConflictResolver {
    ConflictResolver::new(Arc::clone(remote) as Arc<dyn RemoteService>, max_retries)
}

fn versions(remote: &ScriptedRemote, api_name: &str) -> Vec<i64> {
    remote
        .submissions_for(api_name)
        .iter()
        .map(|s| s.version)
        .collect()
}

// ── Success ─────────────────────────────────────────────────────

#[tokio::test]
async fn first_attempt_accepted() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![Reply::Accept(7)]);

    let accepted = resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap();

    assert_eq!(accepted.version, VersionStamp::from_server(7));
    assert_eq!(accepted.submissions, 1);
    assert!(remote.lookups().is_empty());
}

#[tokio::test]
async fn accepted_without_version_keeps_submitted() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![Reply::AcceptSilently]);

    let accepted = resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap();

    assert_eq!(accepted.version, VersionStamp::from_server(5));
}

// ── Bounded retry ───────────────────────────────────────────────

#[tokio::test]
async fn stale_every_time_submits_max_retries_plus_one() {
    for max_retries in [0u32, 1, 2, 5] {
        let remote = ScriptedRemote::new();
        remote.always_reject("calc", STALE);

        let err = resolver(&remote, max_retries)
            .submit(payload(ResourceKind::Function, "calc", 5))
            .await
            .unwrap_err();

        assert_eq!(remote.submissions().len() as u32, max_retries + 1);
        assert_eq!(err.remote_message(), Some(STALE));
    }
}

#[tokio::test]
async fn duplicate_every_time_is_still_bounded() {
    let remote = ScriptedRemote::new();
    remote.always_reject("calc", DUPLICATE);
    remote.server_has("calc", 9);

    let err = resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap_err();

    assert_eq!(remote.submissions().len(), 3);
    assert_eq!(err.to_string(), DUPLICATE);
}

// ── Recovery actions ────────────────────────────────────────────

#[tokio::test]
async fn stale_adopts_server_version() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![reject(STALE), Reply::AcceptSilently]);
    remote.server_has("calc", 31);

    let accepted = resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap();

    assert_eq!(versions(&remote, "calc"), vec![5, 31]);
    assert_eq!(accepted.version, VersionStamp::from_server(31));
    assert_eq!(accepted.submissions, 2);
    assert_eq!(remote.lookups(), vec!["calc"]);
}

#[tokio::test]
async fn stale_without_server_copy_resets_to_epoch() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![reject(STALE), Reply::Accept(1)]);

    resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap();

    assert_eq!(versions(&remote, "calc"), vec![5, 0]);
}

#[tokio::test]
async fn failed_lookup_resets_to_epoch() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![reject(DUPLICATE), Reply::Accept(3)]);
    remote.lookup_fails("calc");

    let accepted = resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap();

    assert_eq!(versions(&remote, "calc"), vec![5, 0]);
    assert_eq!(accepted.version, VersionStamp::from_server(3));
}

#[tokio::test]
async fn transient_resets_to_epoch_without_lookup() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![reject(TRANSIENT), Reply::Accept(2)]);
    remote.server_has("calc", 99);

    resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap();

    assert_eq!(versions(&remote, "calc"), vec![5, 0]);
    assert!(remote.lookups().is_empty());
}

#[tokio::test]
async fn not_found_resets_to_epoch() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![reject("version 5 does not exist"), Reply::Accept(1)]);

    resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap();

    assert_eq!(versions(&remote, "calc"), vec![5, 0]);
}

#[tokio::test]
async fn unrelated_not_found_is_not_retried() {
    let remote = ScriptedRemote::new();
    remote.always_reject("calc", "Binding object AccountObj not found");
    remote.server_has("calc", 77);

    let err = resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 42))
        .await
        .unwrap_err();

    assert_eq!(versions(&remote, "calc"), vec![42]);
    assert!(remote.lookups().is_empty());
    assert_eq!(err.remote_message(), Some("Binding object AccountObj not found"));
}

#[tokio::test]
async fn mixed_categories_share_one_budget() {
    let remote = ScriptedRemote::new();
    remote.replies(
        "calc",
        vec![reject(TRANSIENT), reject(STALE), reject(TRANSIENT), Reply::Accept(1)],
    );
    remote.server_has("calc", 12);

    let err = resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap_err();

    assert_eq!(versions(&remote, "calc"), vec![5, 0, 12]);
    assert_eq!(err.remote_message(), Some(TRANSIENT));
}

// ── Terminal failures ───────────────────────────────────────────

#[tokio::test]
async fn unknown_message_is_not_retried() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![reject("Permission denied for tenant 71554")]);

    let err = resolver(&remote, 2)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap_err();

    assert_eq!(remote.submissions().len(), 1);
    assert_eq!(err.to_string(), "Permission denied for tenant 71554");
}

#[tokio::test]
async fn zero_retries_never_recovers() {
    let remote = ScriptedRemote::new();
    remote.replies("calc", vec![reject(DUPLICATE), Reply::Accept(1)]);
    remote.server_has("calc", 4);

    let err = resolver(&remote, 0)
        .submit(payload(ResourceKind::Function, "calc", 5))
        .await
        .unwrap_err();

    assert_eq!(remote.submissions().len(), 1);
    assert!(matches!(err, SyncError::Remote(_)));
}
