//! Service-level tests: the real connector, library and sync engine against a
//! mocked HTTP client.

use async_trait::async_trait;
use bridge_desktop::SqliteSettingsStore;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::time::ManualClock;
use bytes::Bytes;
use core_library::repositories::PageRequest;
use core_runtime::events::{CoreEvent, SyncEvent};
use core_service::{CoreConfig, CoreError, CoreService, SyncOutcome};
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        async fn execute_with_retry(&self, request: HttpRequest, policy: RetryPolicy) -> BridgeResult<HttpResponse>;
    }
}

const OWNED_XML: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<items totalitems="2">
  <item objecttype="thing" objectid="13" subtype="boardgame" collid="1001">
    <name sortindex="1">Catan</name>
    <stats minplayers="3" maxplayers="4" numowned="250000">
      <rating value="7.5">
        <usersrated value="120000"/>
        <average value="7.1"/>
        <bayesaverage value="6.9"/>
        <ranks>
          <rank type="subtype" id="1" name="boardgame" friendlyname="Board Game Rank" value="480" bayesaverage="6.9"/>
        </ranks>
      </rating>
    </stats>
    <status own="1" prevowned="0" fortrade="0" want="0" wanttoplay="0" wanttobuy="0" wishlist="0" preordered="0" lastmodified="2024-03-01 12:30:00"/>
    <numplays>12</numplays>
  </item>
  <item objecttype="thing" objectid="84876" subtype="boardgame" collid="1002">
    <name sortindex="5">The Castles of Burgundy</name>
    <status own="1" prevowned="0" fortrade="0" want="0" wanttoplay="0" wanttobuy="0" wishlist="0" preordered="0" lastmodified="2024-02-11 08:00:00"/>
    <numplays>0</numplays>
  </item>
</items>"#;

const EMPTY_XML: &str = r#"<items totalitems="0"></items>"#;

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

/// Owned base items come back; every other partition is empty.
fn owned_collection_client() -> MockHttpClient {
    let mut client = MockHttpClient::new();
    client.expect_execute_with_retry().returning(|request, _| {
        if request.url.contains("own=1") && !request.url.contains("subtype=") {
            Ok(response(200, OWNED_XML))
        } else {
            Ok(response(200, EMPTY_XML))
        }
    });
    client
}

async fn service(client: MockHttpClient, dir: &TempDir) -> CoreService {
    let settings = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
    let config = CoreConfig::builder()
        .database_path(dir.path().join("data").join("collection.db"))
        .username("alice")
        .http_client(Arc::new(client))
        .settings_store(settings)
        .clock(Arc::new(ManualClock::new(1_709_802_301_000)))
        .partition_pause(Duration::ZERO)
        .build()
        .unwrap();

    CoreService::bootstrap(config).await.unwrap()
}

#[core_async::test]
async fn test_sync_collection_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let core = service(owned_collection_client(), &dir).await;
    core.set_sync_statuses(&["own"]).await.unwrap();

    let outcome = core.sync_collection().await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(outcome.stats().num_updates, 2);
    assert_eq!(core.collection_count().await.unwrap(), 2);

    let page = core.collection(PageRequest::default()).await.unwrap();
    let names: Vec<&str> = page.items.iter().map(|i| i.name.as_str()).collect();
    // Sorted past the leading article
    assert_eq!(names, vec!["The Castles of Burgundy", "Catan"]);
    assert_eq!(page.items[1].rating, Some(7.5));

    let ranks = core.game_ranks(13).await.unwrap();
    assert_eq!(ranks.len(), 1);
    assert_eq!(ranks[0].value, Some(480));
    assert!(dir.path().join("data").join("collection.db").exists());
}

#[core_async::test]
async fn test_queued_response_interrupts_sync() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = MockHttpClient::new();
    client
        .expect_execute_with_retry()
        .times(1)
        .returning(|_, _| Ok(response(202, "")));
    let core = service(client, &dir).await;
    core.set_sync_statuses(&["own", "wishlist"]).await.unwrap();

    let mut events = core.subscribe_events();
    let outcome = core.sync_collection().await.unwrap();

    match outcome {
        SyncOutcome::Interrupted(stats) => assert_eq!(stats.num_io_errors, 1),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(events.drain().iter().any(|e| matches!(
        e,
        CoreEvent::Sync(SyncEvent::PartitionFailed { status_code: Some(202), .. })
    )));
    assert!(!core.is_sync_active().await);
}

#[core_async::test]
async fn test_unknown_status_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let core = service(MockHttpClient::new(), &dir).await;

    let result = core.set_sync_statuses(&["own", "hasparts"]).await;

    assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    assert!(core.sync_statuses().await.unwrap().is_empty());
}

#[core_async::test]
async fn test_statuses_are_stored_lowercase() {
    let dir = tempfile::tempdir().unwrap();
    let core = service(MockHttpClient::new(), &dir).await;

    core.set_sync_statuses(&["Own", "PLAYED", "own"]).await.unwrap();

    assert_eq!(core.sync_statuses().await.unwrap(), vec!["own", "played"]);
}

#[core_async::test]
async fn test_sync_disabled_without_statuses() {
    let dir = tempfile::tempdir().unwrap();
    let core = service(MockHttpClient::new(), &dir).await;

    let outcome = core.sync_collection().await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Skipped(core_service::SkipReason::SyncDisabled)
    );
}

#[core_async::test]
async fn test_clear_collection_data() {
    let dir = tempfile::tempdir().unwrap();
    let core = service(owned_collection_client(), &dir).await;
    core.set_sync_statuses(&["own"]).await.unwrap();
    core.sync_collection().await.unwrap();

    let cleared = core.clear_collection_data().await.unwrap();

    assert_eq!(cleared.items_removed, 2);
    assert_eq!(cleared.ranks_removed, 1);
    assert_eq!(core.collection_count().await.unwrap(), 0);
    assert_eq!(core.sync_statuses().await.unwrap(), vec!["own"]);
}
