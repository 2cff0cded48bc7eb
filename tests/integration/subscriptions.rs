//! Subscription pass-through

use crate::integration::support::{hero_data, hero_query, seed, spy_client, QUIET_PERIOD};
use futures::StreamExt;
use normcache::error::{FetchError, NetworkError};
use normcache::store::RecordValue;
use normcache::{Field, FetchPolicy, Operation};
use serde_json::{json, Value};

fn hero_updates() -> Operation {
    Operation::subscription(
        "HeroUpdates",
        vec![Field::object(
            "heroUpdated",
            vec![
                Field::scalar("__typename"),
                Field::scalar("id"),
                Field::scalar("name"),
            ],
        )],
    )
}

fn update(name: &str) -> String {
    json!({"data": {"heroUpdated": {"__typename": "Hero", "id": "1", "name": name}}}).to_string()
}

fn name_of(data: &Option<Value>) -> Option<&str> {
    data.as_ref()?.get("heroUpdated")?.get("name")?.as_str()
}

#[tokio::test]
async fn test_forwards_every_event_and_writes_it() {
    let (client, store, transport) = spy_client();
    transport.offer_events([update("R2-D2"), update("Artoo")]);

    let responses: Vec<_> = client.subscribe(hero_updates()).execute().collect().await;

    assert_eq!(responses.len(), 2);
    let names: Vec<_> = responses
        .iter()
        .map(|r| name_of(&r.as_ref().unwrap().data))
        .collect();
    assert_eq!(names, vec![Some("R2-D2"), Some("Artoo")]);
    assert!(responses
        .iter()
        .all(|r| r.as_ref().unwrap().cache_origin() == Some(false)));

    assert_eq!(store.writes(), 2);
    assert_eq!(
        store
            .inner
            .record("Hero:1")
            .and_then(|r| r.fields.get("name").cloned()),
        Some(RecordValue::Scalar(json!("Artoo")))
    );
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_failure_is_last_item() {
    let (client, _store, transport) = spy_client();
    transport.offer_events_then_failure(
        [update("R2-D2")],
        NetworkError::Transport("socket closed".to_string()),
    );

    let responses: Vec<_> = client.subscribe(hero_updates()).execute().collect().await;

    assert_eq!(responses.len(), 2);
    assert!(responses[0].is_ok());
    assert_eq!(
        responses[1].as_ref().unwrap_err(),
        &FetchError::Network(NetworkError::Transport("socket closed".to_string()))
    );
}

#[tokio::test]
async fn test_subscription_ignores_refetch_policy() {
    let (client, store, transport) = spy_client();
    transport.offer_events([update("R2-D2")]);

    let mut stream = client
        .subscribe(hero_updates())
        .refetch_policy(FetchPolicy::CacheOnly)
        .execute();
    assert!(stream.next().await.unwrap().is_ok());
    assert!(stream.next().await.is_none());
    assert_eq!(store.inner.watcher_count(), 0);
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn test_cancel_ends_open_subscription() {
    let (client, _store, transport) = spy_client();
    transport.offer_pending();

    let mut stream = client.subscribe(hero_updates()).execute();
    assert!(tokio::time::timeout(QUIET_PERIOD, stream.next())
        .await
        .is_err());

    stream.cancel();
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_subscription_writes_wake_watchers() {
    let (client, store, transport) = spy_client();
    seed(store.as_ref(), &hero_query("1"), hero_data("1", "R2-D2")).await;

    let mut watch = client
        .query(hero_query("1"))
        .fetch_policy(FetchPolicy::CacheOnly)
        .refetch_policy(FetchPolicy::CacheOnly)
        .execute();
    watch.next().await.unwrap().unwrap();

    transport.offer_events([update("Artoo")]);
    let events: Vec<_> = client.subscribe(hero_updates()).execute().collect().await;
    assert_eq!(events.len(), 1);

    let refreshed = watch.next().await.unwrap().unwrap();
    assert_eq!(refreshed.data, Some(hero_data("1", "Artoo")));
}
