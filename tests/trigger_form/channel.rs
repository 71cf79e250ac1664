use std::time::Duration;

use serde_json::json;
use trigger_desk::channel::{PushChannel, Socket};
use trigger_desk::error::{ChannelError, DeskError};
use trigger_desk::form::TriggerForm;

use crate::push_server::{Greeting, PushServer, sample_snapshots};

#[tokio::test]
async fn form_loads_reference_data_over_push_channel() {
    let (tags, messages) = sample_snapshots();
    let server = PushServer::start(tags, messages, Greeting::Accept).await;

    let channel = PushChannel::connect(&server.url).await.unwrap();
    let mut form = TriggerForm::new();
    form.mount(&channel).unwrap();
    tokio::time::timeout(Duration::from_secs(5), form.wait_until_loaded())
        .await
        .expect("snapshots should arrive")
        .unwrap();

    let options = form.state().options();
    let labels: Vec<&str> = options.tags.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "#1: How was the event? (week 1) [great]",
            "#3: Anything else? [yes / no] [no]",
        ]
    );
    let trigger_ids: Vec<&str> = options
        .trigger_messages
        .iter()
        .map(|o| o.value.as_str())
        .collect();
    assert_eq!(trigger_ids, vec!["1", "3"]);
    assert_eq!(options.messages.len(), 3);

    assert_eq!(server.count("40"), 1);
    assert_eq!(server.count(r#"42["get-tags"]"#), 1);
    assert_eq!(server.count(r#"42["get-messages"]"#), 1);
    form.unmount(&channel);
}

#[tokio::test]
async fn refused_namespace_connect_is_reported() {
    let (tags, messages) = sample_snapshots();
    let server = PushServer::start(tags, messages, Greeting::Refuse).await;

    let err = PushChannel::connect(&server.url).await.err().unwrap();
    assert!(
        matches!(err, ChannelError::ConnectRefused(ref reason) if reason == "not authorized"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = url::Url::parse(&format!("http://{addr}")).unwrap();
    let err = PushChannel::connect(&url).await.err().unwrap();
    assert!(matches!(err, ChannelError::Connection { .. }));
}

#[tokio::test]
async fn engine_pings_are_answered() {
    let (tags, messages) = sample_snapshots();
    let server = PushServer::start(tags, messages, Greeting::AcceptThenPing).await;

    let channel = PushChannel::connect(&server.url).await.unwrap();
    server.wait_for("3", 1).await;
    assert!(channel.is_open());
}

#[tokio::test]
async fn emit_with_payload_is_framed_as_event() {
    let (tags, messages) = sample_snapshots();
    let server = PushServer::start(tags, messages, Greeting::Accept).await;

    let channel = PushChannel::connect(&server.url).await.unwrap();
    channel.emit("hello", Some(json!({ "a": 1 }))).unwrap();
    server.wait_for(r#"42["hello",{"a":1}]"#, 1).await;
}

#[tokio::test]
async fn unmounted_form_reports_not_mounted_after_teardown() {
    let (tags, messages) = sample_snapshots();
    let server = PushServer::start(tags, messages, Greeting::Accept).await;

    let channel = PushChannel::connect(&server.url).await.unwrap();
    let mut form = TriggerForm::new();
    form.mount(&channel).unwrap();
    form.unmount(&channel);

    // Snapshots requested at mount still arrive, but nobody is listening.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(form.apply_pending().is_empty());
    assert_eq!(form.state().messages().count(), 0);
    assert!(matches!(
        form.wait_until_loaded().await,
        Err(DeskError::Form(_))
    ));
}

#[tokio::test]
async fn server_disconnect_ends_the_wait_for_snapshots() {
    let (tags, messages) = sample_snapshots();
    let server = PushServer::start(tags, messages, Greeting::AcceptThenDisconnect).await;

    let channel = PushChannel::connect(&server.url).await.unwrap();
    let mut form = TriggerForm::new();
    form.mount(&channel).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), form.wait_until_loaded())
        .await
        .expect("a closed channel should end the wait");
    assert!(
        matches!(result, Err(DeskError::Channel(ChannelError::Closed))),
        "unexpected result: {result:?}"
    );
    assert!(!channel.is_open());
    assert_eq!(form.next_update().await, None);
}
