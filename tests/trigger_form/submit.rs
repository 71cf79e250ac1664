use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trigger_desk::api::TriggerClient;
use trigger_desk::channel::PushChannel;
use trigger_desk::error::{ApiError, DeskError, FormError};
use trigger_desk::form::TriggerForm;
use trigger_desk::model::Id;

use crate::push_server::{Greeting, PushServer, sample_snapshots};

async fn loaded_form(server: &PushServer) -> (PushChannel, TriggerForm) {
    let channel = PushChannel::connect(&server.url).await.unwrap();
    let mut form = TriggerForm::new();
    form.mount(&channel).unwrap();
    tokio::time::timeout(Duration::from_secs(5), form.wait_until_loaded())
        .await
        .expect("snapshots should arrive")
        .unwrap();
    (channel, form)
}

#[tokio::test]
async fn tag_trigger_is_posted_and_form_reloads() {
    let (tags, messages) = sample_snapshots();
    let push = PushServer::start(tags, messages, Greeting::Accept).await;
    let api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/triggers"))
        .and(body_json(json!({ "messages": ["2"], "triggerTagId": "10" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 77 })))
        .expect(1)
        .mount(&api)
        .await;

    let (channel, mut form) = loaded_form(&push).await;
    form.state_mut().select_tag(Some(Id::from(10))).unwrap();
    form.state_mut()
        .select_triggered_message(Some(Id::from(2)))
        .unwrap();

    let client = TriggerClient::new(&Url::parse(&api.uri()).unwrap());
    let reply = form.submit(&client, &channel).await.unwrap();
    assert_eq!(reply, json!({ "id": 77 }));

    // Reload: selections gone, snapshots requested again and re-applied.
    assert!(!form.is_loaded());
    assert!(form.state().trigger_tag().is_none());
    assert!(form.state().triggered_message().is_none());
    push.wait_for(r#"42["get-tags"]"#, 2).await;
    push.wait_for(r#"42["get-messages"]"#, 2).await;
    tokio::time::timeout(Duration::from_secs(5), form.wait_until_loaded())
        .await
        .expect("snapshots should arrive again")
        .unwrap();
    assert_eq!(form.state().messages().count(), 3);

    form.unmount(&channel);
    api.verify().await;
}

#[tokio::test]
async fn message_trigger_is_posted() {
    let (tags, messages) = sample_snapshots();
    let push = PushServer::start(tags, messages, Greeting::Accept).await;
    let api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/triggers"))
        .and(body_json(json!({ "messages": ["1"], "triggerMessageId": "3" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&api)
        .await;

    let (channel, mut form) = loaded_form(&push).await;
    form.state_mut()
        .select_trigger_message(Some(Id::from(3)))
        .unwrap();
    form.state_mut()
        .select_triggered_message(Some(Id::from(1)))
        .unwrap();

    let client = TriggerClient::new(&Url::parse(&api.uri()).unwrap());
    let reply = form.submit(&client, &channel).await.unwrap();
    assert!(reply.is_null());
    api.verify().await;
}

#[tokio::test]
async fn rejected_trigger_surfaces_error_and_keeps_state() {
    let (tags, messages) = sample_snapshots();
    let push = PushServer::start(tags, messages, Greeting::Accept).await;
    let api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/triggers"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&api)
        .await;

    let (channel, mut form) = loaded_form(&push).await;
    form.state_mut().select_tag(Some(Id::from(11))).unwrap();
    form.state_mut()
        .select_triggered_message(Some(Id::from(2)))
        .unwrap();

    let client = TriggerClient::new(&Url::parse(&api.uri()).unwrap());
    let err = form.submit(&client, &channel).await.unwrap_err();
    match err {
        DeskError::Api(ApiError::Rejected { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "database unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(form.is_loaded());
    assert_eq!(form.state().trigger_tag(), Some(&Id::from(11)));
    assert_eq!(push.count(r#"42["get-tags"]"#), 1);
}

#[tokio::test]
async fn invalid_form_never_reaches_the_server() {
    let (tags, messages) = sample_snapshots();
    let push = PushServer::start(tags, messages, Greeting::Accept).await;
    let api = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&api)
        .await;

    let (channel, mut form) = loaded_form(&push).await;
    form.state_mut().select_tag(Some(Id::from(10))).unwrap();
    form.state_mut()
        .select_trigger_message(Some(Id::from(1)))
        .unwrap();
    form.state_mut()
        .select_triggered_message(Some(Id::from(2)))
        .unwrap();

    let client = TriggerClient::new(&Url::parse(&api.uri()).unwrap());
    let err = form.submit(&client, &channel).await.unwrap_err();
    assert!(matches!(err, DeskError::Form(FormError::Invalid)));
    api.verify().await;
}
