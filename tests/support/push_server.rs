#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// How the fake server answers the namespace connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Accept,
    AcceptThenPing,
    AcceptThenDisconnect,
    Refuse,
}

/// Minimal Socket.IO-speaking server: answers `get-tags` / `get-messages`
/// with fixed snapshots and records every frame the client sends.
pub struct PushServer {
    pub url: Url,
    received: Arc<Mutex<Vec<String>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl PushServer {
    pub async fn start(tags: Value, messages: Value, greeting: Greeting) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral push listener should bind");
        let addr = listener
            .local_addr()
            .expect("push listener should expose local address");
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&received);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                let tags = tags.clone();
                let messages = messages.clone();
                tokio::spawn(serve(stream, log, tags, messages, greeting));
            }
        });

        Self {
            url: Url::parse(&format!("http://{addr}")).expect("server url should parse"),
            received,
            handle,
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self, frame: &str) -> usize {
        self.received().iter().filter(|f| *f == frame).count()
    }

    /// Poll until the client has sent `frame` at least `times` times.
    pub async fn wait_for(&self, frame: &str, times: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.count(frame) < times {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("client never sent {frame:?} x{times}: {:?}", self.received()));
    }
}

impl Drop for PushServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    stream: tokio::net::TcpStream,
    log: Arc<Mutex<Vec<String>>>,
    tags: Value,
    messages: Value,
    greeting: Greeting,
) {
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    let open = r#"0{"sid":"fake-sid","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
    if write.send(Message::Text(open.into())).await.is_err() {
        return;
    }

    while let Some(Ok(frame)) = read.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let text = text.as_str().to_string();
        log.lock().unwrap().push(text.clone());

        let replies: Vec<String> = match text.as_str() {
            "40" => match greeting {
                Greeting::Accept => vec![r#"40{"sid":"ns-sid"}"#.to_string()],
                Greeting::AcceptThenPing => vec![r#"40{"sid":"ns-sid"}"#.to_string(), "2".to_string()],
                Greeting::AcceptThenDisconnect => {
                    vec![r#"40{"sid":"ns-sid"}"#.to_string(), "41".to_string()]
                }
                Greeting::Refuse => vec![r#"44{"message":"not authorized"}"#.to_string()],
            },
            r#"42["get-tags"]"# => vec![format!(r#"42["tags",{tags}]"#)],
            r#"42["get-messages"]"# => vec![format!(r#"42["messages",{messages}]"#)],
            _ => Vec::new(),
        };

        for reply in replies {
            if write.send(Message::Text(reply.into())).await.is_err() {
                return;
            }
        }

        if greeting == Greeting::AcceptThenDisconnect && text == "40" {
            let _ = write.send(Message::Close(None)).await;
            return;
        }
    }
}

/// Three messages (two accept unstructured replies) and two tags.
pub fn sample_snapshots() -> (Value, Value) {
    let tags = serde_json::json!([
        { "id": 10, "messageId": 1, "tag": "great" },
        { "id": 11, "messageId": 3, "tag": "no" }
    ]);
    let messages = serde_json::json!([
        {
            "id": 1,
            "type": "text",
            "data": "{\"text\":\"How was the event?\"}",
            "metadata": "week 1",
            "unstructuredReply": true
        },
        {
            "id": 2,
            "type": "text",
            "data": "{\"text\":\"Thanks for the feedback!\"}",
            "metadata": null,
            "unstructuredReply": false
        },
        {
            "id": 3,
            "type": "multiple-choice",
            "data": "{\"question\":\"Anything else?\",\"choices\":[\"yes\",\"no\"]}",
            "unstructuredReply": true
        }
    ]);
    (tags, messages)
}
