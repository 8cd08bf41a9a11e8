//! Exercises the reqwest transport against a one-shot local HTTP server.

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use streamchat::chat::{ChatConfig, ChatSession};
use streamchat::{Client, ClientOptions, Renderer};

#[derive(Default)]
struct Capture {
    text: String,
}

impl Renderer for Capture {
    fn prompt(&self, username: &str) -> String {
        format!("{username}: ")
    }
    fn start_response(&mut self, _label: &str) {}
    fn print_text(&mut self, text: &str) {
        self.text.push_str(text);
    }
    fn finish_response(&mut self) {}
    fn print_error(&mut self, _error: &str) {}
    fn print_info(&mut self, _info: &str) {}
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|value| value.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });
    (format!("http://{addr}/v1/"), handle)
}

fn config_for(endpoint: &str) -> ChatConfig {
    ChatConfig::new()
        .with_endpoint(endpoint)
        .with_model("local-model")
}

#[tokio::test]
async fn streams_reply_with_expected_request() {
    let response = "HTTP/1.1 200 OK\r\n\
Content-Type: text/event-stream\r\n\
Connection: close\r\n\r\n\
data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\", world\"},\"finish_reason\":\"stop\"}]}\n\n\
data: [DONE]\n\n"
        .to_string();
    let (endpoint, server) = serve_once(response).await;

    let config = config_for(&endpoint).with_api_key(Some("sk-local".to_string()));
    let client = Client::new(config.client_options()).unwrap();
    let mut session = ChatSession::new(client, config);
    let mut renderer = Capture::default();

    let reply = session.send_streaming("Hi", &mut renderer).await.unwrap();
    assert_eq!(reply, "Hello, world");
    assert_eq!(renderer.text, "Hello, world");
    assert_eq!(session.message_count(), 3);

    let request = server.await.unwrap();
    let (head, body) = request.split_once("\r\n\r\n").unwrap();
    let head = head.to_lowercase();
    assert!(head.starts_with("post /v1/chat/completions http/1.1"));
    assert!(head.contains("content-type: application/json"));
    assert!(head.contains("accept: text/event-stream"));
    assert!(head.contains("authorization: bearer sk-local"));

    let body: Value = serde_json::from_str(body).unwrap();
    assert_eq!(
        body,
        json!({
            "model": "local-model",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "Hi"}
            ],
            "stream": true
        })
    );
}

#[tokio::test]
async fn no_authorization_header_without_key() {
    let response =
        "HTTP/1.1 200 OK\r\nContent-Length: 14\r\nConnection: close\r\n\r\ndata: [DONE]\n\n"
            .to_string();
    let (endpoint, server) = serve_once(response).await;

    let config = config_for(&endpoint);
    let client = Client::new(config.client_options()).unwrap();
    let mut session = ChatSession::new(client, config);
    let mut renderer = Capture::default();

    let reply = session.send_streaming("Hi", &mut renderer).await.unwrap();
    assert!(reply.is_empty());

    let request = server.await.unwrap().to_lowercase();
    assert!(!request.contains("authorization:"));
}

#[tokio::test]
async fn error_status_surfaces_body_and_rolls_back() {
    let body = "{\"error\":{\"message\":\"model not loaded\"}}";
    let response = format!(
        "HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let (endpoint, server) = serve_once(response).await;

    let config = config_for(&endpoint);
    let client = Client::new(config.client_options()).unwrap();
    let mut session = ChatSession::new(client, config);
    let mut renderer = Capture::default();

    let err = session.send_streaming("Hi", &mut renderer).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert!(err.to_string().contains("model not loaded"));
    assert!(renderer.text.is_empty());
    assert_eq!(session.message_count(), 1);
    server.await.unwrap();
}

#[tokio::test]
async fn refused_connection_is_a_turn_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let options = ClientOptions::new(format!("http://{addr}/v1"));
    let client = Client::new(options).unwrap();
    let mut session = ChatSession::new(client, ChatConfig::new());
    let mut renderer = Capture::default();

    let err = session.send_streaming("Hi", &mut renderer).await.unwrap_err();
    assert!(err.is_connection(), "{err:?}");
    assert_eq!(session.message_count(), 1);
}
