use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use syncboard_server::handlers::HistoryDump;
use syncboard_server::state::AppState;
use syncboard_shared::ServerMessage;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(cap: usize) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = syncboard_server::app(AppState::in_memory(cap), &[]);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, query: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws{query}")).await.unwrap();
    socket
}

async fn recv(socket: &mut Socket) -> Value {
    loop {
        let message = timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("receive timed out")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(socket: &mut Socket) {
    assert!(
        timeout(Duration::from_millis(150), socket.next()).await.is_err(),
        "expected no message"
    );
}

async fn send(socket: &mut Socket, value: Value) {
    socket.send(Message::text(value.to_string())).await.unwrap();
}

#[tokio::test]
async fn draw_clear_presence_and_late_join() {
    let addr = spawn_server(20_000).await;

    let mut a = connect(addr, "?sessionId=s1").await;
    assert_eq!(recv(&mut a).await, json!({"type": "snapshot", "data": []}));
    assert_eq!(recv(&mut a).await, json!({"type": "presence", "data": 1}));

    let mut b = connect(addr, "?sessionId=s2").await;
    assert_eq!(recv(&mut b).await, json!({"type": "snapshot", "data": []}));
    assert_eq!(recv(&mut b).await, json!({"type": "presence", "data": 2}));
    assert_eq!(recv(&mut a).await, json!({"type": "presence", "data": 2}));

    let stroke = json!({
        "prevPoint": {"x": 0.0, "y": 0.0},
        "currentPoint": {"x": 10.0, "y": 10.0},
        "color": "#000",
        "width": 2.0
    });
    send(&mut a, json!({"type": "draw", "data": stroke})).await;
    let relayed = recv(&mut b).await;
    assert_eq!(relayed["type"], "draw");
    assert_eq!(relayed["data"]["previousPoint"], stroke["prevPoint"]);
    assert_eq!(relayed["data"]["currentPoint"], stroke["currentPoint"]);
    assert_eq!(relayed["data"]["color"], "#000");
    assert_eq!(relayed["data"]["strokeWidth"], 2.0);
    assert_silent(&mut a).await;

    send(&mut a, json!({"type": "clear"})).await;
    assert_eq!(recv(&mut a).await, json!({"type": "clear"}));
    assert_eq!(recv(&mut b).await, json!({"type": "clear"}));

    let mut c = connect(addr, "").await;
    assert_eq!(recv(&mut c).await, json!({"type": "snapshot", "data": []}));
    assert_eq!(recv(&mut c).await, json!({"type": "presence", "data": 2}));
}

#[tokio::test]
async fn batch_replays_in_order_and_history_is_inspectable() {
    let addr = spawn_server(20_000).await;
    let mut a = connect(addr, "?sessionId=s1").await;
    recv(&mut a).await;
    recv(&mut a).await;
    let mut b = connect(addr, "?sessionId=s2").await;
    recv(&mut b).await;
    recv(&mut b).await;

    let segment = |n: i32| {
        json!({
            "previousPoint": {"x": n, "y": 0},
            "currentPoint": {"x": n + 1, "y": 0},
            "color": "red",
            "strokeWidth": 4
        })
    };
    let batch: Vec<Value> = (0..3).map(segment).collect();
    send(&mut a, json!({"type": "draw", "data": batch})).await;
    send(&mut a, json!({"type": "draw", "data": {"color": "broken"}})).await;
    send(&mut a, Value::String("not even a message".into())).await;
    send(&mut a, json!({"type": "draw", "data": segment(3)})).await;

    let relayed = recv(&mut b).await;
    assert_eq!(relayed["data"].as_array().map(Vec::len), Some(3));
    let relayed = recv(&mut b).await;
    assert_eq!(relayed["data"]["previousPoint"]["x"], 3.0);

    let mut late = connect(addr, "").await;
    let snapshot = recv(&mut late).await;
    let operations = snapshot["data"].as_array().unwrap();
    let sequences: Vec<u64> = operations.iter().map(|op| op["sequence"].as_u64().unwrap()).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
    assert_eq!(operations[2]["previousPoint"]["x"], 2.0);

    let body = http_get(addr, "/history").await;
    let dump: HistoryDump = serde_json::from_str(&body).unwrap();
    assert_eq!(dump.count, 4);
    assert_eq!(dump.history.len(), 4);
}

#[tokio::test]
async fn bincode_connections_get_binary_frames() {
    let addr = spawn_server(20_000).await;
    let mut a = connect(addr, "?format=bincode").await;
    let message = timeout(Duration::from_secs(2), a.next()).await.unwrap().unwrap().unwrap();
    let Message::Binary(bytes) = &message else {
        panic!("expected binary frame, got {message:?}");
    };
    let (decoded, _): (ServerMessage, usize) =
        bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
    assert_eq!(decoded, ServerMessage::Snapshot(Vec::new()));
}

#[tokio::test]
async fn disconnect_lowers_presence() {
    let addr = spawn_server(20_000).await;
    let mut a = connect(addr, "?sessionId=s1").await;
    recv(&mut a).await;
    recv(&mut a).await;
    let mut b = connect(addr, "?sessionId=s2").await;
    recv(&mut b).await;
    recv(&mut b).await;
    assert_eq!(recv(&mut a).await, json!({"type": "presence", "data": 2}));

    b.close(None).await.unwrap();
    assert_eq!(recv(&mut a).await, json!({"type": "presence", "data": 1}));
}

#[tokio::test]
async fn relay_is_exact_for_pixel_coordinates_and_large_batches() {
    let addr = spawn_server(20_000).await;
    let mut a = connect(addr, "?sessionId=s1").await;
    recv(&mut a).await;
    recv(&mut a).await;
    let mut b = connect(addr, "?sessionId=s2").await;
    recv(&mut b).await;
    recv(&mut b).await;

    let stroke = json!({
        "previousPoint": {"x": 1234.5678, "y": 42.4242},
        "currentPoint": {"x": 523.3333333, "y": 17.1},
        "color": "#ff0000",
        "strokeWidth": 3.3
    });
    send(&mut a, json!({"type": "draw", "data": stroke})).await;
    assert_eq!(recv(&mut b).await, json!({"type": "draw", "data": stroke}));

    let batch: Vec<Value> = (0..5000)
        .map(|n| {
            json!({
                "previousPoint": {"x": n as f64 + 0.1, "y": 0.5},
                "currentPoint": {"x": n as f64 + 1.1, "y": 0.5},
                "color": "blue",
                "strokeWidth": 1.5
            })
        })
        .collect();
    send(&mut a, json!({"type": "draw", "data": batch})).await;
    let relayed = recv(&mut b).await;
    assert_eq!(relayed["data"], Value::Array(batch));

    let body = http_get(addr, "/history").await;
    let dump: HistoryDump = serde_json::from_str(&body).unwrap();
    assert_eq!(dump.count, 5001);
    assert_eq!(dump.history[0].segment.previous_point.x, 1234.5678);
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    assert!(head.starts_with("HTTP/1.1 200"), "unexpected response: {head}");
    body.to_string()
}
