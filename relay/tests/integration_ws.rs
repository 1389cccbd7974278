use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Boot the real router on an OS-assigned port, same as the binary does.
async fn start_server() -> Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let state = relay_server::server::AppState::default();
    let app = relay_server::server::run::build_router(state, Path::new("public"));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server_handle = tokio::spawn(async move {
        let result = axum::serve(listener, app).await;
        if let Err(e) = result {
            eprintln!("server error: {}", e);
        }
    });

    // Give server a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok((addr, server_handle))
}

async fn connect(addr: std::net::SocketAddr) -> Result<WsStream> {
    let ws_url = format!("ws://127.0.0.1:{}/ws", addr.port());
    let (stream, _) = tokio_tungstenite::connect_async(&ws_url).await?;
    Ok(stream)
}

async fn send_json(ws: &mut WsStream, v: Value) -> Result<()> {
    ws.send(Message::Text(v.to_string())).await?;
    Ok(())
}

/// Next JSON text frame within a timeout, or None.
async fn recv_json(ws: &mut WsStream) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(300), ws.next()).await {
            Ok(Some(Ok(Message::Text(txt)))) => {
                if let Ok(v) = serde_json::from_str::<Value>(&txt) {
                    return Some(v);
                }
            }
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(_))) | Ok(None) => return None,
            Err(_) => continue,
        }
    }
    None
}

#[tokio::test]
async fn join_assigns_roles_and_main_disconnect_promotes_next() -> Result<()> {
    let (addr, server_handle) = start_server().await?;

    let mut a = connect(addr).await?;
    let mut b = connect(addr).await?;
    let mut c = connect(addr).await?;

    send_json(&mut a, json!({"type":"join","lobbyId":"x","playerName":"A"})).await?;
    let role_a = recv_json(&mut a).await.expect("A role reply");
    assert_eq!(role_a["type"], "role");
    assert_eq!(role_a["role"], "main");
    assert_eq!(role_a["number"], 1);

    send_json(&mut b, json!({"type":"join","lobbyId":"x","playerName":"B"})).await?;
    let role_b = recv_json(&mut b).await.expect("B role reply");
    assert_eq!(role_b["role"], "client");
    assert_eq!(role_b["number"], 2);

    send_json(&mut c, json!({"type":"join","lobbyId":"x","playerName":"C"})).await?;
    let role_c = recv_json(&mut c).await.expect("C role reply");
    assert_eq!(role_c["role"], "client");
    assert_eq!(role_c["number"], 3);
    assert_eq!(role_c["lobbyInfo"]["players"], json!(["A", "B", "C"]));

    // Main departs: the oldest survivor is promoted and notified.
    a.close(None).await?;
    let promotion = recv_json(&mut b).await.expect("B promotion notice");
    assert_eq!(promotion, json!({"type":"role","role":"main"}));

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn map_data_is_relayed_to_every_member_of_the_lobby() -> Result<()> {
    let (addr, server_handle) = start_server().await?;

    let mut main = connect(addr).await?;
    let mut client = connect(addr).await?;

    send_json(&mut main, json!({"type":"join","lobbyId":"game","playerName":"M"})).await?;
    recv_json(&mut main).await.expect("main role reply");
    send_json(&mut client, json!({"type":"join","lobbyId":"game","playerName":"C"})).await?;
    recv_json(&mut client).await.expect("client role reply");

    let map = json!({"type":"map-data","lobbyId":"game","mapData":{"tiles":[1,2,3]}});
    send_json(&mut main, map.clone()).await?;

    let got_main = recv_json(&mut main).await.expect("main gets relay");
    let got_client = recv_json(&mut client).await.expect("client gets relay");
    assert_eq!(got_main, map);
    assert_eq!(got_client, map);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn malformed_input_leaves_the_session_usable() -> Result<()> {
    let (addr, server_handle) = start_server().await?;

    let mut ws = connect(addr).await?;
    ws.send(Message::Text("this is not json".to_string())).await?;
    ws.send(Message::Text(r#"{"type":"join"}"#.to_string())).await?;

    // The session survives both bad frames and can still join.
    send_json(&mut ws, json!({"type":"join","lobbyId":"x"})).await?;
    let role = recv_json(&mut ws).await.expect("role reply after garbage");
    assert_eq!(role["role"], "main");
    assert_eq!(role["lobbyInfo"]["players"], json!(["Anonymous"]));

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn lobby_precheck_reports_existence_and_rejects_duplicates() -> Result<()> {
    let (addr, server_handle) = start_server().await?;

    // Plain TCP HTTP requests keep the dev-dependency surface small.
    async fn http_request(addr: std::net::SocketAddr, req: String) -> Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut stream = tokio::net::TcpStream::connect(addr).await?;
        stream.write_all(req.as_bytes()).await?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).to_string())
    }

    let get = |id: &str| {
        format!(
            "GET /api/lobbies/{} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            id
        )
    };
    let post = |id: &str| {
        format!(
            "POST /api/lobbies/{} HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            id
        )
    };

    let resp = http_request(addr, get("fresh")).await?;
    assert!(resp.contains(r#""exists":false"#), "unexpected: {}", resp);

    let resp = http_request(addr, post("fresh")).await?;
    assert!(resp.starts_with("HTTP/1.1 201"), "unexpected: {}", resp);

    let resp = http_request(addr, get("fresh")).await?;
    assert!(resp.contains(r#""exists":true"#), "unexpected: {}", resp);

    let resp = http_request(addr, post("fresh")).await?;
    assert!(resp.starts_with("HTTP/1.1 409"), "unexpected: {}", resp);

    // Joining and leaving deletes the lobby again.
    let mut ws = connect(addr).await?;
    send_json(&mut ws, json!({"type":"join","lobbyId":"fresh","playerName":"Solo"})).await?;
    recv_json(&mut ws).await.expect("role reply");
    ws.close(None).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let resp = http_request(addr, get("fresh")).await?;
    assert!(resp.contains(r#""exists":false"#), "unexpected: {}", resp);

    server_handle.abort();
    Ok(())
}
