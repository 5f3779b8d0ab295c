use calcdeck::api::{AppState, build_router};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_app() -> std::net::SocketAddr {
    let app = build_router(AppState::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    body: Option<&Value>,
) -> (u16, String, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    if body.is_some() {
        req.push_str("Content-Type: application/json\r\n");
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n", payload.len()));
    req.push_str(&payload);
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    let json = serde_json::from_str(body).expect("json body");
    (status, head.to_ascii_lowercase(), json)
}

#[tokio::test]
async fn lists_calculators_without_caching() {
    let addr = spawn_app().await;
    let (status, head, body) = send_raw(addr, "GET", "/api/calculators", None).await;
    assert_eq!(status, 200);
    assert!(head.contains("cache-control: no-store"));
    let ids = body
        .as_array()
        .expect("catalog array")
        .iter()
        .map(|c| c["id"].as_str().expect("id"))
        .collect::<Vec<_>>();
    assert!(ids.contains(&"concrete"));
    assert!(ids.contains(&"credit-card-payoff"));
    assert_eq!(ids.len(), 13);
}

#[tokio::test]
async fn share_link_and_json_body_agree() {
    let addr = spawn_app().await;
    let (status, _, from_query) = send_raw(
        addr,
        "GET",
        "/api/calculators/concrete?shape=slab&lengthFt=12&widthFt=10&thicknessIn=4",
        None,
    )
    .await;
    assert_eq!(status, 200);

    let input = json!({ "shape": "slab", "lengthFt": 12, "widthFt": 10, "thicknessIn": 4 });
    let (status, _, from_json) = send_raw(addr, "POST", "/api/calculators/concrete", Some(&input)).await;
    assert_eq!(status, 200);
    assert_eq!(from_query, from_json);
    let cubic_feet = from_json["cubicFeet"].as_f64().expect("cubicFeet");
    assert!((cubic_feet - 40.0).abs() < 1e-9);
}

#[tokio::test]
async fn errors_map_to_statuses() {
    let addr = spawn_app().await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/calculators/tip",
        Some(&json!({ "bill": 100, "tipPercent": 180 })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["field"], "tipPercent");

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/calculators/credit-card-payoff",
        Some(&json!({ "strategy": "fixed", "balance": 5000, "apr": 12, "monthlyPayment": 50 })),
    )
    .await;
    assert_eq!(status, 422);
    assert!(body["error"].as_str().expect("error").contains("never amortizes"));

    let (status, _, body) = send_raw(addr, "GET", "/api/calculators/mortgage", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "unknown calculator 'mortgage'");

    let (status, _, body) = send_raw(addr, "GET", "/nowhere", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn scenarios_can_be_saved_fetched_and_deleted() {
    let addr = spawn_app().await;
    let new = json!({
        "name": "Dinner for three",
        "calculator": "tip",
        "inputs": { "bill": 90, "tipPercent": 20, "people": 3 }
    });
    let (status, _, saved) = send_raw(addr, "POST", "/api/scenarios", Some(&new)).await;
    assert_eq!(status, 201);
    assert_eq!(saved["result"]["perPerson"], json!(36.0));
    let id = saved["id"].as_str().expect("id").to_string();

    let (status, _, listed) = send_raw(addr, "GET", "/api/scenarios", None).await;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().expect("list").len(), 1);

    let path = format!("/api/scenarios/{id}");
    let (status, _, fetched) = send_raw(addr, "GET", &path, None).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["name"], "Dinner for three");

    let (status, _, _) = send_raw(addr, "DELETE", &path, None).await;
    assert_eq!(status, 200);
    let (status, _, _) = send_raw(addr, "GET", &path, None).await;
    assert_eq!(status, 404);
}
