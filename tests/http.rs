use brand_dashboard::DateKey;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct DashboardView {
    table: TableView,
    selector: Vec<DayCell>,
    status: StatusView,
}

#[derive(Debug, Deserialize)]
struct TableView {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    date: String,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct DayCell {
    key: String,
    enabled: bool,
    selected: bool,
}

#[derive(Debug, Deserialize)]
struct StatusView {
    error: Option<String>,
    empty_selection: bool,
}

impl DashboardView {
    fn selected(&self) -> Vec<String> {
        self.selector
            .iter()
            .filter(|cell| cell.selected)
            .map(|cell| cell.key.clone())
            .collect()
    }
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn days_ago(days: i64) -> String {
    DateKey::today().offset_days(-days).to_string()
}

fn seeded_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("brand_dashboard_http_{}_{}.json", std::process::id(), nanos));

    let records: Vec<serde_json::Value> = (0..5)
        .flat_map(|offset| {
            [
                serde_json::json!({ "day": days_ago(offset), "brand": "M1", "total_count": 4 }),
                serde_json::json!({ "day": days_ago(offset), "brand": "K1", "total_count": 2 }),
                serde_json::json!({ "day": days_ago(offset), "brand": "Otros", "total_count": 50 }),
            ]
        })
        .collect();
    std::fs::write(&path, serde_json::to_vec(&records).unwrap()).expect("write seed data");
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/dashboard")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = seeded_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_brand_dashboard"))
        .env("PORT", port.to_string())
        .env("DASHBOARD_DATA_PATH", data_path)
        .env("DASHBOARD_INITIAL_DAYS", "3")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn post(client: &Client, server: &TestServer, path: &str, body: serde_json::Value) -> DashboardView {
    let response = client
        .post(format!("{}{path}", server.base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success(), "{path} failed: {}", response.status());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_dashboard_serves_pivot_and_selector() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let view = post(
        &client,
        &server,
        "/api/selector/range",
        serde_json::json!({ "start": days_ago(2), "end": days_ago(0) }),
    )
    .await;

    assert_eq!(view.table.columns, ["M1", "K1"]);
    assert_eq!(view.table.rows.len(), 3);
    assert!(view.table.rows.iter().all(|row| row.total == 6));
    assert!(!view.table.rows[0].date.is_empty());
    assert_eq!(view.selected(), [days_ago(2), days_ago(1), days_ago(0)]);
    assert!(view.selector.iter().any(|cell| cell.enabled));
    assert_eq!(view.status.error, None);

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Daily brand counts"));
}

#[tokio::test]
async fn http_drag_selects_contiguous_days() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    post(
        &client,
        &server,
        "/api/selector/range",
        serde_json::json!({ "start": days_ago(0), "end": days_ago(0) }),
    )
    .await;
    post(
        &client,
        &server,
        "/api/selector/pointer",
        serde_json::json!({ "kind": "down", "date": days_ago(4) }),
    )
    .await;
    post(
        &client,
        &server,
        "/api/selector/pointer",
        serde_json::json!({ "kind": "enter", "date": days_ago(2) }),
    )
    .await;
    let view = post(
        &client,
        &server,
        "/api/selector/pointer",
        serde_json::json!({ "kind": "up" }),
    )
    .await;

    assert_eq!(
        view.selected(),
        [days_ago(4), days_ago(3), days_ago(2), days_ago(0)]
    );
    assert_eq!(view.table.rows.len(), 4);
}

#[tokio::test]
async fn http_toggle_to_empty_shows_empty_state() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    post(
        &client,
        &server,
        "/api/selector/range",
        serde_json::json!({ "start": days_ago(1), "end": days_ago(1) }),
    )
    .await;
    let view = post(
        &client,
        &server,
        "/api/selector/toggle",
        serde_json::json!({ "date": days_ago(1) }),
    )
    .await;

    assert!(view.selected().is_empty());
    assert!(view.table.rows.is_empty());
    assert!(view.status.empty_selection);
}

#[tokio::test]
async fn http_ingest_refreshes_ranking() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    // a day no other test selects, inside the enabled range
    post(
        &client,
        &server,
        "/api/records",
        serde_json::json!({ "day": days_ago(10), "brand": "ZZ", "count": 1000 }),
    )
    .await;
    let view = post(
        &client,
        &server,
        "/api/selector/range",
        serde_json::json!({ "start": days_ago(10), "end": days_ago(10) }),
    )
    .await;

    assert_eq!(view.table.columns, ["ZZ"]);
    assert_eq!(view.table.rows.len(), 1);
    assert_eq!(view.table.rows[0].total, 1000);
}

#[tokio::test]
async fn http_rejects_malformed_dates() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/selector/toggle", server.base_url))
        .json(&serde_json::json!({ "date": "yesterday" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/selector/pointer", server.base_url))
        .json(&serde_json::json!({ "kind": "down" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_ingest_rejects_days_past_the_horizon() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for day in ["+262142-12-31", "9999-12-31"] {
        let response = client
            .post(format!("{}/api/records", server.base_url))
            .json(&serde_json::json!({ "day": day, "brand": "M1", "count": 1 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{day} was accepted");
    }

    let view: DashboardView = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(view.selector.len() <= 7 * 53);
    assert!(view.selector.iter().all(|cell| cell.key.len() == 10));
}
