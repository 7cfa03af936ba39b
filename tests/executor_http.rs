//! RequestExecutor against a loopback HTTP backend.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use gamelink_net::config::ClientConfig;
use gamelink_net::events::ErrorNotice;
use gamelink_net::http::ImageCodec;
use gamelink_net::{ApiError, MultipartForm, RequestExecutor, RequestTimeout, TextureStore};

mod common;

fn config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.identity.version = "3.4.0".into();
    config.identity.token = "session-abc".into();
    config.identity.device_type = "iOS".into();
    config.identity.uuid = Some("device-42".into());
    config.http.timeout_ceiling_secs = 30;
    config
}

fn executor() -> (RequestExecutor, mpsc::UnboundedReceiver<ErrorNotice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let executor = RequestExecutor::from_config(&config(), Arc::new(tx)).unwrap();
    (executor, rx)
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[derive(Debug, Deserialize, PartialEq)]
struct Profile {
    name: String,
    level: u32,
}

#[tokio::test]
async fn test_get_sends_identity_and_decodes() {
    let (addr, captured) = common::start_mock_backend(200, r#"{"name":"ana","level":7}"#).await;
    let (executor, mut notices) = executor();

    let profile: Profile = executor
        .get(&format!("http://{addr}/profile"), RequestTimeout::Default)
        .await
        .unwrap();
    assert_eq!(profile, Profile { name: "ana".into(), level: 7 });

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/profile");
    assert_eq!(request.header("vNo"), Some("3.4.0"));
    assert_eq!(request.header("token"), Some("session-abc"));
    assert_eq!(request.header("Device-Type"), Some("iOS"));
    assert_eq!(request.header("UUID"), Some("device-42"));
    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert!(request.body.is_empty());
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_post_round_trip() {
    let (addr, captured) = common::start_programmable_backend(|request| async move {
        (200, request.body)
    })
    .await;
    let (executor, mut notices) = executor();

    let value: Value = executor
        .post(&format!("http://{addr}/echo"), r#"{"a":1}"#, RequestTimeout::Default)
        .await
        .unwrap();
    assert_eq!(value, serde_json::json!({"a": 1}));

    let requests = captured.lock().unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].header("Content-Type"), Some("application/json"));
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_put_and_patch_use_their_verbs() {
    let (addr, captured) = common::start_mock_backend(200, "{}").await;
    let (executor, _notices) = executor();
    let url = format!("http://{addr}/settings");

    let _: Value = executor.put(&url, "{}", RequestTimeout::Secs(5)).await.unwrap();
    let _: Value = executor.patch(&url, "{}", RequestTimeout::Secs(5)).await.unwrap();

    let methods: Vec<String> = captured.lock().unwrap().iter().map(|r| r.method.clone()).collect();
    assert_eq!(methods, vec!["PUT", "PATCH"]);
}

#[tokio::test]
async fn test_error_status_notifies_sink() {
    let (addr, _captured) = common::start_mock_backend(500, r#"{"error":"boom"}"#).await;
    let (executor, mut notices) = executor();

    let err = executor
        .get::<Value>(&format!("http://{addr}/x"), RequestTimeout::Default)
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status(), Some(500));

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.status, 500);
    assert_eq!(notice.body, r#"{"error":"boom"}"#);
}

#[tokio::test]
async fn test_connection_refused_notifies_status_zero() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (executor, mut notices) = executor();

    let err = executor
        .post::<Value>(&format!("http://{addr}/x"), "{}", RequestTimeout::Default)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(0));
    assert_eq!(notices.recv().await.unwrap(), ErrorNotice { status: 0, body: String::new() });
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let (addr, _captured) = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, b"{}".to_vec())
    })
    .await;
    let (executor, mut notices) = executor();

    let start = Instant::now();
    let err = executor
        .post::<Value>(&format!("http://{addr}/slow"), "{}", RequestTimeout::Secs(1))
        .await
        .unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(4));
    assert!(err.is_transport());
    assert_eq!(notices.recv().await.unwrap().status, 0);
}

#[tokio::test]
async fn test_rejected_timeout_sends_nothing() {
    let (addr, captured) = common::start_mock_backend(200, "{}").await;
    let (executor, mut notices) = executor();

    let err = executor
        .post::<Value>(&format!("http://{addr}/x"), "{}", RequestTimeout::Secs(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::TimeoutRejected(0)));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(captured.lock().unwrap().is_empty());
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_multipart_upload() {
    let (addr, captured) = common::start_mock_backend(201, r#"{"ok":true}"#).await;
    let (executor, _notices) = executor();

    let form = MultipartForm::new()
        .field("caption", "my avatar")
        .file("avatar", "me.png", "image/png", png_bytes());
    let value: Value = executor
        .post_form(&format!("http://{addr}/upload"), &form, RequestTimeout::Default)
        .await
        .unwrap();
    assert_eq!(value["ok"], true);

    let requests = captured.lock().unwrap();
    let content_type = requests[0].header("Content-Type").unwrap();
    assert_eq!(content_type, format!("multipart/form-data; boundary={}", form.boundary()));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="caption""#));
    assert!(body.contains("my avatar"));
    assert!(body.contains(r#"filename="me.png""#));
}

#[tokio::test]
async fn test_texture_download_and_store() {
    let png = png_bytes();
    let (addr, captured) = common::start_programmable_backend(move |_| {
        let png = png.clone();
        async move { (200, png) }
    })
    .await;
    let (executor, _notices) = executor();
    let store = TextureStore::new();

    executor
        .fetch_texture_into(11, &format!("http://{addr}/img/a.png"), &store)
        .await
        .unwrap();
    let texture = store.get(11).unwrap();
    assert_eq!((texture.width, texture.height), (2, 3));

    // PNG bytes behind a .webp URL still go to the WebP decoder
    let err = executor
        .get_texture(&format!("http://{addr}/img/a.webp"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Image { codec: ImageCodec::WebP, .. }));

    assert!(captured.lock().unwrap()[0].header("Content-Type").is_none());
}

#[tokio::test]
async fn test_download_file() {
    let (addr, _captured) = common::start_programmable_backend(|request| async move {
        if request.path == "/files/level.bin" {
            (200, vec![7u8; 10_000])
        } else {
            (404, b"missing".to_vec())
        }
    })
    .await;
    let (executor, mut notices) = executor();
    let dir = tempfile::tempdir().unwrap();

    let dest = dir.path().join("level.bin");
    let bytes = executor
        .download_file(&format!("http://{addr}/files/level.bin"), &dest, RequestTimeout::Default)
        .await
        .unwrap();
    assert_eq!(bytes, 10_000);
    assert_eq!(std::fs::read(&dest).unwrap().len(), 10_000);

    let missing = dir.path().join("missing.bin");
    let err = executor
        .download_file(&format!("http://{addr}/files/nope"), &missing, RequestTimeout::Default)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(!missing.exists());
    assert_eq!(notices.recv().await.unwrap().status, 404);
}

#[tokio::test]
async fn test_save_texture_under_storage_root() {
    let (addr, _captured) = common::start_mock_backend(200, "raw-bytes").await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("7")).unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut config = config();
    config.storage.root = dir.path().to_path_buf();
    let executor = RequestExecutor::from_config(&config, Arc::new(tx)).unwrap();

    let path = executor
        .save_texture("7", &format!("http://{addr}/q.png"), "q.png")
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("7").join("q.png"));
    assert_eq!(std::fs::read(path).unwrap(), b"raw-bytes");
}
