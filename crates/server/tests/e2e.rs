use std::net::SocketAddr;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use configs::{AppConfig, BackendKind};
use server::startup::{build_app, build_state};

struct TestApp {
    base_url: String,
}

async fn start_server(cfg: AppConfig) -> anyhow::Result<TestApp> {
    let state = build_state(&cfg).await?;
    let app = build_app(state);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn memory_config(seed: bool) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.backend.kind = BackendKind::Memory;
    cfg.seed.on_startup = seed;
    cfg
}

#[tokio::test]
async fn e2e_seeded_fixture_is_served() -> anyhow::Result<()> {
    let app = start_server(memory_config(true)).await?;
    let c = reqwest::Client::new();

    let res = c.get(format!("{}/cart/all", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    let ids: Vec<&str> = body["all carts"]
        .as_array()
        .map(|a| a.iter().filter_map(|c| c["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec!["bill", "dan", "shri"]);

    let res = c.get(format!("{}/cart/total/shri", app.base_url)).send().await?;
    assert_eq!(res.text().await?, "404.5");
    Ok(())
}

#[tokio::test]
async fn e2e_unseeded_start_keeps_stored_carts() -> anyhow::Result<()> {
    let data = std::env::temp_dir().join(format!("carts_{}.json", uuid::Uuid::new_v4()));
    let stored = json!({"erin": json!([{"sku": {"name": "hat", "quantity": 2, "price": 3}}]).to_string()});
    tokio::fs::write(&data, stored.to_string()).await?;

    let mut cfg = AppConfig::default();
    cfg.backend.kind = BackendKind::File;
    cfg.backend.file_path = data.display().to_string();
    cfg.seed.on_startup = false;
    let app = start_server(cfg).await?;
    let c = reqwest::Client::new();

    let res = c.get(format!("{}/cart/items/erin", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["erin-cart"][0]["sku"]["name"], "hat");

    for user in ["bill", "dan", "shri"] {
        let res = c.get(format!("{}/cart/items/{user}", app.base_url)).send().await?;
        assert_eq!(res.status(), HttpStatusCode::NO_CONTENT, "{user}");
    }

    for price in ["1.5", "2"] {
        let res = c
            .post(format!("{}/cart/item/erin", app.base_url))
            .json(&json!({"sock": {"name": "sock", "quantity": 2, "price": price}}))
            .send()
            .await?;
        assert_eq!(res.status(), HttpStatusCode::OK);
    }

    let res = c.get(format!("{}/cart/all", app.base_url)).send().await?;
    let body = res.json::<Value>().await?;
    let all = body["all carts"].as_array().cloned().unwrap_or_default();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["id"], "erin");
    assert_eq!(all[0]["cart"].as_array().map(Vec::len), Some(3));

    let res = c.get(format!("{}/cart/total/erin", app.base_url)).send().await?;
    assert_eq!(res.text().await?, "13.0");

    let _ = tokio::fs::remove_file(&data).await;
    Ok(())
}

#[tokio::test]
async fn e2e_unreachable_redis_fails_startup() {
    let mut cfg = AppConfig::default();
    cfg.backend.kind = BackendKind::Redis;
    cfg.backend.redis_url = "redis://127.0.0.1:1/0".into();
    cfg.backend.op_timeout_ms = 300;
    assert!(start_server(cfg).await.is_err());
}
