//! End-to-end dispatch over the raw HTTP binding.

mod common;

use std::io::Write;

use reqwest::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};

use scipnet::config::ServerConfig;
use scipnet::http::ResponseBuilder;
use scipnet::permissions::{PermissionName, PermissionSet};
use scipnet::routing::{handler_fn, names, sync_handler, RouteTableBuilder};

use common::{client, start_server};

fn application_routes(builder: RouteTableBuilder) -> RouteTableBuilder {
    builder
        .write(
            names::PROCESS_LOGIN,
            sync_handler(|req, _| {
                let username = req.body().get_str("username").unwrap_or_default().to_string();
                Ok(ResponseBuilder::new()
                    .cookie("username", username, 3600)
                    .redirect("/")
                    .build())
            }),
        )
        .write(
            "sys/lock-page",
            handler_fn(|req, ctx| async move {
                match ctx.sessions().authorize(&req, PermissionName::LockPages).await {
                    Ok(session) => Ok(ResponseBuilder::new()
                        .json(&json!({ "errorCode": 0, "lockedBy": session.username() }))
                        .build()),
                    Err(denial) => Ok(denial.into_response(req.method())),
                }
            }),
        )
        .page_fallback(sync_handler(|req, _| {
            let page = req.params().get_str("pageid").unwrap_or_default().to_string();
            Ok(ResponseBuilder::new().send(format!("<h1>{}</h1>", page)).build())
        }))
}

#[tokio::test]
async fn test_static_assets() {
    let dir = tempfile::tempdir().unwrap();
    let main_page = dir.path().join("main.html");
    std::fs::write(&main_page, "<p>welcome</p>").unwrap();
    let font = dir.path().join("Sans.woff");
    std::fs::File::create(&font).unwrap().write_all(&[0x77, 0x4f, 0x46, 0x46]).unwrap();

    let mut config = ServerConfig::default();
    config.assets.main_page = Some(main_page);
    config.assets.fonts.insert("Sans.woff".into(), font);
    let server = start_server(config, application_routes).await;

    let res = client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/html");
    assert_eq!(res.text().await.unwrap(), "<p>welcome</p>");

    let res = client().get(server.url("/sys/fonts/Sans.woff")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "font/woff");
    assert_eq!(res.bytes().await.unwrap().as_ref(), &[0x77, 0x4f, 0x46, 0x46]);
}

#[tokio::test]
async fn test_page_fallback_and_not_found() {
    let server = start_server(ServerConfig::default(), application_routes).await;

    let res = client().get(server.url("/scp-173/ignored/segments")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "<h1>scp-173</h1>");

    let res = client().get(server.url("/sys/nothing-here")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[LOCATION], "/");

    let res = client().post(server.url("/sys/nothing-here")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errorCode"], 404);
}

#[tokio::test]
async fn test_form_login_sets_cookie_and_redirects() {
    let server = start_server(ServerConfig::default(), application_routes).await;

    let res = client()
        .post(server.url("/sys/process-login"))
        .form(&[("username", "ada lovelace"), ("password", "hunter2")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[LOCATION], "/");
    assert_eq!(
        res.headers()[SET_COOKIE],
        "username=ada%20lovelace; Max-Age=3600; Path=/"
    );
}

#[tokio::test]
async fn test_permission_gate() {
    let server = start_server(ServerConfig::default(), application_routes).await;
    let localhost = "127.0.0.1".parse().unwrap();

    // Anonymous.
    let res = client().post(server.url("/sys/lock-page")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Default permissions do not include locking.
    let session_id = server.sessions.create_session("ada", localhost);
    let res = client()
        .post(server.url("/sys/lock-page"))
        .header("Cookie", format!("sessionId={}", session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let mut permissions = PermissionSet::default();
    permissions.set(PermissionName::LockPages, true);
    server.sessions.set_permissions("ada", permissions);

    // Session id in a JSON body works as well as the cookie.
    let res = client()
        .post(server.url("/sys/lock-page"))
        .json(&json!({ "sessionId": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "errorCode": 0, "lockedBy": "ada" }));
}
