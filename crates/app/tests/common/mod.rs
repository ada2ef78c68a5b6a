//! Shared helpers for driving the admin router in-process
#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use ::common::prelude::*;
use site_admin::http_server::{self, Config};
use site_admin::ServiceState;

pub const PASSWORD: &str = "secret";

/// Writes a one-page site into htdocs, like a real generator would.
pub const GENERATOR_SCRIPT: &str =
    "mkdir -p htdocs && printf '<html><body><h1>built</h1></body></html>' > htdocs/index.html";

pub struct TestApp {
    pub dir: TempDir,
    pub layout: SiteLayout,
    pub router: Router,
}

impl TestApp {
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// Log in with the test password and return the `Cookie` header value.
    pub async fn login(&self) -> String {
        let response = self
            .post_form("/_/admin/login/", &format!("password={}", PASSWORD), None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets a cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

/// Site with hashed credentials and a shell generator; `extra_yaml` is
/// appended to wmk_admin.yaml.
pub fn setup_app(extra_yaml: &str) -> TestApp {
    let dir = TempDir::new().unwrap();
    let layout = SiteLayout::new(dir.path());
    for root in Root::ALL {
        std::fs::create_dir_all(layout.root_dir(root)).unwrap();
    }
    std::fs::create_dir_all(layout.work_dir()).unwrap();
    std::fs::write(layout.config_file(), "site:\n  title: Test Site\n").unwrap();

    let yaml = format!(
        "admin_password: {}\ngenerator:\n  program: sh\n  args: [\"-c\", \"{}\"]\n  timeout_secs: 10\n{}",
        ::common::session::sha256_hex(PASSWORD),
        GENERATOR_SCRIPT.replace('"', "\\\""),
        extra_yaml
    );
    let config = AdminConfig::from_yaml(&yaml).unwrap();
    let state = ServiceState::new(layout.clone(), config);
    let router = http_server::router(
        Config::new("localhost".into(), 0, tracing::Level::DEBUG),
        state,
    );
    TestApp {
        dir,
        layout,
        router,
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect has a location")
        .to_str()
        .unwrap()
}
