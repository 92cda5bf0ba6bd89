//! Shared fixtures for driving the router end to end.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use josekit::{
    jwe::{self, JweHeader, ECDH_ES_A256KW},
    jwk::alg::ec::{EcCurve, EcKeyPair},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::Level;
use visit_core::ports::DocumentStore;
use web_lib::{
    adapters::{FsDocumentStore, JweIdentityResolver, TemplateRenderer},
    config::Config,
    web::{router, AppState},
};

pub const ENDPOINT_URL: &str = "https://visit.example.com/";

/// A throwaway deployment: key file, templates, static and save directories.
pub struct TestApp {
    pub root: TempDir,
    pub key_pair: EcKeyPair,
    pub save_dir: Option<PathBuf>,
    pub app: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(true)
    }

    pub fn without_storage() -> Self {
        Self::build(false)
    }

    fn build(with_storage: bool) -> Self {
        let root = tempfile::tempdir().unwrap();
        let key_pair = EcKeyPair::generate(EcCurve::P256).unwrap();

        let key_path = root.path().join("private_key.json");
        std::fs::write(&key_path, key_pair.to_jwk_key_pair().to_string()).unwrap();

        let templates_dir = root.path().join("templates");
        std::fs::create_dir(&templates_dir).unwrap();
        std::fs::write(
            templates_dir.join("index.html"),
            "<h1>{{ user_name }}</h1>{{ content }}",
        )
        .unwrap();
        std::fs::write(
            templates_dir.join("document.html"),
            "<script>{{ document }}</script>",
        )
        .unwrap();
        std::fs::write(templates_dir.join("document_example.html"), "<p>example</p>").unwrap();

        let static_dir = root.path().join("static");
        std::fs::create_dir_all(static_dir.join("js")).unwrap();
        std::fs::write(static_dir.join("js").join("main.js"), "console.log(1);").unwrap();

        let save_dir = with_storage.then(|| {
            let dir = root.path().join("saves");
            std::fs::create_dir(&dir).unwrap();
            dir
        });

        let config = Config {
            listen_address: "127.0.0.1:0".parse().unwrap(),
            endpoint_url: ENDPOINT_URL.to_string(),
            save_dir: save_dir.clone(),
            key_path: key_path.clone(),
            static_dir,
            templates_dir: templates_dir.clone(),
            log_level: Level::INFO,
        };

        let state = Arc::new(AppState {
            config: Arc::new(config),
            identity: Arc::new(JweIdentityResolver::new(&key_path)),
            store: save_dir
                .as_ref()
                .map(|dir| Arc::new(FsDocumentStore::new(dir)) as Arc<dyn DocumentStore>),
            renderer: Arc::new(TemplateRenderer::new(&templates_dir)),
        });

        Self {
            root,
            key_pair,
            save_dir,
            app: router(state),
        }
    }

    pub fn key_path(&self) -> PathBuf {
        self.root.path().join("private_key.json")
    }

    /// Mints a token for this deployment's key, the way the issuer does.
    pub fn token(&self, claims: &str) -> String {
        mint(&self.key_pair, claims)
    }

    pub fn user_dir(&self, user_id: i64) -> PathBuf {
        self.save_dir
            .as_ref()
            .expect("storage enabled")
            .join(format!("{:05}", user_id))
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn save(&self, token: Option<&str>, body: impl Into<Body>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/save")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={}", token));
        }
        self.send(builder.body(body.into()).unwrap()).await
    }
}

pub fn mint(key_pair: &EcKeyPair, claims: &str) -> String {
    let mut header = JweHeader::new();
    header.set_content_encryption("A256CBC-HS512");
    let encrypter = ECDH_ES_A256KW
        .encrypter_from_jwk(&key_pair.to_jwk_public_key())
        .unwrap();
    jwe::serialize_compact(claims.as_bytes(), &header, &encrypter).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Lists the regular files in `dir`, or nothing when it does not exist.
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.is_file())
            .collect(),
        Err(_) => Vec::new(),
    }
}
