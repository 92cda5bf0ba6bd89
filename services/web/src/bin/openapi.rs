//! services/web/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the HTTP API.
//!
//! Usage: `openapi [OUTPUT]`. The document goes to `openapi.json` unless
//! another path is given. When `ENDPOINT_URL` is set (environment or `.env`)
//! it is listed as the server.

use std::error::Error;
use std::path::{Path, PathBuf};
use utoipa::openapi::OpenApi;
use web_lib::web::openapi_document;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn write_document(doc: &OpenApi, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_pretty_json()?)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let server_url = std::env::var("ENDPOINT_URL").ok();

    let doc = openapi_document(server_url.as_deref());
    write_document(&doc, &output)?;

    for path in doc.paths.paths.keys() {
        println!("  {}", path);
    }
    println!("OpenAPI document written to {}", output.display());
    Ok(())
}
