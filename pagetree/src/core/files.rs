//! Endpoint responses read from files under the API directory.

use std::path::{Path, PathBuf};

use pagetree_core::page::compose;
use pagetree_core::{CoreError, Response, Settings};

fn api_file(settings: &Settings, rel: &str) -> PathBuf {
    settings.api_dir().join(Path::new(rel.trim_start_matches('/')))
}

/// JSON body from `<apiRoot>/<rel>`; invalid JSON is an error.
pub async fn json_from_file(settings: &Settings, rel: &str) -> Result<Response, CoreError> {
    let body = tokio::fs::read_to_string(api_file(settings, rel)).await?;
    Response::json(&body)
}

/// HTML from `<apiRoot>/<file>`s, each file composed into the `{{content}}`
/// marker of the one before it: `["../index.html", "item.html"]` renders the
/// item inside the site layout.
pub async fn html_from_files(settings: &Settings, files: &[&str]) -> Result<Response, CoreError> {
    let mut parts = Vec::with_capacity(files.len());
    for file in files {
        parts.push(tokio::fs::read_to_string(api_file(settings, file)).await?);
    }
    let html = parts
        .iter()
        .rev()
        .fold(None::<String>, |inner, layout| match inner {
            None => Some(layout.clone()),
            Some(inner) => Some(compose(Some(layout.as_str()), &inner)),
        })
        .unwrap_or_default();
    Ok(Response::html(html))
}
