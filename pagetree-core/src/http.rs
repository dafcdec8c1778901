//! Async HTTP server: tokio + hyper, one `Dispatcher` shared by every connection.
//! Host/port come from `ListenAddr` (env HOST/PORT, overridden by CLI flags).

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request as HyperRequest, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::ListenAddr;
use crate::dispatch::Dispatcher;
use crate::handler::{Request, Response};

/// Start a multi-thread runtime and serve until ctrl-c.
pub fn run(
    dispatcher: Arc<Dispatcher>,
    addr: &ListenAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(serve(dispatcher, addr.to_addr_string()))
}

/// Accept loop for an already running runtime.
pub async fn serve(
    dispatcher: Arc<Dispatcher>,
    addr: String,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                break Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(x) => x,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let dispatcher = Arc::clone(&dispatcher);
                tokio::task::spawn(async move {
                    let service = service_fn(move |req: HyperRequest<hyper::body::Incoming>| {
                        let dispatcher = Arc::clone(&dispatcher);
                        async move { handle(dispatcher, req).await }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        tracing::debug!(%peer, error = %e, "connection closed with error");
                    }
                });
            }
        }
    }
}

async fn handle(
    dispatcher: Arc<Dispatcher>,
    req: HyperRequest<hyper::body::Incoming>,
) -> Result<HyperResponse<Full<Bytes>>, Infallible> {
    let head = *req.method() == hyper::Method::HEAD;
    let req = match from_hyper(req).await {
        Ok(req) => req,
        Err(e) => return Ok(to_hyper(Response::bad_request(e), false)),
    };
    let method = req.method.clone();
    let path = req.path.clone();
    let resp = dispatcher.dispatch(req).await;
    tracing::info!(%method, %path, status = resp.status_code, "request");
    Ok(to_hyper(resp, head))
}

async fn from_hyper(req: HyperRequest<hyper::body::Incoming>) -> Result<Request, hyper::Error> {
    let (parts, body) = req.into_parts();
    let headers = parts
        .headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                v.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();
    let body = body.collect().await?.to_bytes();
    Ok(Request {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or("").to_string(),
        headers,
        body: body.to_vec(),
        path_values: Default::default(),
    })
}

fn to_hyper(resp: Response, head: bool) -> HyperResponse<Full<Bytes>> {
    let status = StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = if head { Bytes::new() } else { Bytes::from(resp.body) };
    let mut out = HyperResponse::new(Full::new(body));
    *out.status_mut() = status;
    if let Some(ct) = resp.content_type.as_deref() {
        if let Ok(value) = HeaderValue::from_str(ct) {
            out.headers_mut().insert(CONTENT_TYPE, value);
        }
    }
    out
}
