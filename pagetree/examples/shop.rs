//! Example: file-routed shop pages under demos/shop plus a small JSON API.
//!
//! cargo run -p pagetree --example shop, then open http://127.0.0.1:8000/items

use std::sync::Arc;

use async_trait::async_trait;
use pagetree::{
    html_from_files, Application, CoreError, Endpoint, Handler, ListenAddr, Method, Module,
    Request, Response, Settings,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Clone, Debug, Serialize)]
struct Item {
    id: u32,
    name: String,
    price: u32,
}

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
    price: u32,
}

type Store = Arc<RwLock<Vec<Item>>>;

async fn list_items(store: Store) -> Result<Response, CoreError> {
    let items = store.read().await;
    Response::json_value(&serde_json::to_value(&*items)?)
}

async fn create_item(store: Store, req: Request) -> Result<Response, CoreError> {
    let new: NewItem = match serde_json::from_slice(&req.body) {
        Ok(new) => new,
        Err(e) => return Ok(Response::bad_request(e)),
    };
    let mut items = store.write().await;
    let item = Item {
        id: items.iter().map(|i| i.id).max().unwrap_or(0) + 1,
        name: new.name,
        price: new.price,
    };
    tracing::info!(id = item.id, name = %item.name, "item created");
    items.push(item.clone());
    Ok(Response::json_value(&serde_json::to_value(&item)?)?.with_status(201))
}

async fn get_item(store: Store, req: Request) -> Result<Response, CoreError> {
    let id: u32 = match req.path_value("id").unwrap_or("").parse() {
        Ok(id) => id,
        Err(e) => return Ok(Response::bad_request(e)),
    };
    let items = store.read().await;
    match items.iter().find(|i| i.id == id) {
        Some(item) => Response::json_value(&serde_json::to_value(item)?),
        None => Err(CoreError::NotFound(format!("item {}", id))),
    }
}

/// `/api/items` and `/api/items/{id}`.
struct ItemsModule {
    store: Store,
}

impl Module for ItemsModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        let store = Arc::clone(&self.store);
        app.register_on_path("/api/items", Method::GET, move |_req| {
            list_items(Arc::clone(&store))
        });
        let store = Arc::clone(&self.store);
        app.register_on_path("/api/items", Method::POST, move |req| {
            create_item(Arc::clone(&store), req)
        });
        let store = Arc::clone(&self.store);
        app.register_on_path("/api/items/{id}", Method::GET, move |req| {
            get_item(Arc::clone(&store), req)
        });
        Ok(())
    }
}

struct Health;

#[async_trait]
impl Handler for Health {
    async fn call(&self, _req: Request) -> Result<Response, CoreError> {
        Response::json(r#"{"status":"ok"}"#)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    pagetree::init_logging();

    let demo = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/shop");
    let settings = Settings::load(Some(std::path::Path::new(&format!(
        "{}/pagetree.config.json",
        demo
    ))))
    .with_app_root(format!("{}/app", demo));

    let store: Store = Arc::new(RwLock::new(vec![
        Item {
            id: 1,
            name: "Teapot".into(),
            price: 25,
        },
        Item {
            id: 2,
            name: "Kettle".into(),
            price: 40,
        },
    ]));

    let mut app = Application::new(settings);
    app.mount(&mut ItemsModule { store })?;
    app.register_handler("/api/health", Method::GET, Arc::new(Health));
    // Registers /shop: the route comes from this file's name.
    app.register_on_file(Method::GET, |_req| async move {
        Ok(Response::text("shop example\n"))
    })?;
    app.register(|router| {
        let welcome = router.settings().clone();
        Ok(Endpoint::new(
            "/welcome",
            Method::GET,
            pagetree::handler_fn(move |_req| {
                let settings = welcome.clone();
                async move { html_from_files(&settings, &["../index.html", "welcome.html"]).await }
            }),
        ))
    });
    app.register(|router| {
        let outline = router.tree().to_string();
        Ok(Endpoint::new(
            "/api/routes",
            Method::GET,
            pagetree::handler_fn(move |_req| {
                let outline = outline.clone();
                async move { Ok(Response::text(outline)) }
            }),
        ))
    });
    app.add_static_files("static");

    let router = app.build()?;
    println!("{}", router.tree());
    router.serve(&ListenAddr::from_env())
}
