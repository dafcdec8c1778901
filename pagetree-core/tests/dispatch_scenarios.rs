//! End-to-end dispatch over hand-built trees, without HTTP.

use pagetree_core::{
    handler_fn, Dispatcher, HandlerRef, MatchLevel, Method, Request, Resolution, Response, Tree,
};
use pretty_assertions::assert_eq;

fn text(body: &'static str) -> HandlerRef {
    handler_fn(move |_req: Request| async move { Ok(Response::text(body)) })
}

fn echo(name: &'static str) -> HandlerRef {
    handler_fn(move |req: Request| async move {
        let value = req.path_value(name).unwrap_or("<unset>").to_string();
        Ok(Response::text(format!("{}={}", name, value)))
    })
}

async fn get(dispatcher: &Dispatcher, path: &str) -> Response {
    dispatcher.dispatch(Request::new(Method::GET, path)).await
}

/// `/a` (with fallback) and `/a/b/c`.
fn abc() -> Dispatcher {
    let mut tree = Tree::new();
    let root = tree.root();
    tree.add_relative(root, "/a", Method::GET, text("a"), Some(text("a fallback")))
        .unwrap();
    tree.add_relative(root, "/a/b/c", Method::GET, text("/a/b/c"), None)
        .unwrap();
    Dispatcher::new(tree)
}

#[tokio::test]
async fn exact_path_is_served() {
    let dispatcher = abc();
    let m = dispatcher.tree().find_closest("/a/b/c", &Method::GET);
    assert_eq!(m.level, MatchLevel::ExactMatch);
    assert_eq!(dispatcher.tree().full_path(m.node), "/a/b/c/");

    let resp = get(&dispatcher, "/a/b/c").await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.body_text(), "/a/b/c");
}

#[tokio::test]
async fn divergence_uses_enclosing_fallback() {
    let dispatcher = abc();
    let m = dispatcher.tree().find_closest("/a/b/X", &Method::GET);
    assert_eq!(m.level, MatchLevel::NoMatch);
    assert_eq!(dispatcher.tree().full_path(m.node), "/a/b/");

    let resp = get(&dispatcher, "/a/b/X").await;
    assert_eq!(resp.status_code, 404);
    assert_eq!(resp.body_text(), "a fallback");
}

#[tokio::test]
async fn wildcard_value_reaches_handler() {
    let mut tree = Tree::new();
    let root = tree.root();
    tree.add_relative(root, "/e/{z}/f", Method::GET, text("f"), None)
        .unwrap();
    tree.add_relative(root, "/e/{z}", Method::GET, echo("z"), None)
        .unwrap();
    let dispatcher = Dispatcher::new(tree);

    let m = dispatcher.tree().find_closest("/e/hello", &Method::GET);
    assert_eq!(m.level, MatchLevel::WildMatch);
    assert_eq!(dispatcher.tree().pattern(m.node), "/e/{z}/");
    assert_eq!(m.captures.len(), 1);
    assert_eq!((m.captures[0].name.as_str(), m.captures[0].value.as_str()), ("z", "hello"));

    assert_eq!(get(&dispatcher, "/e/hello").await.body_text(), "z=hello");
    assert_eq!(get(&dispatcher, "/e/hello/f").await.body_text(), "f");
}

#[tokio::test]
async fn literal_sibling_wins_over_wildcard() {
    let mut tree = Tree::new();
    let root = tree.root();
    tree.add_relative(root, "/e/{z}/f", Method::GET, echo("z"), None)
        .unwrap();
    tree.add_relative(root, "/e/lit/f", Method::GET, text("literal"), None)
        .unwrap();
    let dispatcher = Dispatcher::new(tree);

    let m = dispatcher.tree().find_closest("/e/lit/f", &Method::GET);
    assert_eq!(m.level, MatchLevel::ExactMatch);
    assert!(m.captures.is_empty());
    assert_eq!(get(&dispatcher, "/e/lit/f").await.body_text(), "literal");
    assert_eq!(get(&dispatcher, "/e/other/f").await.body_text(), "z=other");
}

#[tokio::test]
async fn root_is_served() {
    let mut tree = Tree::new();
    let root = tree.root();
    tree.set_handler(root, Method::GET, text("root")).unwrap();
    tree.add_relative(root, "/g", Method::GET, text("g"), None)
        .unwrap();
    let dispatcher = Dispatcher::new(tree);

    let m = dispatcher.tree().find_closest("/", &Method::GET);
    assert_eq!(m.level, MatchLevel::ExactMatch);
    assert_eq!(m.node, dispatcher.tree().root());
    assert_eq!(get(&dispatcher, "/").await.body_text(), "root");
    assert_eq!(get(&dispatcher, "").await.body_text(), "root");
    assert_eq!(get(&dispatcher, "/g/").await.body_text(), "g");
}

#[tokio::test]
async fn overshoot_uses_deepest_fallback() {
    let mut tree = Tree::new();
    let root = tree.root();
    tree.add_relative(root, "/a/b/c", Method::GET, text("c"), Some(text("c fallback")))
        .unwrap();
    let dispatcher = Dispatcher::new(tree);

    let m = dispatcher.tree().find_closest("/a/b/c/d/x/y", &Method::GET);
    assert_eq!(m.level, MatchLevel::NoMatch);
    assert_eq!(dispatcher.tree().full_path(m.node), "/a/b/c/");
    match dispatcher.resolve(&Method::GET, "/a/b/c/d/x/y") {
        Resolution::Fallback { fallback, level, .. } => {
            assert_eq!(dispatcher.tree().full_path(fallback), "/a/b/c/");
            assert_eq!(level, MatchLevel::PartialMatch);
        }
        other => panic!("expected fallback, got {:?}", other),
    }

    let resp = get(&dispatcher, "/a/b/c/d/x/y").await;
    assert_eq!(resp.status_code, 404);
    assert_eq!(resp.body_text(), "c fallback");
}

#[tokio::test]
async fn method_only_filters_the_terminal() {
    let mut tree = Tree::new();
    let root = tree.root();
    tree.add_relative(root, "/items", Method::GET, text("list"), Some(text("no item")))
        .unwrap();
    tree.add_relative(root, "/items/{id}", Method::POST, echo("id"), None)
        .unwrap();
    let dispatcher = Dispatcher::new(tree);

    // GET /items is an intermediate for POST /items/{id}, and vice versa.
    assert_eq!(get(&dispatcher, "/items").await.body_text(), "list");
    let resp = dispatcher
        .dispatch(Request::new(Method::POST, "/items/42"))
        .await;
    assert_eq!(resp.body_text(), "id=42");

    let resp = get(&dispatcher, "/items/42").await;
    assert_eq!(resp.status_code, 404);
    assert_eq!(resp.body_text(), "no item");
}

#[tokio::test]
async fn captures_are_per_request() {
    let mut tree = Tree::new();
    tree.add_relative(tree.root(), "/u/{name}", Method::GET, echo("name"), None)
        .unwrap();
    let dispatcher = std::sync::Arc::new(Dispatcher::new(tree));

    let mut tasks = Vec::new();
    for i in 0..16 {
        let dispatcher = std::sync::Arc::clone(&dispatcher);
        tasks.push(tokio::spawn(async move {
            let resp = get(&dispatcher, &format!("/u/user{}", i)).await;
            (i, resp.body_text())
        }));
    }
    for task in tasks {
        let (i, body) = task.await.unwrap();
        assert_eq!(body, format!("name=user{}", i));
    }
}
