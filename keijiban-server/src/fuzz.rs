#![cfg(test)]

use std::{cmp, fmt::Debug, ops::RangeTo, panic::AssertUnwindSafe};

use axum::http::{self, request};
use keijiban_api::{Error as ApiError, NewPost, Post, PostEdit, PostId};
use keijiban_mock_server::MockServer;
use sqlx::sqlite::SqlitePoolOptions;
use tower::{Service, ServiceExt};

use crate::*;

async fn test_pool() -> sqlx::SqlitePool {
    // a single connection that is never recycled, or the in-memory database
    // would vanish along with it
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("opening in-memory database");
    MIGRATOR
        .run(&pool)
        .await
        .expect("failed applying migrations");
    pool
}

macro_rules! do_sqlx_test {
    ( $name:ident, $gen:expr, $fn:expr ) => {
        #[test]
        fn $name() {
            if std::env::var("RUST_LOG").is_ok() {
                let _ = tracing_subscriber::fmt::try_init();
            }
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_generator($gen)
                .cloned()
                .for_each(move |v| {
                    runtime.block_on(async move {
                        let pool = test_pool().await;
                        let () = $fn(pool, v).await;
                    })
                });
        }
    };
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    List,
    Create {
        #[generator(bolero::generator::gen_with::<String>().len(0..20usize))]
        content: String,
        name: Option<String>,
        parent: Option<usize>,
    },
    Update {
        post: usize,
        #[generator(bolero::generator::gen_with::<String>().len(0..20usize))]
        content: String,
        name: Option<String>,
    },
    Delete {
        post: usize,
    },
}

async fn call<Req, Resp>(
    app: &mut Router,
    req: request::Request<axum::body::Body>,
    req_body: &Req,
) -> Result<Resp, ApiError>
where
    Req: Debug,
    Resp: 'static + for<'de> serde::Deserialize<'de>,
{
    app.ready().await.expect("waiting for app to be ready");
    let resp = app.call(req).await.expect("running request");
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("recovering resp bytes");
    if status == http::StatusCode::OK {
        if std::any::TypeId::of::<Resp>() == std::any::TypeId::of::<()>() {
            // handlers returning () answer with an empty body, which is not valid json
            return Ok(serde_json::from_slice(b"null").unwrap());
        }
        return Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
            panic!("failed parsing resp body ({err}), body is {body:?}, request was {req_body:?}")
        }));
    }
    Err(ApiError::parse(&body)
        .unwrap_or_else(|err| panic!("parsing error response body {err}, body is {body:?}")))
}

async fn run_on_app<Req, Resp>(
    app: &mut Router,
    method: &str,
    uri: &str,
    body: &Req,
) -> Result<Resp, ApiError>
where
    Req: Debug + serde::Serialize,
    Resp: 'static + for<'de> serde::Deserialize<'de>,
{
    let req = request::Builder::new()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("serializing request body to json"),
        ))
        .expect("building request");
    call(app, req, body).await
}

fn compare<T>(name: &str, app_res: Result<T, ApiError>, mock_res: Result<T, ApiError>)
where
    T: Debug + PartialEq,
{
    assert_eq!(
        app_res, mock_res,
        "app and mock did not return the same result for {name}"
    );
}

fn resize_int(fuzz_id: usize, RangeTo { end }: RangeTo<usize>) -> Option<usize> {
    if end == 0 {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / end); // in case we rounded to 0
    let id = fuzz_id / bucket_size;
    Some(cmp::min(id, end - 1)) // in case id was actually over end - 1 due to rounding
}

/// Everything about a post but its creation date, which the app and the mock
/// pick from different clocks
type Observable = (PostId, String, Option<String>, Option<PostId>);

fn observable(p: Post) -> Observable {
    (p.id, p.content, p.author_name, p.parent_id)
}

fn sorted(mut posts: Vec<Post>) -> Vec<Observable> {
    posts.sort_by_key(|p| p.id);
    posts.into_iter().map(observable).collect()
}

struct ComparativeFuzzer {
    app: Router,
    mock: MockServer,
    // every id ever handed out, deleted ones included
    known_ids: Vec<PostId>,
}

impl ComparativeFuzzer {
    fn new(pool: sqlx::SqlitePool) -> ComparativeFuzzer {
        ComparativeFuzzer {
            app: app(pool),
            mock: MockServer::new(),
            known_ids: Vec::new(),
        }
    }

    fn pick(&self, fuzz_id: usize) -> PostId {
        resize_int(fuzz_id, ..self.known_ids.len())
            .map(|i| self.known_ids[i])
            .unwrap_or(PostId::stub())
    }

    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        match op {
            FuzzOp::List => {
                let app_res: Result<Vec<Post>, _> =
                    run_on_app(&mut self.app, "GET", "/api/posts", &()).await;
                compare(
                    "List",
                    app_res.map(sorted),
                    Ok(sorted(self.mock.list_posts())),
                );
            }
            FuzzOp::Create {
                content,
                name,
                parent,
            } => {
                let parent_id = parent.map(|p| self.pick(p));
                let new_post = NewPost::new(content, name, parent_id);
                let app_res: Result<Post, _> =
                    run_on_app(&mut self.app, "POST", "/api/posts", &new_post).await;
                let mock_res = self.mock.create_post(new_post);
                if let Ok(p) = &mock_res {
                    self.known_ids.push(p.id);
                }
                compare(
                    "Create",
                    app_res.map(observable),
                    mock_res.map(observable),
                );
            }
            FuzzOp::Update {
                post,
                content,
                name,
            } => {
                let id = self.pick(post);
                let edit = PostEdit::new(content, name);
                compare(
                    "Update",
                    run_on_app(&mut self.app, "PUT", &format!("/api/posts/{}", id.0), &edit).await,
                    self.mock.update_post(id, edit),
                );
            }
            FuzzOp::Delete { post } => {
                let id = self.pick(post);
                compare(
                    "Delete",
                    run_on_app(&mut self.app, "DELETE", &format!("/api/posts/{}", id.0), &())
                        .await,
                    self.mock.delete_post(id),
                );
            }
        }
    }
}

do_sqlx_test!(
    compare_with_mock,
    bolero::generator::gen_with::<Vec<FuzzOp>>().len(1..50usize),
    |pool, test: Vec<FuzzOp>| async move {
        let mut fuzzer = ComparativeFuzzer::new(pool);
        for op in test {
            fuzzer.execute_fuzz_op(op).await;
        }
        // always end on a full comparison
        fuzzer.execute_fuzz_op(FuzzOp::List).await;
    }
);

#[tokio::test]
async fn create_then_list() {
    let mut app = app(test_pool().await);
    let root: Post = run_on_app(
        &mut app,
        "POST",
        "/api/posts",
        &NewPost::new(String::from("hello"), Some(String::from("  ")), None),
    )
    .await
    .unwrap();
    assert_eq!(root.id, PostId(1));
    assert_eq!(root.author_name, None);

    let reply: Post = run_on_app(
        &mut app,
        "POST",
        "/api/posts",
        &NewPost::new(String::from("hi"), Some(String::from(" taro ")), Some(root.id)),
    )
    .await
    .unwrap();
    assert_eq!(reply.parent_id, Some(root.id));
    assert_eq!(reply.author_name.as_deref(), Some("taro"));

    let posts: Vec<Post> = run_on_app(&mut app, "GET", "/api/posts", &())
        .await
        .unwrap();
    assert_eq!(sorted(posts), vec![observable(root), observable(reply)]);
}

#[tokio::test]
async fn blank_content_is_rejected() {
    let mut app = app(test_pool().await);
    let res: Result<Post, _> = run_on_app(
        &mut app,
        "POST",
        "/api/posts",
        &NewPost::new(String::from(" \n "), None, None),
    )
    .await;
    assert_eq!(res, Err(ApiError::EmptyContent));
    let res: Result<(), _> = run_on_app(
        &mut app,
        "PUT",
        "/api/posts/1",
        &PostEdit::new(String::new(), None),
    )
    .await;
    assert_eq!(res, Err(ApiError::EmptyContent));
}

#[tokio::test]
async fn update_of_missing_post_is_not_found() {
    let mut app = app(test_pool().await);
    let res: Result<(), _> = run_on_app(
        &mut app,
        "PUT",
        "/api/posts/12",
        &PostEdit::new(String::from("edit"), None),
    )
    .await;
    assert_eq!(res, Err(ApiError::PostNotFound(PostId(12))));
}

#[tokio::test]
async fn delete_keeps_replies_and_ids() {
    let mut app = app(test_pool().await);
    for (content, parent) in [("root", None), ("reply", Some(PostId(1)))] {
        let _: Post = run_on_app(
            &mut app,
            "POST",
            "/api/posts",
            &NewPost::new(String::from(content), None, parent),
        )
        .await
        .unwrap();
    }
    let res: Result<(), _> = run_on_app(&mut app, "DELETE", "/api/posts/1", &()).await;
    assert_eq!(res, Ok(()));
    // deleting again is not an error
    let res: Result<(), _> = run_on_app(&mut app, "DELETE", "/api/posts/1", &()).await;
    assert_eq!(res, Ok(()));

    let posts: Vec<Post> = run_on_app(&mut app, "GET", "/api/posts", &())
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].parent_id, Some(PostId(1)));

    let created: Post = run_on_app(
        &mut app,
        "POST",
        "/api/posts",
        &NewPost::new(String::from("again"), None, None),
    )
    .await
    .unwrap();
    assert_eq!(created.id, PostId(3));
}

#[tokio::test]
async fn pool_creates_missing_database() {
    let dir = tempfile::tempdir().expect("creating tempdir");
    let path = dir.path().join("board.db");
    let url = format!("sqlite://{}", path.display());
    let pool = create_sqlx_pool(&url).await.unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    assert!(path.exists());
}
