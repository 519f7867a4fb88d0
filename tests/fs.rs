#![deny(warnings)]

use std::fs;

use static_root::http::HeaderValue;
use static_root::FileServer;
use tempfile::TempDir;

fn site() -> TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    let public = tmp.path().join("public");
    fs::create_dir_all(public.join("css")).unwrap();
    fs::write(public.join("todos.rs"), "fn main() {}\n").unwrap();
    fs::write(public.join("css/app.css"), "body { margin: 0 }").unwrap();
    fs::write(public.join("data.bin"), vec![7u8; 100_000]).unwrap();
    fs::write(tmp.path().join("README.md"), "# secret").unwrap();
    tmp
}

fn files(tmp: &TempDir) -> FileServer {
    static_root::config().file_server(tmp.path().join("public"))
}

#[tokio::test]
async fn file() {
    let _ = pretty_env_logger::try_init();
    let tmp = site();
    let mut files = files(&tmp);

    let res = static_root::test::request()
        .path("/todos.rs")
        .reply(&mut files)
        .await;

    assert_eq!(res.status(), 200);

    let contents = fs::read(tmp.path().join("public/todos.rs")).expect("fs::read");
    assert_eq!(res.headers()["content-length"], contents.len().to_string());
    assert_eq!(res.headers()["content-type"], "text/x-rust");
    assert!(res.headers().contains_key("last-modified"));

    assert_eq!(res.body(), &*contents);
}

#[tokio::test]
async fn dir_encoded() {
    let _ = pretty_env_logger::try_init();
    let tmp = site();
    let mut files = files(&tmp);

    let res = static_root::test::request()
        .path("/css%2fapp%2ecss")
        .reply(&mut files)
        .await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/css");
    assert_eq!(res.body(), "body { margin: 0 }");
}

#[tokio::test]
async fn large_file_streams_in_chunks() {
    let _ = pretty_env_logger::try_init();
    let tmp = site();
    let mut files = static_root::config()
        .read_buffer_size(1_024)
        .file_server(tmp.path().join("public"));

    let res = static_root::test::request()
        .path("/data.bin")
        .reply(&mut files)
        .await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/octet-stream");
    assert_eq!(res.headers()["content-length"], "100000");
    assert_eq!(res.body().len(), 100_000);
    assert!(res.body().iter().all(|&b| b == 7));
}

#[tokio::test]
async fn not_found() {
    let _ = pretty_env_logger::try_init();
    let tmp = site();
    let mut files = files(&tmp);

    let res = static_root::test::request()
        .path("/definitely-not-found")
        .reply(&mut files)
        .await;
    assert_eq!(res.status(), 404);

    // no extension or index lookups here
    let res = static_root::test::request()
        .path("/todos")
        .reply(&mut files)
        .await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn directory_is_not_found() {
    let _ = pretty_env_logger::try_init();
    let tmp = site();
    let mut files = files(&tmp);

    let res = static_root::test::request()
        .path("/css")
        .reply(&mut files)
        .await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn bad_paths_stay_in_root() {
    let _ = pretty_env_logger::try_init();
    let tmp = site();
    let mut files = files(&tmp);

    for path in ["/../README.md", "/%2E%2e/README.md", "/css/../../README.md"] {
        let res = static_root::test::request()
            .path(path)
            .reply(&mut files)
            .await;
        assert_eq!(res.status(), 404, "{}", path);
    }

    let res = static_root::test::request()
        .path("/todos.rs%00")
        .reply(&mut files)
        .await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn head() {
    let _ = pretty_env_logger::try_init();
    let tmp = site();
    let mut files = static_root::config()
        .cache_control(HeaderValue::from_static("no-cache"))
        .file_server(tmp.path().join("public"));

    let res = static_root::test::request()
        .method("HEAD")
        .path("/todos.rs")
        .reply(&mut files)
        .await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-length"], "13");
    assert_eq!(res.headers()["cache-control"], "no-cache");
    assert!(res.body().is_empty());
}
