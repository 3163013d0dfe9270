use memocloud_core::{RemoteConfig, RemoteError, RemoteStore, WebDavStore};
use wiremock::matchers::{basic_auth, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/dav/memos/</d:href>
    <d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/memos/memo-1.json</d:href>
    <d:propstat><d:prop>
      <d:resourcetype/>
      <d:getcontentlength>42</d:getcontentlength>
    </d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/memos/my%20notes.json</d:href>
    <d:propstat><d:prop><d:resourcetype/></d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/memos/archive/</d:href>
    <d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop></d:propstat>
  </d:response>
</d:multistatus>"#;

fn store_for(server_uri: &str, username: &str, password: &str) -> WebDavStore {
    let config = RemoteConfig::new(&format!("{server_uri}/dav"), username, password).unwrap();
    WebDavStore::new(&config).unwrap()
}

/// Builds a store and runs `call` against it off the async test runtime.
///
/// The blocking client owns its own runtime, so it is created and dropped
/// on a blocking thread.
async fn with_store<T: Send + 'static>(
    server: &MockServer,
    credentials: (&str, &str),
    call: impl FnOnce(&WebDavStore) -> T + Send + 'static,
) -> T {
    let uri = server.uri();
    let (username, password) = (credentials.0.to_string(), credentials.1.to_string());
    tokio::task::spawn_blocking(move || call(&store_for(&uri, &username, &password)))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn list_parses_multistatus_and_skips_own_entry() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/dav/memos/"))
        .and(header("Depth", "1"))
        .respond_with(ResponseTemplate::new(207).set_body_string(LISTING))
        .expect(1)
        .mount(&server)
        .await;

    let entries = with_store(&server, ("", ""), |store| store.list("memos"))
        .await
        .unwrap();

    let names: Vec<&str> = entries.iter().map(|entry| entry.filename.as_str()).collect();
    assert_eq!(names, vec!["memo-1.json", "my notes.json", "archive"]);
    assert_eq!(entries[0].path, "memos/memo-1.json");
    assert_eq!(entries[0].size, Some(42));
    assert!(!entries[1].is_dir);
    assert!(entries[2].is_dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_of_missing_directory_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/dav/memos/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = with_store(&server, ("", ""), |store| store.list("memos"))
        .await
        .unwrap_err();

    assert_eq!(err, RemoteError::NotFound("memos".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = with_store(&server, ("", ""), |store| store.probe())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Unavailable(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn write_json_puts_pretty_document_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/dav/memos/memo-1.json"))
        .and(basic_auth("alice", "s3cret"))
        .and(header("Content-Type", "application/json"))
        .and(body_string("{\n  \"id\": \"memo-1\"\n}"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    with_store(&server, ("alice", "s3cret"), |store| {
        store.write_json("memos/memo-1.json", &serde_json::json!({"id": "memo-1"}))
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn read_text_maps_missing_file_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dav/memos/memo-1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":\"memo-1\"}"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dav/memos/gone.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (found, missing) = with_store(&server, ("", ""), |store| {
        (
            store.read_text("memos/memo-1.json"),
            store.read_text("memos/gone.json"),
        )
    })
    .await;

    assert_eq!(found.unwrap(), "{\"id\":\"memo-1\"}");
    assert!(matches!(missing, Err(RemoteError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_treats_missing_file_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/dav/memos/gone.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    with_store(&server, ("", ""), |store| store.delete("memos/gone.json"))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn ensure_directory_creates_missing_collection() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/dav/uploads/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("MKCOL"))
        .and(path("/dav/uploads/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    with_store(&server, ("", ""), |store| store.ensure_directory("uploads")).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn existing_collection_on_mkcol_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("MKCOL"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    with_store(&server, ("", ""), |store| store.create_directory("memos"))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn binary_upload_is_reachable_at_resource_url() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/dav/uploads/1714554000000-cat%20photo.png"))
        .and(header("Content-Type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let expected = format!("{}/dav/uploads/1714554000000-cat%20photo.png", server.uri());
    let url = with_store(&server, ("", ""), |store| -> Result<String, RemoteError> {
        store.write_binary("uploads/1714554000000-cat photo.png", b"\x89PNG")?;
        store.resource_url("uploads/1714554000000-cat photo.png")
    })
    .await
    .unwrap();

    assert_eq!(url, expected);
}
