//! The six end-to-end scenarios and a sample of the I1-I10 invariants from
//! spec.md §8, driven against the assembled router with no real socket
//! (SPEC_FULL.md §A.4).

mod support;

use axum::http::StatusCode;
use support::{assert_status, body_text, Req};

#[tokio::test]
async fn scenario_1_create_rdf_source_via_post() {
    let (router, _dir) = support::test_router().await;

    let response = Req::new("POST", "/")
        .as_admin()
        .header("slug", "foo")
        .body("text/turtle", r#"<> <http://purl.org/dc/terms/title> "A" ."#)
        .send(&router)
        .await;
    assert_status(&response, StatusCode::CREATED);
    let location = response.headers().get("location").unwrap().to_str().unwrap().to_string();
    assert_eq!(location, "http://example/foo");

    let get = Req::get("/foo").as_admin().header("accept", "text/turtle").send(&router).await;
    assert_status(&get, StatusCode::OK);
    let body = body_text(get).await;
    assert!(body.contains("http://purl.org/dc/terms/title"));
    assert!(body.contains("\"A\""));
}

#[tokio::test]
async fn scenario_2_patch_via_sparql_update() {
    let (router, _dir) = support::test_router().await;
    Req::new("POST", "/")
        .as_admin()
        .header("slug", "foo")
        .body("text/turtle", r#"<> <http://purl.org/dc/terms/title> "A" ."#)
        .send(&router)
        .await;

    let update = "DELETE { ?s <http://purl.org/dc/terms/title> ?o } WHERE { ?s <http://purl.org/dc/terms/title> ?o }; \
                  INSERT { <> <http://purl.org/dc/terms/title> \"B\" } WHERE {}";
    let patch = Req::new("PATCH", "/foo")
        .as_admin()
        .body("application/sparql-update", update.to_string())
        .send(&router)
        .await;
    assert_status(&patch, StatusCode::NO_CONTENT);

    let get = Req::get("/foo").as_admin().header("accept", "text/turtle").send(&router).await;
    let body = body_text(get).await;
    assert!(body.contains("\"B\""));
    assert!(!body.contains("\"A\""));
}

#[tokio::test]
async fn scenario_3_memento_accept_datetime() {
    let (router, _dir) = support::test_router().await;
    Req::new("POST", "/")
        .as_admin()
        .header("slug", "foo")
        .body("text/turtle", r#"<> <http://purl.org/dc/terms/title> "A" ."#)
        .send(&router)
        .await;
    let t1 = trellis_rdf::Instant::now().epoch_seconds();

    // Force `modified` to advance past t1's whole second before the update.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let update = "DELETE { ?s <http://purl.org/dc/terms/title> ?o } WHERE { ?s <http://purl.org/dc/terms/title> ?o }; \
                  INSERT { <> <http://purl.org/dc/terms/title> \"B\" } WHERE {}";
    Req::new("PATCH", "/foo").as_admin().body("application/sparql-update", update.to_string()).send(&router).await;
    let t2 = trellis_rdf::Instant::now().epoch_seconds();

    let at_t1 = Req::get("/foo")
        .as_admin()
        .header("accept", "text/turtle")
        .header("accept-datetime", http_date(t1))
        .send(&router)
        .await;
    assert_status(&at_t1, StatusCode::OK);
    assert!(body_text(at_t1).await.contains("\"A\""));

    let at_t2 = Req::get("/foo")
        .as_admin()
        .header("accept", "text/turtle")
        .header("accept-datetime", http_date(t2))
        .send(&router)
        .await;
    assert_status(&at_t2, StatusCode::OK);
    assert!(body_text(at_t2).await.contains("\"B\""));

    let before_any = Req::get("/foo")
        .as_admin()
        .header("accept", "text/turtle")
        .header("accept-datetime", http_date(t1 - 3600))
        .send(&router)
        .await;
    assert_status(&before_any, StatusCode::NOT_ACCEPTABLE);
}

fn http_date(epoch_seconds: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(epoch_seconds, 0)
        .unwrap()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[tokio::test]
async fn scenario_4_containment_lists_and_prunes_children() {
    let (router, _dir) = support::test_router().await;
    Req::new("POST", "/c/").as_admin().header("slug", "x").body("text/turtle", "").send(&router).await;
    Req::new("POST", "/c/").as_admin().header("slug", "y").body("text/turtle", "").send(&router).await;

    let listing = Req::get("/c/").as_admin().header("accept", "text/turtle").send(&router).await;
    assert_status(&listing, StatusCode::OK);
    let body = body_text(listing).await;
    assert!(body.contains("http://example/c/x"));
    assert!(body.contains("http://example/c/y"));

    let delete = Req::new("DELETE", "/c/x").as_admin().send(&router).await;
    assert_status(&delete, StatusCode::NO_CONTENT);

    let listing_after = Req::get("/c/").as_admin().header("accept", "text/turtle").send(&router).await;
    let body_after = body_text(listing_after).await;
    assert!(!body_after.contains("http://example/c/x"));
    assert!(body_after.contains("http://example/c/y"));

    let gone = Req::get("/c/x").as_admin().send(&router).await;
    assert_status(&gone, StatusCode::GONE);
}

#[tokio::test]
async fn scenario_5_wac_denial_and_anonymous_challenge() {
    let (router, _dir) = support::test_router().await;

    let acl_body = format!(
        "<> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/auth/acl#Authorization> .\n\
         <> <http://www.w3.org/ns/auth/acl#agent> <urn:trellis:user:alice> .\n\
         <> <http://www.w3.org/ns/auth/acl#accessTo> <{base}> .\n\
         <> <http://www.w3.org/ns/auth/acl#mode> <http://www.w3.org/ns/auth/acl#Read> .",
        base = support::BASE_URL
    );
    let put_acl = Req::new("PUT", "/?ext=acl").as_admin().body("text/turtle", acl_body).send(&router).await;
    assert_status(&put_acl, StatusCode::NO_CONTENT);

    let denied_write = Req::new("PUT", "/").as_user("alice").body("text/turtle", "").send(&router).await;
    assert_status(&denied_write, StatusCode::FORBIDDEN);

    let allowed_read = Req::get("/").as_user("alice").send(&router).await;
    assert_status(&allowed_read, StatusCode::OK);

    let anonymous = Req::get("/").send(&router).await;
    assert_status(&anonymous, StatusCode::UNAUTHORIZED);
    assert!(anonymous.headers().get("www-authenticate").is_some());
}

#[tokio::test]
async fn scenario_6_webdav_move_tombstones_source() {
    let (router, _dir) = support::test_router().await;
    Req::new("POST", "/c/").as_admin().header("slug", "y").body("text/turtle", r#"<> <http://purl.org/dc/terms/title> "Y" ."#).send(&router).await;

    let mv = Req::new("MOVE", "/c/y")
        .as_admin()
        .header("destination", "http://example/d/y")
        .send(&router)
        .await;
    assert_status(&mv, StatusCode::NO_CONTENT);

    let old = Req::get("/c/y").as_admin().send(&router).await;
    assert_status(&old, StatusCode::GONE);

    let new = Req::get("/d/y").as_admin().header("accept", "text/turtle").send(&router).await;
    assert_status(&new, StatusCode::OK);
    assert!(body_text(new).await.contains("\"Y\""));
}

#[tokio::test]
async fn i1_modified_strictly_increases_across_writes() {
    let (router, _dir) = support::test_router().await;
    Req::new("POST", "/").as_admin().header("slug", "m").body("text/turtle", "").send(&router).await;
    let first = Req::get("/m").as_admin().send(&router).await;
    let first_etag = first.headers().get("etag").unwrap().to_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    Req::new("PUT", "/m").as_admin().body("text/turtle", "").send(&router).await;
    let second = Req::get("/m").as_admin().send(&router).await;
    let second_etag = second.headers().get("etag").unwrap().to_str().unwrap().to_string();

    assert_ne!(first_etag, second_etag);
}

#[tokio::test]
async fn i7_admin_holds_every_mode_with_no_acl_present() {
    let (router, _dir) = support::test_router().await;
    let create = Req::new("PUT", "/admin-only").as_admin().body("text/turtle", "").send(&router).await;
    assert_status(&create, StatusCode::CREATED);
    let patch = Req::new("PATCH", "/admin-only")
        .as_admin()
        .body("application/sparql-update", "DELETE {} WHERE {}")
        .send(&router)
        .await;
    assert_status(&patch, StatusCode::NO_CONTENT);
    let delete = Req::new("DELETE", "/admin-only").as_admin().send(&router).await;
    assert_status(&delete, StatusCode::NO_CONTENT);
}
