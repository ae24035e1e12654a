//! Integration coverage for the authentication and catalogue services.
//!
//! Services run over a real [`client::domain::ApiClient`] and a scripted
//! transport; assertions look at the requests produced and at the session
//! left behind.

use client::domain::{
    AuthService, AuthorChanges, CatalogueService, ClientErrorKind, FormPart, HttpMethod,
    ImageUpload, LOGIN_PATH, LoginCredentials, NewAuthor, NewBook, REGISTER_PATH, RequestBody,
    Registration, ports::TransportRequest,
};
use client::outbound::session::InMemorySessionStore;
use rstest::rstest;
use serde_json::json;

// Shared helpers include functions used only by the refresh suite.
#[expect(
    dead_code,
    reason = "Shared helpers include functions used only by other integration suites."
)]
mod support;

use support::{Harness, ScriptedTransport, bearer, json_body, pair, reply};

fn author_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "details": null,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-02T10:00:00Z",
        "image_url": null,
    })
}

fn book_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "content": "Spice and sand.",
        "author": author_json(1, "Frank Herbert"),
        "created_at": "2024-03-03T10:00:00Z",
        "updated_at": "2024-03-03T10:00:00Z",
    })
}

fn multipart(request: &TransportRequest) -> Vec<FormPart> {
    match request.body.clone() {
        Some(RequestBody::Multipart(parts)) => parts,
        other => panic!("expected a multipart body, got {other:?}"),
    }
}

fn field_names(parts: &[FormPart]) -> Vec<&str> {
    parts.iter().map(FormPart::name).collect()
}

fn last_request(harness: &Harness) -> TransportRequest {
    harness
        .transport
        .requests()
        .pop()
        .expect("a request was sent")
}

#[tokio::test]
async fn login_stores_the_returned_pair_without_sending_a_bearer() {
    let transport = ScriptedTransport::new(|request| match request.url.path() {
        LOGIN_PATH => reply(200, &json!({"access": "a1", "refresh": "r1"})),
        _ => reply(404, &json!({"detail": "Not found."})),
    });
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("stale", "old")));
    let auth = AuthService::new(harness.client.clone());
    let credentials = LoginCredentials::try_from_parts(" ada@example.test ", "pw").expect("valid");

    let held = auth.login(&credentials).await.expect("login succeeds");

    assert_eq!(held, pair("a1", "r1"));
    assert_eq!(harness.held(), Some(pair("a1", "r1")));
    let request = last_request(&harness);
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(bearer(&request), None);
    assert_eq!(
        json_body(&request),
        Some(&json!({"email": "ada@example.test", "password": "pw"}))
    );
}

#[tokio::test]
async fn rejected_logins_surface_the_server_message_and_keep_the_session() {
    let transport = ScriptedTransport::new(|_| {
        reply(
            401,
            &json!({"detail": "No active account found with the given credentials"}),
        )
    });
    let harness = Harness::new(transport, InMemorySessionStore::new());
    let auth = AuthService::new(harness.client.clone());
    let credentials = LoginCredentials::try_from_parts("ada@example.test", "wrong").expect("valid");

    let err = auth.login(&credentials).await.expect_err("login rejected");

    assert_eq!(err.kind(), ClientErrorKind::Response);
    assert_eq!(
        err.message(),
        "No active account found with the given credentials"
    );
    assert_eq!(harness.held(), None);
    assert!(harness.observer.events().is_empty());
}

#[rstest]
#[case(json!({"id": 3, "name": "Ada", "email": "ada@example.test", "access": "a9", "refresh": "r9"}), 1)]
#[case(json!({"id": 3, "name": "Ada", "email": "ada@example.test"}), 2)]
#[tokio::test]
async fn registration_holds_tokens_or_falls_back_to_login(
    #[case] registered: serde_json::Value,
    #[case] expected_requests: usize,
) {
    let transport = ScriptedTransport::new(move |request| match request.url.path() {
        REGISTER_PATH => reply(201, &registered),
        LOGIN_PATH => reply(200, &json!({"access": "a9", "refresh": "r9"})),
        _ => reply(404, &json!({"detail": "Not found."})),
    });
    let harness = Harness::new(transport, InMemorySessionStore::new());
    let auth = AuthService::new(harness.client.clone());
    let registration =
        Registration::try_from_parts("Ada", "ada@example.test", "pw").expect("valid registration");

    let outcome = auth.register(&registration).await.expect("registration succeeds");

    assert_eq!(outcome.credentials, pair("a9", "r9"));
    assert_eq!(outcome.user.id, Some(3));
    assert_eq!(outcome.user.email, "ada@example.test");
    assert_eq!(harness.held(), Some(pair("a9", "r9")));
    assert_eq!(harness.transport.requests().len(), expected_requests);
}

#[tokio::test]
async fn logout_drops_the_session() {
    let transport = ScriptedTransport::new(|_| reply(200, &json!({})));
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let auth = AuthService::new(harness.client.clone());

    auth.logout().expect("logout succeeds");

    assert_eq!(auth.access_token().expect("session readable"), None);
    assert!(harness.transport.requests().is_empty());
}

#[rstest]
#[case(None, "/api/books/", None)]
#[case(Some(0), "/api/books/", None)]
#[case(Some(3), "/api/books/", Some("page=3"))]
#[tokio::test]
async fn book_listings_request_the_asked_page(
    #[case] page: Option<u32>,
    #[case] path: &str,
    #[case] query: Option<&str>,
) {
    let transport = ScriptedTransport::new(|_| {
        reply(
            200,
            &json!({
                "count": 23,
                "next": "https://api.example.test/api/books/?page=4",
                "previous": "https://api.example.test/api/books/?page=2",
                "results": [book_json(1, "Dune")],
            }),
        )
    });
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let catalogue = CatalogueService::new(harness.client.clone());

    let listing = catalogue.books(page).await.expect("listing succeeds");

    assert_eq!(listing.count, 23);
    assert_eq!(listing.results.first().map(|book| book.name.as_str()), Some("Dune"));
    assert_eq!(listing.next_page(), Ok(Some(4)));
    let request = last_request(&harness);
    assert_eq!(request.url.path(), path);
    assert_eq!(request.url.query(), query);
    assert_eq!(bearer(&request), Some("a1"));
}

#[tokio::test]
async fn listings_feed_the_pagination_window() {
    let authors: Vec<_> = (1..=10).map(|id| author_json(id, "Author")).collect();
    let transport = ScriptedTransport::new(move |_| {
        reply(
            200,
            &json!({
                "count": 95,
                "next": "/api/authors/?page=2",
                "previous": null,
                "results": authors,
            }),
        )
    });
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let catalogue = CatalogueService::new(harness.client.clone());

    let listing = catalogue.authors(None).await.expect("listing succeeds");
    let state = listing.pagination_state(1, None);

    assert_eq!(state.total_pages(), Some(10));
    let window = state.window();
    assert_eq!(window.pages(), &[1, 2, 3, 4, 5]);
    assert!(!window.has_previous());
    assert!(window.has_next());
}

#[tokio::test]
async fn creating_an_author_sends_only_present_fields_as_a_form() {
    let transport = ScriptedTransport::new(|_| reply(201, &author_json(7, "Ursula K. Le Guin")));
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let catalogue = CatalogueService::new(harness.client.clone());

    let created = catalogue
        .create_author(NewAuthor {
            name: "Ursula K. Le Guin".to_owned(),
            details: Some(String::new()),
            image: Some(ImageUpload::new("portrait.JPG", vec![0xff, 0xd8])),
        })
        .await
        .expect("author created");

    assert_eq!(created.id, 7);
    let request = last_request(&harness);
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url.path(), "/api/authors/");
    assert_eq!(request.header("Content-Type"), None);
    let parts = multipart(&request);
    assert_eq!(field_names(&parts), vec!["name", "image"]);
    assert!(parts.contains(&FormPart::File {
        name: "image".to_owned(),
        file_name: "portrait.JPG".to_owned(),
        content_type: Some("image/jpeg".to_owned()),
        bytes: vec![0xff, 0xd8],
    }));
}

#[tokio::test]
async fn updates_are_puts_to_the_record_path() {
    let transport = ScriptedTransport::new(|_| reply(200, &author_json(7, "U. K. Le Guin")));
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let catalogue = CatalogueService::new(harness.client.clone());

    let updated = catalogue
        .update_author(
            7,
            AuthorChanges {
                name: Some("U. K. Le Guin".to_owned()),
                ..AuthorChanges::default()
            },
        )
        .await
        .expect("author updated");

    assert_eq!(updated.name, "U. K. Le Guin");
    let request = last_request(&harness);
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.url.path(), "/api/authors/7/");
    assert_eq!(
        multipart(&request),
        vec![FormPart::text("name", "U. K. Le Guin")]
    );
}

#[tokio::test]
async fn creating_a_book_names_its_author() {
    let transport = ScriptedTransport::new(|_| reply(201, &book_json(4, "Dune")));
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let catalogue = CatalogueService::new(harness.client.clone());

    let created = catalogue
        .create_book(NewBook {
            name: "Dune".to_owned(),
            content: "Spice and sand.".to_owned(),
            author_id: 1,
            image: None,
        })
        .await
        .expect("book created");

    assert_eq!(created.author.name, "Frank Herbert");
    assert_eq!(
        multipart(&last_request(&harness)),
        vec![
            FormPart::text("name", "Dune"),
            FormPart::text("content", "Spice and sand."),
            FormPart::text("author_id", "1"),
        ]
    );
}

#[rstest]
#[case(204, Vec::new())]
#[case(200, br#"{"deleted": true}"#.to_vec())]
#[tokio::test]
async fn deletes_accept_empty_and_json_bodies(#[case] status: u16, #[case] body: Vec<u8>) {
    let transport = ScriptedTransport::new(move |_| {
        Ok(client::domain::ports::TransportResponse {
            status,
            body: body.clone(),
        })
    });
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let catalogue = CatalogueService::new(harness.client.clone());

    catalogue.delete_book(4).await.expect("book deleted");

    let request = last_request(&harness);
    assert_eq!(request.method, HttpMethod::Delete);
    assert_eq!(request.url.path(), "/api/books/4/");
}

#[tokio::test]
async fn validation_failures_report_field_messages() {
    let transport = ScriptedTransport::new(|_| {
        reply(
            400,
            &json!({"name": ["This field may not be blank."], "author_id": ["Invalid pk."]}),
        )
    });
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let catalogue = CatalogueService::new(harness.client.clone());

    let err = catalogue
        .create_book(NewBook::default())
        .await
        .expect_err("validation fails");

    assert_eq!(err.kind(), ClientErrorKind::Response);
    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.message(),
        "This field may not be blank. Invalid pk."
    );
    assert!(err.data().is_some());
}

#[tokio::test]
async fn analytics_decode_from_camel_case() {
    let transport = ScriptedTransport::new(|_| {
        reply(
            200,
            &json!({
                "totalBooks": 12,
                "totalAuthors": 4,
                "newBooksLast30": 3,
                "newAuthorsLast30": 1,
                "booksGrowthPct": 33.3,
                "authorsGrowthPct": 0.0,
                "buckets": [{"label": "2024-03", "books": 3, "authors": 1}],
            }),
        )
    });
    let harness = Harness::new(transport, InMemorySessionStore::with_credentials(pair("a1", "r1")));
    let catalogue = CatalogueService::new(harness.client.clone());

    let summary = catalogue.analytics().await.expect("analytics load");

    assert_eq!(summary.total_books, 12);
    assert_eq!(summary.new_authors_last30, 1);
    assert_eq!(summary.buckets.len(), 1);
    assert_eq!(last_request(&harness).url.path(), "/api/analytics/");
}
