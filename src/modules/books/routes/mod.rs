//! HTTP handlers for `/books`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookstore_http::{AppError, ValidJson};

use super::models::{Book, BookListResponse, BookResponse, MessageResponse};
use super::repository::SharedBookRepository;

/// Routes relative to the module mount point
pub fn router(repository: SharedBookRepository) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(repository)
}

async fn create_book(
    State(repository): State<SharedBookRepository>,
    ValidJson(book): ValidJson<Book>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = repository.create(book).await?;
    tracing::info!(isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(BookResponse { book })))
}

async fn list_books(
    State(repository): State<SharedBookRepository>,
) -> Result<Json<BookListResponse>, AppError> {
    let books = repository.list_all().await?;
    Ok(Json(BookListResponse { books }))
}

async fn get_book(
    State(repository): State<SharedBookRepository>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = repository.get_by_isbn(&isbn).await?;
    Ok(Json(BookResponse { book }))
}

async fn update_book(
    State(repository): State<SharedBookRepository>,
    Path(isbn): Path<String>,
    ValidJson(book): ValidJson<Book>,
) -> Result<Json<BookResponse>, AppError> {
    if book.isbn != isbn {
        // isbn is immutable; the path wins
        tracing::warn!(path_isbn = %isbn, body_isbn = %book.isbn, "ignoring isbn in body");
    }
    let book = repository.update_by_isbn(&isbn, book).await?;
    tracing::info!(isbn = %book.isbn, "book updated");
    Ok(Json(BookResponse { book }))
}

async fn delete_book(
    State(repository): State<SharedBookRepository>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    repository.delete_by_isbn(&isbn).await?;
    tracing::info!(isbn = %isbn, "book deleted");
    Ok(Json(MessageResponse {
        message: "Book deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request},
        response::Response,
    };
    use bookstore_kernel::{settings::Settings, ModuleRegistry};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::modules::books::repository::InMemoryBookRepository;
    use crate::modules::books::BooksModule;

    fn two_towers() -> Book {
        Book {
            isbn: "123456789".to_string(),
            amazon_url: Some("https://amazon.com/LordOfTheRings".to_string()),
            author: "JRR Tolkien".to_string(),
            language: "English".to_string(),
            pages: 400,
            publisher: "Tolkien Enterprises".to_string(),
            title: "The Two Towers".to_string(),
            year: 1950,
        }
    }

    fn app() -> Router {
        let repository = Arc::new(InMemoryBookRepository::with_books([two_towers()]));
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(BooksModule::new(repository)));
        bookstore_http::build_router(&registry, &Settings::default())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        };
        app.clone().oneshot(request.unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn return_of_the_king() -> Value {
        json!({
            "isbn": "987654321",
            "amazon_url": "https://amazon.com/LOTR",
            "author": "JRR Tolkien",
            "language": "english",
            "pages": 500,
            "publisher": "Tolkien Enterprises",
            "title": "The Return of the King",
            "year": 1955
        })
    }

    #[tokio::test]
    async fn creates_a_new_book() {
        let app = app();
        let response = send(&app, Method::POST, "/books", Some(return_of_the_king())).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["book"]["isbn"], "987654321");
        assert_eq!(body["book"]["title"], "The Return of the King");
    }

    #[tokio::test]
    async fn rejects_book_without_required_data() {
        let app = app();
        let response = send(
            &app,
            Method::POST,
            "/books",
            Some(json!({ "author": "JRR Tolkien" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "validation_error");
        let fields: Vec<&str> = body["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|detail| detail["field"].as_str().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec!["isbn", "language", "pages", "publisher", "title", "year"]
        );
    }

    #[tokio::test]
    async fn rejects_wrongly_typed_fields() {
        let app = app();
        let mut payload = return_of_the_king();
        payload["pages"] = json!("500");

        let response = send(&app, Method::POST, "/books", Some(payload)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(
            body["error"]["details"],
            json!([{ "field": "pages", "error": "expected integer" }])
        );
    }

    #[tokio::test]
    async fn rejects_integers_too_large_for_the_column() {
        let app = app();
        let mut payload = return_of_the_king();
        payload["pages"] = json!(3_000_000_000_i64);
        payload["year"] = json!(-3_000_000_000_i64);

        let response = send(&app, Method::POST, "/books", Some(payload)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(
            body["error"]["details"],
            json!([
                { "field": "pages", "error": "expected integer" },
                { "field": "year", "error": "expected integer" }
            ])
        );
    }

    #[tokio::test]
    async fn rejects_body_without_json_content_type() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/books")
            .body(Body::from(return_of_the_king().to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn update_rejects_wrongly_typed_fields() {
        let app = app();
        let mut payload = serde_json::to_value(two_towers()).unwrap();
        payload["year"] = json!("1950");

        let response = send(&app, Method::PUT, "/books/123456789", Some(payload)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(
            body["error"]["details"],
            json!([{ "field": "year", "error": "expected integer" }])
        );

        let body = json_body(send(&app, Method::GET, "/books/123456789", None).await).await;
        assert_eq!(body["book"]["year"], 1950);
    }

    #[tokio::test]
    async fn rejects_non_positive_pages() {
        let app = app();
        let mut payload = return_of_the_king();
        payload["pages"] = json!(0);

        let response = send(&app, Method::POST, "/books", Some(payload)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["details"][0]["field"], "pages");
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/books")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"isbn\": "))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn rejects_duplicate_isbn() {
        let app = app();
        let response = send(
            &app,
            Method::POST,
            "/books",
            Some(serde_json::to_value(two_towers()).unwrap()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["details"][0]["field"], "isbn");
    }

    #[tokio::test]
    async fn lists_books() {
        let app = app();
        let response = send(&app, Method::GET, "/books", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let books = body["books"].as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["isbn"], "123456789");
        assert_eq!(books[0]["amazon_url"], "https://amazon.com/LordOfTheRings");
    }

    #[tokio::test]
    async fn listing_includes_created_books() {
        let app = app();
        send(&app, Method::POST, "/books", Some(return_of_the_king())).await;

        let body = json_body(send(&app, Method::GET, "/books", None).await).await;
        let isbns: Vec<&str> = body["books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|book| book["isbn"].as_str().unwrap())
            .collect();
        assert_eq!(isbns, vec!["123456789", "987654321"]);
    }

    #[tokio::test]
    async fn gets_a_single_book() {
        let app = app();
        let response = send(&app, Method::GET, "/books/123456789", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["book"]["isbn"], "123456789");
    }

    #[tokio::test]
    async fn responds_404_for_unknown_isbn() {
        let app = app();
        let response = send(&app, Method::GET, "/books/100", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn updates_a_single_book() {
        let app = app();
        let mut payload = serde_json::to_value(two_towers()).unwrap();
        payload["title"] = json!("The Fellowship of the Ring");
        payload["pages"] = json!(423);

        let response = send(&app, Method::PUT, "/books/123456789", Some(payload)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["book"]["isbn"], "123456789");
        assert_eq!(body["book"]["title"], "The Fellowship of the Ring");
        assert_eq!(body["book"]["pages"], 423);

        let body = json_body(send(&app, Method::GET, "/books/123456789", None).await).await;
        assert_eq!(body["book"]["title"], "The Fellowship of the Ring");
    }

    #[tokio::test]
    async fn update_keeps_path_isbn() {
        let app = app();
        let mut payload = serde_json::to_value(two_towers()).unwrap();
        payload["isbn"] = json!("000000000");

        let response = send(&app, Method::PUT, "/books/123456789", Some(payload)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["book"]["isbn"], "123456789");
    }

    #[tokio::test]
    async fn update_rejects_partial_payload() {
        let app = app();
        let response = send(
            &app,
            Method::PUT,
            "/books/123456789",
            Some(json!({ "title": "Only a title" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_of_unknown_isbn_is_404() {
        let app = app();
        let response = send(&app, Method::PUT, "/books/100", Some(return_of_the_king())).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_a_single_book() {
        let app = app();
        let response = send(&app, Method::DELETE, "/books/123456789", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "message": "Book deleted" }));

        let response = send(&app, Method::GET, "/books/123456789", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_of_unknown_isbn_is_404() {
        let app = app();
        let response = send(&app, Method::DELETE, "/books/100", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let app = app();
        let response = send(&app, Method::GET, "/authors", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn openapi_document_lists_book_routes() {
        let app = app();
        let body = json_body(send(&app, Method::GET, "/docs/openapi.json", None).await).await;

        assert!(body["paths"]["/books"]["post"].is_object());
        assert!(body["paths"]["/books/{isbn}"]["delete"].is_object());
        assert!(body["components"]["schemas"]["Book"].is_object());
    }
}
