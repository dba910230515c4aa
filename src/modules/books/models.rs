use bookstore_http::validation::{FieldKind, FieldSpec, PayloadSchema};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A row of the `books` table; also the full request body for create and replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, sqlx::FromRow)]
pub struct Book {
    /// International Standard Book Number, the primary key
    #[validate(length(min = 1, message = "must not be empty"))]
    pub isbn: String,
    /// Store page for the book
    #[validate(url(message = "must be a URL"))]
    pub amazon_url: Option<String>,
    pub author: String,
    pub language: String,
    #[validate(range(min = 1, message = "must be positive"))]
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    /// Publication year
    pub year: i32,
}

impl PayloadSchema for Book {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("isbn", FieldKind::String),
        FieldSpec::optional("amazon_url", FieldKind::String),
        FieldSpec::required("author", FieldKind::String),
        FieldSpec::required("language", FieldKind::String),
        FieldSpec::required("pages", FieldKind::Int32),
        FieldSpec::required("publisher", FieldKind::String),
        FieldSpec::required("title", FieldKind::String),
        FieldSpec::required("year", FieldKind::Int32),
    ];
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub book: Book,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookListResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}
