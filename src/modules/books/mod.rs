pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookstore_kernel::{InitCtx, Migration, Module};
use serde_json::json;
use sqlx::PgPool;

use repository::{PgBookRepository, SharedBookRepository};

/// Books module: CRUD over the `books` table
pub struct BooksModule {
    repository: SharedBookRepository,
}

impl BooksModule {
    pub fn new(repository: SharedBookRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.repository))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    isbn       TEXT PRIMARY KEY,
                    amazon_url TEXT,
                    author     TEXT NOT NULL,
                    language   TEXT NOT NULL,
                    pages      INTEGER NOT NULL,
                    publisher  TEXT NOT NULL,
                    title      TEXT NOT NULL,
                    year       INTEGER NOT NULL
                );
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn book_body() -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn isbn_parameter() -> serde_json::Value {
    json!([{
        "name": "isbn",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    }])
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("All books", "BookListResponse"),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body(),
                    "responses": {
                        "201": json_response("Created book", "BookResponse"),
                        "400": error_response("Invalid payload or duplicate isbn"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{isbn}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": isbn_parameter(),
                    "responses": {
                        "200": json_response("The book", "BookResponse"),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book",
                    "tags": ["Books"],
                    "parameters": isbn_parameter(),
                    "requestBody": book_body(),
                    "responses": {
                        "200": json_response("Updated book", "BookResponse"),
                        "400": error_response("Invalid payload"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": isbn_parameter(),
                    "responses": {
                        "200": json_response("Deletion confirmation", "MessageResponse"),
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "isbn": { "type": "string", "description": "International Standard Book Number" },
                        "amazon_url": { "type": "string", "format": "uri" },
                        "author": { "type": "string" },
                        "language": { "type": "string" },
                        "pages": { "type": "integer", "minimum": 1 },
                        "publisher": { "type": "string" },
                        "title": { "type": "string" },
                        "year": { "type": "integer" }
                    },
                    "required": ["isbn", "author", "language", "pages", "publisher", "title", "year"]
                },
                "BookResponse": {
                    "type": "object",
                    "properties": { "book": { "$ref": "#/components/schemas/Book" } },
                    "required": ["book"]
                },
                "BookListResponse": {
                    "type": "object",
                    "properties": {
                        "books": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Book" }
                        }
                    },
                    "required": ["books"]
                },
                "MessageResponse": {
                    "type": "object",
                    "properties": { "message": { "type": "string" } },
                    "required": ["message"]
                }
            }
        }
    })
}

/// Create the books module backed by PostgreSQL
pub fn create_module(pool: PgPool) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(PgBookRepository::new(pool))))
}
