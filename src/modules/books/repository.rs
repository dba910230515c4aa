use std::sync::Arc;

use async_trait::async_trait;
use bookstore_http::AppError;
use serde_json::json;
use sqlx::PgPool;

use super::models::Book;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("book {0} not found")]
    NotFound(String),

    #[error("book {0} already exists")]
    DuplicateIsbn(String),

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<BookRepositoryError> for AppError {
    fn from(err: BookRepositoryError) -> Self {
        match err {
            BookRepositoryError::NotFound(isbn) => {
                AppError::not_found(format!("There is no book with an isbn of '{isbn}'"))
            }
            BookRepositoryError::DuplicateIsbn(isbn) => AppError::validation(
                vec![json!({ "field": "isbn", "error": "already exists" })],
                format!("A book with isbn '{isbn}' already exists"),
            ),
            BookRepositoryError::Database(err) => {
                AppError::Internal(anyhow::Error::new(err).context("database query failed"))
            }
        }
    }
}

pub type SharedBookRepository = Arc<dyn BookRepository>;

/// Data access for the `books` table.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Inserts a book and returns the stored row
    async fn create(&self, book: Book) -> Result<Book, BookRepositoryError>;
    /// Every book, ordered by isbn
    async fn list_all(&self) -> Result<Vec<Book>, BookRepositoryError>;
    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, BookRepositoryError>;
    /// Replaces every column except the isbn, which is taken from `isbn`
    async fn update_by_isbn(&self, isbn: &str, book: Book) -> Result<Book, BookRepositoryError>;
    async fn delete_by_isbn(&self, isbn: &str) -> Result<(), BookRepositoryError>;
}

/// [`BookRepository`] over a PostgreSQL pool; one query per call.
#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    #[tracing::instrument(skip(self, book), fields(isbn = %book.isbn))]
    async fn create(&self, book: Book) -> Result<Book, BookRepositoryError> {
        sqlx::query_as::<_, Book>(
            "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        )
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                BookRepositoryError::DuplicateIsbn(book.isbn.clone())
            }
            _ => BookRepositoryError::Database(err),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Book>, BookRepositoryError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
             FROM books
             ORDER BY isbn",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, BookRepositoryError> {
        sqlx::query_as::<_, Book>(
            "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
             FROM books
             WHERE isbn = $1",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BookRepositoryError::NotFound(isbn.to_string()))
    }

    #[tracing::instrument(skip(self, book))]
    async fn update_by_isbn(&self, isbn: &str, book: Book) -> Result<Book, BookRepositoryError> {
        sqlx::query_as::<_, Book>(
            "UPDATE books
             SET amazon_url = $1, author = $2, language = $3, pages = $4,
                 publisher = $5, title = $6, year = $7
             WHERE isbn = $8
             RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        )
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BookRepositoryError::NotFound(isbn.to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_isbn(&self, isbn: &str) -> Result<(), BookRepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BookRepositoryError::NotFound(isbn.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub use in_memory::InMemoryBookRepository;
