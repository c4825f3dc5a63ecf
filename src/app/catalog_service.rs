//! The catalog service.
//!
//! This module sits between the HTTP handlers and the SQLite store.
//! It is responsible for:
//! 1.  Reading authors and books, including the derived `books_count` and the
//!     joined `author_name`.
//! 2.  Applying creates, partial updates and deletes, each inside a single
//!     transaction that also holds the existence and uniqueness checks.
//! 3.  Keeping `livro.autor_id` pointing at a live author: references are
//!     checked on write and books are removed together with their author.
//!
//! Reads go through the reader pool. Every mutation runs on the single
//! writer connection, so write transactions are serialized.

use crate::domain::error::{CatalogError, CatalogResult};
use crate::domain::model::{Author, AuthorChanges, Book, BookChanges, NewAuthor, NewBook};
use crate::infra::config::AppConfig;
use crate::storage::{self, CatalogPools};
use sqlx::{Executor, Sqlite, Transaction};

const SELECT_AUTHORS: &str = "SELECT a.id AS id, a.nome AS name, a.nascimento AS birth_date,
        (SELECT COUNT(*) FROM livro l WHERE l.autor_id = a.id) AS books_count
     FROM autor a";

const SELECT_AUTHOR_BY_ID: &str = "SELECT a.id AS id, a.nome AS name, a.nascimento AS birth_date,
        (SELECT COUNT(*) FROM livro l WHERE l.autor_id = a.id) AS books_count
     FROM autor a
     WHERE a.id = ?";

const SELECT_BOOKS: &str = "SELECT l.id AS id, l.titulo AS title, l.ano_publicacao AS publication_year,
        l.isbn AS isbn, l.autor_id AS author_id, a.nome AS author_name
     FROM livro l
     JOIN autor a ON a.id = l.autor_id";

const SELECT_BOOK_BY_ID: &str = "SELECT l.id AS id, l.titulo AS title, l.ano_publicacao AS publication_year,
        l.isbn AS isbn, l.autor_id AS author_id, a.nome AS author_name
     FROM livro l
     JOIN autor a ON a.id = l.autor_id
     WHERE l.id = ?";

/// Persistence operations over authors and books.
///
/// Cloning is cheap: the service only holds the pools, and every operation
/// checks a connection out for its own duration.
#[derive(Clone)]
pub struct CatalogService {
    pools: CatalogPools,
}

impl CatalogService {
    /// Wraps existing pools. The schema is expected to exist already.
    pub fn new(pools: CatalogPools) -> Self {
        Self { pools }
    }

    /// Connects to the configured store and makes sure the schema exists.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pools = storage::open(&config.database_url, config.max_connections).await?;
        storage::apply_schema(&pools.writer).await?;
        Ok(Self::new(pools))
    }

    pub async fn close(&self) {
        self.pools.close().await;
    }

    /// Round-trips a trivial query; used by the health endpoint.
    pub async fn ping(&self) -> CatalogResult<()> {
        sqlx::query("SELECT 1").execute(&self.pools.reader).await?;
        Ok(())
    }

    async fn begin_write(&self) -> CatalogResult<Transaction<'static, Sqlite>> {
        Ok(self.pools.writer.begin().await?)
    }

    // --- authors ---

    pub async fn list_authors(&self) -> CatalogResult<Vec<Author>> {
        let sql = format!("{SELECT_AUTHORS} ORDER BY a.id");
        let authors = sqlx::query_as::<_, Author>(&sql)
            .fetch_all(&self.pools.reader)
            .await?;
        Ok(authors)
    }

    pub async fn get_author(&self, id: i64) -> CatalogResult<Author> {
        fetch_author(&self.pools.reader, id)
            .await?
            .ok_or(CatalogError::AuthorNotFound(id))
    }

    pub async fn create_author(&self, input: NewAuthor) -> CatalogResult<Author> {
        input.validate()?;

        let mut tx = self.begin_write().await?;
        let id = sqlx::query("INSERT INTO autor (nome, nascimento) VALUES (?, ?)")
            .bind(&input.name)
            .bind(&input.birth_date)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        let author = fetch_author(&mut *tx, id)
            .await?
            .ok_or(CatalogError::AuthorNotFound(id))?;
        tx.commit().await?;

        tracing::info!(author_id = id, "author created");
        Ok(author)
    }

    pub async fn update_author(&self, id: i64, changes: AuthorChanges) -> CatalogResult<Author> {
        let mut tx = self.begin_write().await?;
        let mut author = fetch_author(&mut *tx, id)
            .await?
            .ok_or(CatalogError::AuthorNotFound(id))?;
        changes.validate()?;
        changes.apply_to(&mut author);

        sqlx::query("UPDATE autor SET nome = ?, nascimento = ? WHERE id = ?")
            .bind(&author.name)
            .bind(&author.birth_date)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let author = fetch_author(&mut *tx, id)
            .await?
            .ok_or(CatalogError::AuthorNotFound(id))?;
        tx.commit().await?;

        tracing::info!(author_id = id, "author updated");
        Ok(author)
    }

    /// Deletes the author and every book referencing it. Returns the author as
    /// it was just before deletion.
    pub async fn delete_author(&self, id: i64) -> CatalogResult<Author> {
        let mut tx = self.begin_write().await?;
        let author = fetch_author(&mut *tx, id)
            .await?
            .ok_or(CatalogError::AuthorNotFound(id))?;

        // The FK cascade would do this too; deleting explicitly keeps the
        // invariant even on a connection opened without `foreign_keys`.
        let books_removed = sqlx::query("DELETE FROM livro WHERE autor_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM autor WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(author_id = id, books_removed, "author deleted");
        Ok(author)
    }

    // --- books ---

    pub async fn list_books(&self) -> CatalogResult<Vec<Book>> {
        let sql = format!("{SELECT_BOOKS} ORDER BY l.id");
        let books = sqlx::query_as::<_, Book>(&sql).fetch_all(&self.pools.reader).await?;
        Ok(books)
    }

    pub async fn get_book(&self, id: i64) -> CatalogResult<Book> {
        fetch_book(&self.pools.reader, id)
            .await?
            .ok_or(CatalogError::BookNotFound(id))
    }

    pub async fn create_book(&self, input: NewBook) -> CatalogResult<Book> {
        input.validate()?;

        let mut tx = self.begin_write().await?;
        if !author_exists(&mut *tx, input.author_id).await? {
            return Err(CatalogError::UnknownAuthor(input.author_id));
        }
        if isbn_taken(&mut *tx, &input.isbn, None).await? {
            tracing::info!(isbn = %input.isbn, "rejected duplicate isbn");
            return Err(CatalogError::DuplicateIsbn(input.isbn));
        }

        let id = sqlx::query(
            "INSERT INTO livro (titulo, ano_publicacao, isbn, autor_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&input.title)
        .bind(input.publication_year)
        .bind(&input.isbn)
        .bind(input.author_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_write_error(e, &input.isbn, input.author_id, false))?
        .last_insert_rowid();
        let book = fetch_book(&mut *tx, id)
            .await?
            .ok_or(CatalogError::BookNotFound(id))?;
        tx.commit().await?;

        tracing::info!(book_id = id, author_id = book.author_id, "book created");
        Ok(book)
    }

    /// Partial update. A changed `isbn` must not belong to another book; the
    /// book's own ISBN may be resubmitted.
    pub async fn update_book(&self, id: i64, changes: BookChanges) -> CatalogResult<Book> {
        let mut tx = self.begin_write().await?;
        let mut book = fetch_book(&mut *tx, id)
            .await?
            .ok_or(CatalogError::BookNotFound(id))?;
        changes.validate()?;

        if let Some(author_id) = changes.new_author_id() {
            if !author_exists(&mut *tx, author_id).await? {
                return Err(CatalogError::UnknownNewAuthor(author_id));
            }
        }
        if let Some(isbn) = changes.new_isbn() {
            if isbn_taken(&mut *tx, isbn, Some(id)).await? {
                tracing::info!(book_id = id, isbn = %isbn, "rejected duplicate isbn on update");
                return Err(CatalogError::DuplicateIsbn(isbn.to_string()));
            }
        }
        changes.apply_to(&mut book);

        sqlx::query(
            "UPDATE livro SET titulo = ?, ano_publicacao = ?, isbn = ?, autor_id = ? WHERE id = ?",
        )
        .bind(&book.title)
        .bind(book.publication_year)
        .bind(&book.isbn)
        .bind(book.author_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_write_error(e, &book.isbn, book.author_id, true))?;
        let book = fetch_book(&mut *tx, id)
            .await?
            .ok_or(CatalogError::BookNotFound(id))?;
        tx.commit().await?;

        tracing::info!(book_id = id, "book updated");
        Ok(book)
    }

    /// Returns the book as it was just before deletion.
    pub async fn delete_book(&self, id: i64) -> CatalogResult<Book> {
        let mut tx = self.begin_write().await?;
        let book = fetch_book(&mut *tx, id)
            .await?
            .ok_or(CatalogError::BookNotFound(id))?;
        sqlx::query("DELETE FROM livro WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(book_id = id, "book deleted");
        Ok(book)
    }
}

async fn fetch_author<'e, E>(executor: E, id: i64) -> Result<Option<Author>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Author>(SELECT_AUTHOR_BY_ID)
        .bind(id)
        .fetch_optional(executor)
        .await
}

async fn fetch_book<'e, E>(executor: E, id: i64) -> Result<Option<Book>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Book>(SELECT_BOOK_BY_ID)
        .bind(id)
        .fetch_optional(executor)
        .await
}

async fn author_exists<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM autor WHERE id = ?)")
        .bind(id)
        .fetch_one(executor)
        .await?;
    Ok(found != 0)
}

/// True when some book other than `exclude` already carries `isbn`.
async fn isbn_taken<'e, E>(executor: E, isbn: &str, exclude: Option<i64>) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM livro WHERE isbn = ? AND (? IS NULL OR id <> ?))",
    )
    .bind(isbn)
    .bind(exclude)
    .bind(exclude)
    .fetch_one(executor)
    .await?;
    Ok(found != 0)
}

/// Maps constraint violations the pre-checks could have raced with.
fn classify_write_error(err: sqlx::Error, isbn: &str, author_id: i64, on_update: bool) -> CatalogError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return CatalogError::DuplicateIsbn(isbn.to_string());
        }
        if db.is_foreign_key_violation() {
            return if on_update {
                CatalogError::UnknownNewAuthor(author_id)
            } else {
                CatalogError::UnknownAuthor(author_id)
            };
        }
    }
    CatalogError::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::connect_in_memory;

    async fn service() -> CatalogService {
        CatalogService::new(CatalogPools::shared(connect_in_memory().await.unwrap()))
    }

    fn new_author(name: &str) -> NewAuthor {
        NewAuthor {
            name: name.to_string(),
            birth_date: None,
        }
    }

    fn new_book(title: &str, isbn: &str, author_id: i64) -> NewBook {
        NewBook {
            title: title.to_string(),
            isbn: isbn.to_string(),
            author_id,
            publication_year: None,
        }
    }

    #[tokio::test]
    async fn test_new_author_has_no_books() {
        let svc = service().await;
        let author = svc.create_author(new_author("Jane Austen")).await.unwrap();
        assert_eq!(author.id, 1);
        assert_eq!(author.name, "Jane Austen");
        assert_eq!(author.birth_date, None);
        assert_eq!(author.books_count, 0);
    }

    #[tokio::test]
    async fn test_books_count_follows_books() {
        let svc = service().await;
        let jane = svc.create_author(new_author("Jane Austen")).await.unwrap();
        svc.create_book(new_book("Emma", "123", jane.id)).await.unwrap();
        let persuasion = svc
            .create_book(new_book("Persuasion", "456", jane.id))
            .await
            .unwrap();
        assert_eq!(svc.get_author(jane.id).await.unwrap().books_count, 2);

        svc.delete_book(persuasion.id).await.unwrap();
        assert_eq!(svc.get_author(jane.id).await.unwrap().books_count, 1);
    }

    #[tokio::test]
    async fn test_create_book_unknown_author() {
        let svc = service().await;
        let err = svc.create_book(new_book("Emma", "123", 7)).await.unwrap_err();
        assert!(matches!(err, CatalogError::UnknownAuthor(7)));
        assert!(svc.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_isbn_keeps_first_book() {
        let svc = service().await;
        let jane = svc.create_author(new_author("Jane Austen")).await.unwrap();
        let emma = svc.create_book(new_book("Emma", "123", jane.id)).await.unwrap();

        let err = svc.create_book(new_book("Dup", "123", jane.id)).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateIsbn(_)));
        assert_eq!(svc.get_book(emma.id).await.unwrap(), emma);
        assert_eq!(svc.list_books().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_author_cascades() {
        let svc = service().await;
        let jane = svc.create_author(new_author("Jane Austen")).await.unwrap();
        let bronte = svc.create_author(new_author("Charlotte Brontë")).await.unwrap();
        let emma = svc.create_book(new_book("Emma", "123", jane.id)).await.unwrap();
        let eyre = svc
            .create_book(new_book("Jane Eyre", "789", bronte.id))
            .await
            .unwrap();

        let deleted = svc.delete_author(jane.id).await.unwrap();
        assert_eq!(deleted.books_count, 1);
        assert!(matches!(
            svc.get_book(emma.id).await.unwrap_err(),
            CatalogError::BookNotFound(_)
        ));
        assert!(matches!(
            svc.get_author(jane.id).await.unwrap_err(),
            CatalogError::AuthorNotFound(_)
        ));
        assert_eq!(svc.get_book(eyre.id).await.unwrap().author_name, "Charlotte Brontë");
    }

    #[tokio::test]
    async fn test_delete_author_removes_all_their_books() {
        let svc = service().await;
        let jane = svc.create_author(new_author("Jane Austen")).await.unwrap();
        let mut ids = Vec::new();
        for (title, isbn) in [("Emma", "123"), ("Persuasion", "456"), ("Mansfield Park", "457")] {
            ids.push(svc.create_book(new_book(title, isbn, jane.id)).await.unwrap().id);
        }

        let deleted = svc.delete_author(jane.id).await.unwrap();
        assert_eq!(deleted.books_count, 3);
        for id in ids {
            assert!(matches!(
                svc.get_book(id).await.unwrap_err(),
                CatalogError::BookNotFound(missing) if missing == id
            ));
        }
        assert!(svc.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_record_before_validation() {
        let svc = service().await;
        let err = svc
            .update_book(
                999,
                BookChanges {
                    title: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::BookNotFound(999)));

        let err = svc
            .update_author(
                999,
                AuthorChanges {
                    name: Some(None),
                    birth_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::AuthorNotFound(999)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_on_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
        let pools = storage::open(&url, 5).await.unwrap();
        storage::apply_schema(&pools.writer).await.unwrap();
        let svc = CatalogService::new(pools);
        let jane = svc.create_author(new_author("Jane Austen")).await.unwrap();
        let author_id = jane.id;

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.create_book(new_book(&format!("Book {i}"), &format!("isbn-{i}"), author_id))
                        .await
                })
            })
            .collect();
        for handle in handles {
            let result = handle.await.unwrap();
            assert!(
                !matches!(result, Err(CatalogError::Storage(_))),
                "write failed on storage: {result:?}"
            );
            result.unwrap();
        }

        assert_eq!(svc.list_books().await.unwrap().len(), 100);
        assert_eq!(svc.get_author(jane.id).await.unwrap().books_count, 100);
        svc.close().await;
    }

    #[tokio::test]
    async fn test_update_author_partial() {
        let svc = service().await;
        let jane = svc
            .create_author(NewAuthor {
                name: "Jane Austen".to_string(),
                birth_date: Some("1775-12-16".to_string()),
            })
            .await
            .unwrap();

        let updated = svc
            .update_author(
                jane.id,
                AuthorChanges {
                    name: Some(Some("J. Austen".to_string())),
                    birth_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "J. Austen");
        assert_eq!(updated.birth_date.as_deref(), Some("1775-12-16"));

        let err = svc
            .update_author(99, AuthorChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::AuthorNotFound(99)));
    }

    #[tokio::test]
    async fn test_update_book_author_and_isbn_rules() {
        let svc = service().await;
        let jane = svc.create_author(new_author("Jane Austen")).await.unwrap();
        let bronte = svc.create_author(new_author("Charlotte Brontë")).await.unwrap();
        let emma = svc.create_book(new_book("Emma", "123", jane.id)).await.unwrap();
        svc.create_book(new_book("Jane Eyre", "789", bronte.id))
            .await
            .unwrap();

        let err = svc
            .update_book(
                emma.id,
                BookChanges {
                    author_id: Some(Some(42)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownNewAuthor(42)));

        let err = svc
            .update_book(
                emma.id,
                BookChanges {
                    isbn: Some(Some("789".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateIsbn(_)));

        // Resubmitting its own ISBN is not a conflict.
        let moved = svc
            .update_book(
                emma.id,
                BookChanges {
                    isbn: Some(Some("123".to_string())),
                    author_id: Some(Some(bronte.id)),
                    publication_year: Some(Some(1815)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.title, "Emma");
        assert_eq!(moved.author_id, bronte.id);
        assert_eq!(moved.author_name, "Charlotte Brontë");
        assert_eq!(moved.publication_year, Some(1815));
    }

    #[tokio::test]
    async fn test_validation_before_write() {
        let svc = service().await;
        let err = svc.create_author(new_author("")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let jane = svc.create_author(new_author("Jane Austen")).await.unwrap();
        let err = svc.create_book(new_book(" ", "123", jane.id)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(svc.list_authors().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ping() {
        service().await.ping().await.unwrap();
    }
}
