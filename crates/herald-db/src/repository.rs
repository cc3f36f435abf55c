use herald_core::error::AppError;
use herald_core::models::{Article, Language};
use sqlx::{PgPool, Pool, Postgres};

/// Article persistence in PostgreSQL.
#[derive(Clone)]
pub struct ArticleRepository {
    pool: Pool<Postgres>,
}

impl ArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an article and return the generated id.
    pub async fn add(&self, article: &Article) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO article (author, title, body, language, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&article.author)
        .bind(&article.title)
        .bind(&article.body)
        .bind(article.language.code())
        .bind(article.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(id)
    }

    /// Oldest record whose title or body equals the given text.
    pub async fn find_by_title_or_body(&self, title: &str, body: &str) -> Result<Article, AppError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, author, title, body, language, created_at
            FROM article
            WHERE title = $1 OR body = $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(title)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Into::into).ok_or(AppError::RecordNotFound)
    }

    /// Overwrite title, body and timestamp of the record with `article.id`.
    pub async fn update_by_id(&self, article: &Article) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            r#"
            UPDATE article
            SET title = $2, body = $3, created_at = $4
            WHERE id = $1
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.body)
        .bind(article.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::RecordNotFound);
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(e.to_string())
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    author: String,
    title: String,
    body: String,
    language: i16,
    created_at: i64,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        let language = Language::from_code(row.language).unwrap_or_else(|| {
            tracing::warn!(id = row.id, code = row.language, "Unknown language code, assuming Chinese");
            Language::Chinese
        });
        Article {
            id: row.id,
            author: row.author,
            title: row.title,
            body: row.body,
            language,
            created_at: row.created_at,
        }
    }
}

// -- Trait implementation --

impl herald_core::traits::ArticleStore for ArticleRepository {
    async fn add(&self, article: &Article) -> Result<i64, AppError> {
        ArticleRepository::add(self, article).await
    }

    async fn find_by_title_or_body(&self, title: &str, body: &str) -> Result<Article, AppError> {
        ArticleRepository::find_by_title_or_body(self, title, body).await
    }

    async fn update_by_id(&self, article: &Article) -> Result<(), AppError> {
        ArticleRepository::update_by_id(self, article).await
    }
}
