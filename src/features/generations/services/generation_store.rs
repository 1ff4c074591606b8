use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::generations::dtos::GenerationListQuery;
use crate::features::generations::models::{Generation, NewGeneration};

const GENERATION_COLUMNS: &str = "id, user_id, image_path, generated_prompt, original_filename, \
                                  file_size, mime_type, created_at";

/// Persistence for generation records
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Persist a record, assigning its id and creation time
    async fn insert(&self, generation: NewGeneration) -> Result<Generation>;

    /// One page of the owner's records plus the owner's total matching count
    async fn list(
        &self,
        owner_id: &str,
        query: &GenerationListQuery,
    ) -> Result<(Vec<Generation>, i64)>;
}

/// Postgres-backed generation store
pub struct PgGenerationStore {
    pool: PgPool,
}

impl PgGenerationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenerationStore for PgGenerationStore {
    async fn insert(&self, generation: NewGeneration) -> Result<Generation> {
        let query = format!(
            r#"
            INSERT INTO image_prompt_generations
                (id, user_id, image_path, generated_prompt, original_filename, file_size, mime_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            GENERATION_COLUMNS
        );

        let record: Generation = sqlx::query_as(&query)
            .bind(Uuid::now_v7())
            .bind(&generation.user_id)
            .bind(&generation.image_path)
            .bind(&generation.generated_prompt)
            .bind(&generation.original_filename)
            .bind(generation.file_size)
            .bind(&generation.mime_type)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert generation: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(record)
    }

    async fn list(
        &self,
        owner_id: &str,
        query: &GenerationListQuery,
    ) -> Result<(Vec<Generation>, i64)> {
        let total: i64 = count_query(owner_id, query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let records: Vec<Generation> = page_query(owner_id, query)
            .build_query_as::<Generation>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((records, total))
    }
}

/// Escape LIKE metacharacters so the search term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    owner_id: &'a str,
    query: &GenerationListQuery,
) {
    builder.push(" WHERE user_id = ");
    builder.push_bind(owner_id);

    if let Some(ref search) = query.search {
        builder.push(" AND generated_prompt ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(search)));
        builder.push(" ESCAPE '\\'");
    }
}

fn count_query<'a>(owner_id: &'a str, query: &GenerationListQuery) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM image_prompt_generations");
    push_filters(&mut builder, owner_id, query);
    builder
}

fn page_query<'a>(owner_id: &'a str, query: &GenerationListQuery) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM image_prompt_generations",
        GENERATION_COLUMNS
    ));
    push_filters(&mut builder, owner_id, query);

    // Sort column and direction come from closed enums; the id tiebreak keeps pages stable
    let direction = query.sort.direction.as_sql();
    builder.push(format!(
        " ORDER BY {} {}, id {}",
        query.sort.field.as_sql(),
        direction,
        direction
    ));
    builder.push(" LIMIT ");
    builder.push_bind(query.per_page);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset());
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::generations::dtos::{GenerationSort, ListGenerationsQuery};

    fn normalized(search: Option<&str>, sort: Option<&str>) -> GenerationListQuery {
        ListGenerationsQuery {
            search: search.map(String::from),
            sort: sort.map(String::from),
            per_page: Some(10),
            page: Some(2),
        }
        .into()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("bicycle"), "bicycle");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
    }

    #[test]
    fn test_page_query_without_search() {
        let query = normalized(None, None);
        let builder = page_query("u1", &query);

        assert_eq!(
            builder.sql(),
            format!(
                "SELECT {} FROM image_prompt_generations WHERE user_id = $1 \
                 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
                GENERATION_COLUMNS
            )
        );
    }

    #[test]
    fn test_page_query_with_search_and_sort() {
        let query = normalized(Some("cat"), Some("file_size"));
        let builder = page_query("u1", &query);

        assert_eq!(
            builder.sql(),
            format!(
                "SELECT {} FROM image_prompt_generations WHERE user_id = $1 \
                 AND generated_prompt ILIKE $2 ESCAPE '\\' \
                 ORDER BY file_size ASC, id ASC LIMIT $3 OFFSET $4",
                GENERATION_COLUMNS
            )
        );
    }

    #[test]
    fn test_count_query_ignores_paging_and_sort() {
        let query = normalized(Some("cat"), Some("-generated_prompt"));
        assert_eq!(query.sort, GenerationSort::parse(Some("-generated_prompt")));

        let builder = count_query("u1", &query);

        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM image_prompt_generations WHERE user_id = $1 \
             AND generated_prompt ILIKE $2 ESCAPE '\\'"
        );
    }
}
