use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::PostRepository;
use crate::error::Result;
use crate::models::{Comment, LikeTransition, NewPost, PageRequest, Post};

const POST_COLUMNS: &str = "id, author_id, content, tags, likes, comments, created_at, updated_at";

/// Postgres-backed post storage.
///
/// A post is one row: likes live in a `uuid[]` column and comments in a
/// `jsonb` array, so every aggregate mutation is a single-row UPDATE.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    content: String,
    tags: Vec<String>,
    likes: Vec<Uuid>,
    comments: Json<Vec<Comment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            author_id: row.author_id,
            content: row.content,
            tags: row.tags,
            likes: row.likes,
            comments: row.comments.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post> {
        let sql = format!(
            r#"
            INSERT INTO posts (id, author_id, content, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(new_post.author_id)
            .bind(&new_post.content)
            .bind(&new_post.tags)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn list(&self, author_id: Option<Uuid>, page: PageRequest) -> Result<(Vec<Post>, u64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE ($1::uuid IS NULL OR author_id = $1)",
        )
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE ($1::uuid IS NULL OR author_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author_id)
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Post::from).collect(), total.max(0) as u64))
    }

    async fn update_content(
        &self,
        id: Uuid,
        content: String,
        tags: Vec<String>,
    ) -> Result<Option<Post>> {
        let sql = format!(
            r#"
            UPDATE posts
            SET content = $2, tags = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(&content)
            .bind(&tags)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<(Post, LikeTransition)>> {
        // One statement under the row lock: membership test and mutation
        // cannot interleave with another toggle on the same post.
        let sql = format!(
            r#"
            UPDATE posts
            SET likes = CASE
                    WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                    ELSE array_append(likes, $2)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            let post = Post::from(row);
            let transition = if post.is_liked_by(user_id) {
                LikeTransition::Liked
            } else {
                LikeTransition::Unliked
            };
            (post, transition)
        }))
    }

    async fn add_comment(&self, id: Uuid, comment: Comment) -> Result<Option<Post>> {
        let sql = format!(
            r#"
            UPDATE posts
            SET comments = comments || $2::jsonb, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(Json(vec![comment]))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn remove_comment(&self, id: Uuid, comment_id: Uuid) -> Result<Option<Post>> {
        let sql = format!(
            r#"
            UPDATE posts
            SET comments = COALESCE(
                    (SELECT jsonb_agg(elem ORDER BY ord)
                     FROM jsonb_array_elements(comments) WITH ORDINALITY AS e(elem, ord)
                     WHERE elem->>'id' <> $2),
                    '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(comment_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }
}
