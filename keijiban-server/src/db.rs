use anyhow::Context;
use futures::{future, TryStreamExt};
use keijiban_api::{NewPost, Post, PostEdit, PostId, Time};
use sqlx::{sqlite::SqliteRow, Row};

fn post_from_row(row: &SqliteRow) -> anyhow::Result<Post> {
    Ok(Post {
        id: PostId(row.try_get("id")?),
        content: row.try_get("content")?,
        author_name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        parent_id: row.try_get::<Option<i64>, _>("parent_id")?.map(PostId),
    })
}

/// Ids only ever grow, so this is also creation order
pub async fn fetch_posts(conn: &mut sqlx::SqliteConnection) -> anyhow::Result<Vec<Post>> {
    sqlx::query("SELECT id, content, name, created_at, parent_id FROM posts ORDER BY id")
        .fetch(conn)
        .map_err(anyhow::Error::from)
        .and_then(|row| future::ready(post_from_row(&row).context("decoding post row")))
        .try_collect::<Vec<Post>>()
        .await
        .context("querying posts table")
}

pub async fn create_post(
    conn: &mut sqlx::SqliteConnection,
    post: &NewPost,
    created_at: Time,
) -> anyhow::Result<PostId> {
    let res = sqlx::query(
        "INSERT INTO posts (content, name, created_at, parent_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&post.content)
    .bind(&post.author_name)
    .bind(created_at)
    .bind(post.parent_id.map(|id| id.0))
    .execute(conn)
    .await
    .context("inserting post")?;
    Ok(PostId(res.last_insert_rowid()))
}

/// Returns false if there was no such post
pub async fn update_post(
    conn: &mut sqlx::SqliteConnection,
    id: PostId,
    edit: &PostEdit,
) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE posts SET content = ?, name = ? WHERE id = ?")
        .bind(&edit.content)
        .bind(&edit.author_name)
        .bind(id.0)
        .execute(conn)
        .await
        .with_context(|| format!("updating post {id}"))?;
    Ok(res.rows_affected() > 0)
}

/// Replies to the post are left untouched
pub async fn delete_post(conn: &mut sqlx::SqliteConnection, id: PostId) -> anyhow::Result<()> {
    let res = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id.0)
        .execute(conn)
        .await
        .with_context(|| format!("deleting post {id}"))?;
    if res.rows_affected() == 0 {
        tracing::debug!(?id, "deleted post did not exist");
    }
    Ok(())
}
