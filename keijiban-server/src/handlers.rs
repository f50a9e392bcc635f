use anyhow::Context;
use axum::{extract::Path, Json};
use chrono::Utc;
use keijiban_api::{NewPost, Post, PostEdit, PostId};

use crate::{db, extractors::*, Error};

pub async fn fetch_posts(mut conn: DbConn) -> Result<Json<Vec<Post>>, Error> {
    Ok(Json(
        db::fetch_posts(&mut *conn)
            .await
            .context("fetching post list")?,
    ))
}

pub async fn create_post(mut conn: DbConn, Json(data): Json<NewPost>) -> Result<Json<Post>, Error> {
    data.validate()?;
    let data = NewPost::new(data.content, data.author_name, data.parent_id);
    let created_at = Utc::now();
    let id = db::create_post(&mut *conn, &data, created_at).await?;
    tracing::info!(?id, reply_to = ?data.parent_id, "created post");
    Ok(Json(data.into_post(id, created_at)))
}

pub async fn update_post(
    mut conn: DbConn,
    Path(id): Path<i64>,
    Json(data): Json<PostEdit>,
) -> Result<(), Error> {
    let id = PostId(id);
    data.validate()?;
    let data = PostEdit::new(data.content, data.author_name);
    if !db::update_post(&mut *conn, id, &data).await? {
        return Err(Error::post_not_found(id));
    }
    tracing::info!(?id, "updated post");
    Ok(())
}

pub async fn delete_post(mut conn: DbConn, Path(id): Path<i64>) -> Result<(), Error> {
    let id = PostId(id);
    db::delete_post(&mut *conn, id).await?;
    tracing::info!(?id, "deleted post");
    Ok(())
}
