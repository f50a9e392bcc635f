use async_trait::async_trait;

use crate::{Error, NewPost, Post, PostEdit, PostId};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The store answered, and refused the request
    #[error(transparent)]
    Api(#[from] Error),

    /// The store could not be reached, or its answer could not be understood
    #[error("transport failure: {0:#}")]
    Transport(#[from] anyhow::Error),
}

/// Access to the post collection. Nothing is ever pushed through this: all
/// state changes made by other clients are learned by calling `list` again.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Returns every stored post, in no particular order
    async fn list(&self) -> Result<Vec<Post>, GatewayError>;

    /// The store assigns `id` and `created_at`
    async fn insert(&self, post: NewPost) -> Result<(), GatewayError>;

    async fn update(&self, id: PostId, edit: PostEdit) -> Result<(), GatewayError>;

    async fn delete(&self, id: PostId) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    async fn list(&self) -> Result<Vec<Post>, GatewayError> {
        (**self).list().await
    }

    async fn insert(&self, post: NewPost) -> Result<(), GatewayError> {
        (**self).insert(post).await
    }

    async fn update(&self, id: PostId, edit: PostEdit) -> Result<(), GatewayError> {
        (**self).update(id, edit).await
    }

    async fn delete(&self, id: PostId) -> Result<(), GatewayError> {
        (**self).delete(id).await
    }
}
