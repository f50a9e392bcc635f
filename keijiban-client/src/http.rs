use anyhow::Context;
use async_trait::async_trait;

use crate::api::{self, Gateway, GatewayError, NewPost, Post, PostEdit, PostId};

/// Gateway talking to a keijiban-server over HTTP
#[derive(Clone, Debug)]
pub struct HttpGateway {
    host: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(host: String) -> HttpGateway {
        HttpGateway {
            host: String::from(host.trim_end_matches('/')),
            client: reqwest::Client::new(),
        }
    }

    fn posts_url(&self) -> String {
        format!("{}/api/posts", self.host)
    }

    fn post_url(&self, id: PostId) -> String {
        format!("{}/api/posts/{}", self.host, id.0)
    }
}

/// Turns non-success answers into the error the server reported
async fn check(res: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res
        .bytes()
        .await
        .with_context(|| format!("reading body of {status} answer"))?;
    let err = api::Error::parse(&body)
        .with_context(|| format!("parsing body of {status} answer"))?;
    Err(GatewayError::Api(err))
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list(&self) -> Result<Vec<Post>, GatewayError> {
        let res = self
            .client
            .get(self.posts_url())
            .send()
            .await
            .context("sending list request")?;
        Ok(check(res)
            .await?
            .json()
            .await
            .context("parsing post list")?)
    }

    async fn insert(&self, post: NewPost) -> Result<(), GatewayError> {
        let res = self
            .client
            .post(self.posts_url())
            .json(&post)
            .send()
            .await
            .context("sending insert request")?;
        let created: Post = check(res)
            .await?
            .json()
            .await
            .context("parsing created post")?;
        tracing::debug!(id = ?created.id, "server created post");
        Ok(())
    }

    async fn update(&self, id: PostId, edit: PostEdit) -> Result<(), GatewayError> {
        let res = self
            .client
            .put(self.post_url(id))
            .json(&edit)
            .send()
            .await
            .context("sending update request")?;
        check(res).await?;
        Ok(())
    }

    async fn delete(&self, id: PostId) -> Result<(), GatewayError> {
        let res = self
            .client
            .delete(self.post_url(id))
            .send()
            .await
            .context("sending delete request")?;
        check(res).await?;
        Ok(())
    }
}
