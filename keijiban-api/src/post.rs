use std::fmt;

use crate::{Error, Time};

/// Name shown for posts whose author did not give one
pub const ANONYMOUS: &str = "anonymous";

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl PostId {
    pub fn stub() -> PostId {
        PostId(-1)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    /// Assigned by the store on creation
    pub id: PostId,

    pub content: String,

    #[serde(rename = "name", default)]
    pub author_name: Option<String>,

    /// Assigned by the store on creation
    pub created_at: Time,

    /// None for root posts
    #[serde(default)]
    pub parent_id: Option<PostId>,
}

impl Post {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn display_name(&self) -> &str {
        match self.author_name.as_deref().map(str::trim) {
            None | Some("") => ANONYMOUS,
            Some(name) => name,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewPost {
    pub content: String,

    #[serde(rename = "name", default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub parent_id: Option<PostId>,
}

impl NewPost {
    pub fn new(content: String, author_name: Option<String>, parent_id: Option<PostId>) -> NewPost {
        NewPost {
            content,
            author_name: crate::normalize_author_name(author_name),
            parent_id,
        }
    }

    // See comment on validation functions in lib.rs
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)?;
        if let Some(name) = &self.author_name {
            crate::validate_string(name)?;
        }
        Ok(())
    }

    pub fn into_post(self, id: PostId, created_at: Time) -> Post {
        Post {
            id,
            content: self.content,
            author_name: self.author_name,
            created_at,
            parent_id: self.parent_id,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PostEdit {
    pub content: String,

    #[serde(rename = "name", default)]
    pub author_name: Option<String>,
}

impl PostEdit {
    pub fn new(content: String, author_name: Option<String>) -> PostEdit {
        PostEdit {
            content,
            author_name: crate::normalize_author_name(author_name),
        }
    }

    // See comment on validation functions in lib.rs
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)?;
        if let Some(name) = &self.author_name {
            crate::validate_string(name)?;
        }
        Ok(())
    }

    pub fn apply_to(self, post: &mut Post) {
        post.content = self.content;
        post.author_name = self.author_name;
    }
}
