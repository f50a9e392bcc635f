use chrono::{Duration, TimeZone, Utc};

use crate::api::{Post, PostId, Time};

pub fn at(t: i64) -> Time {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(t)
}

pub fn post(id: i64, t: i64, parent: Option<i64>) -> Post {
    Post {
        id: PostId(id),
        content: format!("post {id}"),
        author_name: None,
        created_at: at(t),
        parent_id: parent.map(PostId),
    }
}

pub fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|p| p.id.0).collect()
}
