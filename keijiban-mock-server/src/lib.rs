use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use keijiban_api::{Error, Gateway, GatewayError, NewPost, Post, PostEdit, PostId, Time};
use parking_lot::Mutex;

/// In-memory post store behaving like keijiban-server, for tests
pub struct MockServer(Mutex<Store>);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Op {
    List,
    Insert,
    Update,
    Delete,
}

#[derive(Debug)]
struct Store {
    posts: BTreeMap<PostId, Post>,
    // ids are never reused, even after a delete
    next_id: i64,
    clock: Time,
    injected_failures: HashMap<Op, usize>,
    calls: HashMap<Op, usize>,
}

impl Store {
    fn tick(&mut self) -> Time {
        self.clock = self.clock + Duration::seconds(1);
        self.clock
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer(Mutex::new(Store {
            posts: BTreeMap::new(),
            next_id: 1,
            clock: Utc::now(),
            injected_failures: HashMap::new(),
            calls: HashMap::new(),
        }))
    }

    /// Seed the store with already-existing posts, keeping their ids and dates
    pub fn with_posts(posts: Vec<Post>) -> MockServer {
        let this = MockServer::new();
        {
            let mut s = this.0.lock();
            for p in posts {
                s.next_id = std::cmp::max(s.next_id, p.id.0 + 1);
                s.clock = std::cmp::max(s.clock, p.created_at);
                s.posts.insert(p.id, p);
            }
        }
        this
    }

    /// Make the next `count` gateway calls of kind `op` fail as if the network was down
    pub fn fail_next(&self, op: Op, count: usize) {
        *self.0.lock().injected_failures.entry(op).or_insert(0) += count;
    }

    /// Number of gateway calls of kind `op` received so far, failed ones included
    pub fn calls(&self, op: Op) -> usize {
        self.0.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn test_num_posts(&self) -> usize {
        self.0.lock().posts.len()
    }

    pub fn test_get_post(&self, id: PostId) -> Option<Post> {
        self.0.lock().posts.get(&id).cloned()
    }

    /// Newest first, so that callers cannot get away with not sorting
    pub fn list_posts(&self) -> Vec<Post> {
        self.0.lock().posts.values().rev().cloned().collect()
    }

    pub fn create_post(&self, p: NewPost) -> Result<Post, Error> {
        p.validate()?;
        let p = NewPost::new(p.content, p.author_name, p.parent_id);
        let mut s = self.0.lock();
        let id = PostId(s.next_id);
        s.next_id += 1;
        let created_at = s.tick();
        let post = p.into_post(id, created_at);
        s.posts.insert(id, post.clone());
        Ok(post)
    }

    pub fn update_post(&self, id: PostId, edit: PostEdit) -> Result<(), Error> {
        edit.validate()?;
        let edit = PostEdit::new(edit.content, edit.author_name);
        match self.0.lock().posts.get_mut(&id) {
            None => Err(Error::PostNotFound(id)),
            Some(post) => {
                edit.apply_to(post);
                Ok(())
            }
        }
    }

    /// Replies are left in place, pointing at a parent that no longer exists
    pub fn delete_post(&self, id: PostId) -> Result<(), Error> {
        self.0.lock().posts.remove(&id);
        Ok(())
    }

    fn record_call(&self, op: Op) -> Result<(), GatewayError> {
        let mut s = self.0.lock();
        *s.calls.entry(op).or_insert(0) += 1;
        if let Some(remaining) = s.injected_failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                tracing::debug!(?op, "mock server injecting failure");
                return Err(GatewayError::Transport(anyhow!(
                    "mock server: injected {op:?} failure"
                )));
            }
        }
        Ok(())
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

#[async_trait]
impl Gateway for MockServer {
    async fn list(&self) -> Result<Vec<Post>, GatewayError> {
        self.record_call(Op::List)?;
        Ok(self.list_posts())
    }

    async fn insert(&self, post: NewPost) -> Result<(), GatewayError> {
        self.record_call(Op::Insert)?;
        self.create_post(post)?;
        Ok(())
    }

    async fn update(&self, id: PostId, edit: PostEdit) -> Result<(), GatewayError> {
        self.record_call(Op::Update)?;
        Ok(self.update_post(id, edit)?)
    }

    async fn delete(&self, id: PostId) -> Result<(), GatewayError> {
        self.record_call(Op::Delete)?;
        Ok(self.delete_post(id)?)
    }
}
