use std::collections::{HashSet, VecDeque};

use crate::{
    api::{GatewayError, NewPost, Post, PostEdit, PostId},
    build_tree, Error, Interaction, TreeNode, UiEvent,
};

/// A gateway call currently in flight. At most one of each can exist at any
/// given time.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PendingOp {
    Create,
    Update(PostId),
    Delete(PostId),
}

/// Compose form inputs
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Compose {
    pub content: String,
    pub author_name: String,
}

/// Transient user-facing notifications
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notice {
    Posted,
    Updated(PostId),
    Deleted(PostId),
    Failed(PendingOp, String),
    RefreshFailed(String),
}

/// What became of a finished refresh
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Refresh {
    Applied,
    /// A more recently issued refresh had already been applied
    Discarded,
    /// The previously displayed posts are kept
    Failed,
}

#[derive(Debug)]
pub struct CreateTicket {
    new_post: NewPost,
}

impl CreateTicket {
    pub fn new_post(&self) -> &NewPost {
        &self.new_post
    }
}

#[derive(Debug)]
pub struct UpdateTicket {
    id: PostId,
    edit: PostEdit,
}

impl UpdateTicket {
    pub fn id(&self) -> PostId {
        self.id
    }

    pub fn edit(&self) -> &PostEdit {
        &self.edit
    }
}

#[derive(Debug)]
pub struct DeleteTicket {
    id: PostId,
}

impl DeleteTicket {
    pub fn id(&self) -> PostId {
        self.id
    }
}

#[derive(Debug)]
pub struct RefreshTicket {
    generation: u64,
}

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Everything the board UI displays, owned by the event loop.
///
/// Gateway calls are split into a `begin_*` method, which validates the
/// request and marks it in flight, and a `finish_*` method consuming the
/// returned ticket along with the gateway result. Any number of these can be
/// interleaved.
#[derive(Debug, Default)]
pub struct Board {
    posts: Vec<Post>,
    tree: Vec<TreeNode>,
    compose: Compose,
    interaction: Interaction,
    pending: HashSet<PendingOp>,
    next_refresh: u64,
    applied_refresh: Option<u64>,
    notices: VecDeque<Notice>,
}

impl Board {
    pub fn new() -> Board {
        Board::default()
    }

    /// Posts as last fetched, in store order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn tree(&self) -> &[TreeNode] {
        &self.tree
    }

    pub fn compose(&self) -> &Compose {
        &self.compose
    }

    pub fn compose_mut(&mut self) -> &mut Compose {
        &mut self.compose
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn is_pending(&self, op: PendingOp) -> bool {
        self.pending.contains(&op)
    }

    /// Whether at least one refresh has been applied since startup
    pub fn is_loaded(&self) -> bool {
        self.applied_refresh.is_some()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn dispatch(&mut self, event: UiEvent) -> Result<(), Error> {
        self.interaction = self.interaction.apply(event, &self.posts)?;
        Ok(())
    }

    fn mark_pending(&mut self, op: PendingOp) -> Result<(), Error> {
        if !self.pending.insert(op) {
            tracing::debug!(?op, "refusing duplicate submission");
            return Err(Error::AlreadyPending(op));
        }
        Ok(())
    }

    fn fail(&mut self, op: PendingOp, err: GatewayError) -> Error {
        tracing::error!(?op, error = %err, "gateway call failed");
        self.notices.push_back(Notice::Failed(op, err.to_string()));
        Error::Persistence(err)
    }

    pub fn begin_create(
        &mut self,
        content: String,
        author_name: Option<String>,
        reply_to: Option<PostId>,
    ) -> Result<CreateTicket, Error> {
        let new_post = NewPost::new(content, author_name, reply_to);
        new_post.validate()?;
        if let Some(target) = reply_to {
            let parent = self
                .posts
                .iter()
                .find(|p| p.id == target)
                .ok_or(Error::NotFound(target))?;
            if !parent.is_root() {
                return Err(Error::InvalidReplyTarget(target));
            }
        }
        self.mark_pending(PendingOp::Create)?;
        tracing::debug!(?new_post, "submitting new post");
        Ok(CreateTicket { new_post })
    }

    pub fn finish_create(
        &mut self,
        ticket: CreateTicket,
        res: Result<(), GatewayError>,
    ) -> Result<(), Error> {
        self.pending.remove(&PendingOp::Create);
        if let Err(e) = res {
            return Err(self.fail(PendingOp::Create, e));
        }
        tracing::info!(reply_to = ?ticket.new_post.parent_id, "created post");
        self.compose = Compose::default();
        self.dispatch(UiEvent::PostCreated)?;
        self.notices.push_back(Notice::Posted);
        Ok(())
    }

    pub fn begin_update(
        &mut self,
        id: PostId,
        content: String,
        author_name: Option<String>,
    ) -> Result<UpdateTicket, Error> {
        let edit = PostEdit::new(content, author_name);
        edit.validate()?;
        self.mark_pending(PendingOp::Update(id))?;
        tracing::debug!(?id, ?edit, "submitting post edit");
        Ok(UpdateTicket { id, edit })
    }

    pub fn finish_update(
        &mut self,
        ticket: UpdateTicket,
        res: Result<(), GatewayError>,
    ) -> Result<(), Error> {
        let id = ticket.id;
        self.pending.remove(&PendingOp::Update(id));
        if let Err(e) = res {
            return Err(self.fail(PendingOp::Update(id), e));
        }
        tracing::info!(?id, "updated post");
        self.dispatch(UiEvent::EditSaved(id))?;
        self.notices.push_back(Notice::Updated(id));
        Ok(())
    }

    pub fn begin_delete(&mut self, id: PostId) -> Result<DeleteTicket, Error> {
        self.mark_pending(PendingOp::Delete(id))?;
        tracing::debug!(?id, "submitting post deletion");
        Ok(DeleteTicket { id })
    }

    pub fn finish_delete(
        &mut self,
        ticket: DeleteTicket,
        res: Result<(), GatewayError>,
    ) -> Result<(), Error> {
        let id = ticket.id;
        self.pending.remove(&PendingOp::Delete(id));
        if let Err(e) = res {
            return Err(self.fail(PendingOp::Delete(id), e));
        }
        tracing::info!(?id, "deleted post");
        self.dispatch(UiEvent::PostDeleted(id))?;
        self.notices.push_back(Notice::Deleted(id));
        Ok(())
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        let generation = self.next_refresh;
        self.next_refresh += 1;
        RefreshTicket { generation }
    }

    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        res: Result<Vec<Post>, GatewayError>,
    ) -> Refresh {
        let generation = ticket.generation;
        if self.applied_refresh.map_or(false, |a| generation < a) {
            tracing::warn!(
                generation,
                applied = ?self.applied_refresh,
                "discarding refresh result older than the displayed one"
            );
            return Refresh::Discarded;
        }
        match res {
            Err(e) => {
                tracing::error!(generation, error = %e, "failed refreshing posts");
                self.notices.push_back(Notice::RefreshFailed(e.to_string()));
                Refresh::Failed
            }
            Ok(posts) => {
                tracing::debug!(generation, num_posts = posts.len(), "applying refresh");
                self.tree = build_tree(&posts);
                self.posts = posts;
                self.applied_refresh = Some(generation);
                self.interaction = self.interaction.forget_missing(&self.posts);
                Refresh::Applied
            }
        }
    }
}
