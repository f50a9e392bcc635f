use crate::{
    api::{Post, PostId},
    Error,
};

/// Edit buffer for the single post currently in edit mode
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EditSession {
    pub post_id: PostId,
    pub content: String,
    pub author_name: String,
}

/// Reply-target and edit-mode axes. They are independent: a reply can be
/// pending on one post while another one is being edited.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Interaction {
    pub reply_target: Option<PostId>,
    pub editing: Option<EditSession>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UiEvent {
    SelectReply(PostId),
    CancelReply,

    StartEdit(PostId),
    EditContent(String),
    EditAuthorName(String),
    CancelEdit,

    // Outcomes of gateway calls
    PostCreated,
    EditSaved(PostId),
    PostDeleted(PostId),
    Refreshed,
}

impl Interaction {
    pub fn is_editing(&self, id: PostId) -> bool {
        self.editing.as_ref().map(|e| e.post_id) == Some(id)
    }

    /// Computes the state following `event`, `posts` being the post list
    /// currently on display. On error, the current state is left as-is.
    pub fn apply(&self, event: UiEvent, posts: &[Post]) -> Result<Interaction, Error> {
        let find = |id: PostId| posts.iter().find(|p| p.id == id).ok_or(Error::NotFound(id));
        let mut next = self.clone();
        match event {
            UiEvent::SelectReply(id) => {
                if !find(id)?.is_root() {
                    tracing::warn!(?id, "attempted replying to a reply");
                    return Err(Error::InvalidReplyTarget(id));
                }
                next.reply_target = Some(id);
            }
            UiEvent::CancelReply => next.reply_target = None,
            UiEvent::StartEdit(id) => {
                let post = find(id)?;
                // any other edit session is dropped without saving
                next.editing = Some(EditSession {
                    post_id: id,
                    content: post.content.clone(),
                    author_name: post.author_name.clone().unwrap_or_default(),
                });
            }
            UiEvent::EditContent(content) => match &mut next.editing {
                Some(e) => e.content = content,
                None => tracing::debug!("ignoring edit buffer change outside of edit mode"),
            },
            UiEvent::EditAuthorName(name) => match &mut next.editing {
                Some(e) => e.author_name = name,
                None => tracing::debug!("ignoring edit buffer change outside of edit mode"),
            },
            UiEvent::CancelEdit => next.editing = None,
            UiEvent::PostCreated => next.reply_target = None,
            UiEvent::EditSaved(id) => {
                if next.is_editing(id) {
                    next.editing = None;
                }
            }
            UiEvent::PostDeleted(id) => next.forget(id),
            UiEvent::Refreshed => next = self.forget_missing(posts),
        }
        tracing::trace!(from = ?self, to = ?next, "interaction state transition");
        Ok(next)
    }

    /// Drops references to posts that are not in `posts` anymore, eg. because
    /// another client deleted them
    pub fn forget_missing(&self, posts: &[Post]) -> Interaction {
        let mut next = self.clone();
        for id in self.referenced_ids() {
            if !posts.iter().any(|p| p.id == id) {
                next.forget(id);
            }
        }
        next
    }

    fn referenced_ids(&self) -> Vec<PostId> {
        self.reply_target
            .into_iter()
            .chain(self.editing.as_ref().map(|e| e.post_id))
            .collect()
    }

    fn forget(&mut self, id: PostId) {
        if self.reply_target == Some(id) {
            self.reply_target = None;
        }
        if self.is_editing(id) {
            self.editing = None;
        }
    }
}
