use crate::{
    api::{Gateway, PostId},
    Board, Error, Refresh,
};

/// Drives a [`Board`] against a [`Gateway`], one call at a time.
///
/// Every successful mutation is followed by a full refresh: the displayed
/// tree is only ever built from what the store returned.
pub struct Coordinator<G> {
    gateway: G,
    board: Board,
}

impl<G: Gateway> Coordinator<G> {
    pub fn new(gateway: G) -> Coordinator<G> {
        Coordinator {
            gateway,
            board: Board::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn refresh(&mut self) -> Refresh {
        let ticket = self.board.begin_refresh();
        tracing::debug!(generation = ticket.generation(), "listing posts");
        let res = self.gateway.list().await;
        self.board.finish_refresh(ticket, res)
    }

    pub async fn create(
        &mut self,
        content: String,
        author_name: Option<String>,
        reply_to: Option<PostId>,
    ) -> Result<(), Error> {
        let ticket = self.board.begin_create(content, author_name, reply_to)?;
        let res = self.gateway.insert(ticket.new_post().clone()).await;
        self.board.finish_create(ticket, res)?;
        self.refresh().await;
        Ok(())
    }

    /// Submits the compose form, as a reply to the current reply target if any
    pub async fn submit_compose(&mut self) -> Result<(), Error> {
        let compose = self.board.compose().clone();
        let reply_to = self.board.interaction().reply_target;
        self.create(compose.content, Some(compose.author_name), reply_to)
            .await
    }

    pub async fn update(
        &mut self,
        id: PostId,
        content: String,
        author_name: Option<String>,
    ) -> Result<(), Error> {
        let ticket = self.board.begin_update(id, content, author_name)?;
        let res = self
            .gateway
            .update(ticket.id(), ticket.edit().clone())
            .await;
        self.board.finish_update(ticket, res)?;
        self.refresh().await;
        Ok(())
    }

    /// Saves the edit session. Returns `false` if no post was being edited.
    pub async fn save_edit(&mut self) -> Result<bool, Error> {
        let session = match self.board.interaction().editing.clone() {
            Some(s) => s,
            None => {
                tracing::debug!("no edit session to save");
                return Ok(false);
            }
        };
        self.update(session.post_id, session.content, Some(session.author_name))
            .await?;
        Ok(true)
    }

    pub async fn delete(&mut self, id: PostId) -> Result<(), Error> {
        let ticket = self.board.begin_delete(id)?;
        let res = self.gateway.delete(ticket.id()).await;
        self.board.finish_delete(ticket, res)?;
        self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use keijiban_mock_server::{MockServer, Op};

    use super::*;
    use crate::{
        api::{GatewayError, Post},
        build_tree,
        fixtures::{ids, post},
        Notice, PendingOp, UiEvent,
    };

    async fn loaded(posts: Vec<Post>) -> Coordinator<MockServer> {
        let mut c = Coordinator::new(MockServer::with_posts(posts));
        assert_eq!(c.refresh().await, Refresh::Applied);
        c
    }

    fn shape(c: &Coordinator<MockServer>) -> Vec<(i64, Vec<i64>)> {
        c.board()
            .tree()
            .iter()
            .map(|n| (n.post.id.0, ids(&n.children)))
            .collect()
    }

    /// The displayed tree must be exactly the one built from the store
    fn assert_synced(c: &Coordinator<MockServer>) {
        assert_eq!(c.board().tree(), &build_tree(&c.gateway().list_posts())[..]);
    }

    #[tokio::test]
    async fn blank_content_issues_no_gateway_call() {
        let mut c = loaded(vec![post(1, 10, None)]).await;
        let err = c.create(String::from("   "), None, None).await.unwrap_err();
        assert!(err.is_validation());
        let err = c
            .update(PostId(1), String::from("  "), None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(c.gateway().calls(Op::Insert), 0);
        assert_eq!(c.gateway().calls(Op::Update), 0);
        assert_eq!(c.gateway().calls(Op::List), 1);
    }

    #[tokio::test]
    async fn board_scenario() {
        let mut c = loaded(vec![post(1, 1, None), post(2, 2, None), post(3, 3, Some(1))]).await;
        assert_eq!(shape(&c), vec![(1, vec![3]), (2, vec![])]);

        c.delete(PostId(1)).await.unwrap();
        assert_eq!(shape(&c), vec![(2, vec![])]);
        // the reply is still stored, pointing at the deleted root
        assert_eq!(c.gateway().test_num_posts(), 2);
        assert_synced(&c);
    }

    #[tokio::test]
    async fn reply_through_compose_form() {
        let mut c = loaded(vec![post(1, 10, None)]).await;
        c.board_mut().dispatch(UiEvent::SelectReply(PostId(1))).unwrap();
        c.board_mut().compose_mut().content = String::from("a reply");
        c.board_mut().compose_mut().author_name = String::from("   ");
        c.submit_compose().await.unwrap();

        let tree = c.board().tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
        let reply = &tree[0].children[0];
        assert_eq!(reply.content, "a reply");
        assert_eq!(reply.author_name, None);
        assert_eq!(c.board().interaction().reply_target, None);
        assert_eq!(c.board().compose().content, "");
        assert_synced(&c);
    }

    #[tokio::test]
    async fn create_failure_keeps_inputs_and_tree() {
        let mut c = loaded(vec![post(1, 10, None)]).await;
        c.board_mut().compose_mut().content = String::from("hello");
        c.board_mut().compose_mut().author_name = String::from("taro");
        c.board_mut().take_notices();
        c.gateway().fail_next(Op::Insert, 1);

        let err = c.submit_compose().await.unwrap_err();
        assert!(matches!(err, Error::Persistence(GatewayError::Transport(_))));
        assert_eq!(c.board().compose().content, "hello");
        assert_eq!(c.board().compose().author_name, "taro");
        assert_eq!(shape(&c), vec![(1, vec![])]);
        // no refresh after a failed mutation
        assert_eq!(c.gateway().calls(Op::List), 1);
        assert!(matches!(
            &c.board_mut().take_notices()[..],
            [Notice::Failed(PendingOp::Create, _)]
        ));

        c.submit_compose().await.unwrap();
        assert_eq!(shape(&c), vec![(1, vec![]), (2, vec![])]);
        assert_eq!(c.board_mut().take_notices(), vec![Notice::Posted]);
    }

    #[tokio::test]
    async fn edit_session_round_trip() {
        let mut c = loaded(vec![post(1, 10, None)]).await;
        c.board_mut().dispatch(UiEvent::StartEdit(PostId(1))).unwrap();
        c.board_mut()
            .dispatch(UiEvent::EditContent(String::from("edited")))
            .unwrap();
        c.board_mut()
            .dispatch(UiEvent::EditAuthorName(String::from("hanako")))
            .unwrap();

        c.gateway().fail_next(Op::Update, 1);
        assert!(c.save_edit().await.unwrap_err().is_persistence());
        assert!(c.board().interaction().is_editing(PostId(1)));
        assert_eq!(c.board().tree()[0].post.content, "post 1");

        assert!(c.save_edit().await.unwrap());
        assert_eq!(c.board().interaction().editing, None);
        let p = &c.board().tree()[0].post;
        assert_eq!(p.content, "edited");
        assert_eq!(p.display_name(), "hanako");
        assert_synced(&c);

        // nothing left to save
        assert!(!c.save_edit().await.unwrap());
        assert_eq!(c.gateway().calls(Op::Update), 2);
    }

    #[tokio::test]
    async fn updating_a_post_deleted_elsewhere() {
        let mut c = loaded(vec![post(1, 10, None)]).await;
        c.gateway().delete_post(PostId(1)).unwrap();
        let err = c
            .update(PostId(1), String::from("too late"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Persistence(GatewayError::Api(keijiban_api::Error::PostNotFound(PostId(1))))
        ));
    }

    #[tokio::test]
    async fn failed_refresh_after_mutation_keeps_old_tree() {
        let mut c = loaded(vec![post(1, 10, None)]).await;
        c.gateway().fail_next(Op::List, 1);
        // the mutation itself went through
        c.delete(PostId(1)).await.unwrap();
        assert_eq!(shape(&c), vec![(1, vec![])]);
        assert_eq!(c.gateway().test_num_posts(), 0);
        assert!(c
            .board_mut()
            .take_notices()
            .iter()
            .any(|n| matches!(n, Notice::RefreshFailed(_))));

        assert_eq!(c.refresh().await, Refresh::Applied);
        assert!(c.board().tree().is_empty());
    }

    #[tokio::test]
    async fn other_clients_changes_show_up_on_refresh() {
        let store = Arc::new(MockServer::new());
        let mut a = Coordinator::new(store.clone());
        let mut b = Coordinator::new(store.clone());
        a.refresh().await;
        b.refresh().await;

        a.create(String::from("from a"), None, None).await.unwrap();
        assert!(b.board().tree().is_empty());
        b.refresh().await;
        let root = b.board().tree()[0].post.id;
        b.board_mut().dispatch(UiEvent::SelectReply(root)).unwrap();
        b.board_mut().compose_mut().content = String::from("from b");
        b.submit_compose().await.unwrap();

        // a only learns about the reply by refreshing
        assert!(a.board().tree()[0].children.is_empty());
        a.refresh().await;
        assert_eq!(a.board().tree()[0].children[0].content, "from b");

        b.board_mut().dispatch(UiEvent::SelectReply(root)).unwrap();
        a.delete(root).await.unwrap();
        assert!(a.board().tree().is_empty());
        assert_eq!(b.board().interaction().reply_target, Some(root));
        b.refresh().await;
        assert!(b.board().tree().is_empty());
        assert_eq!(b.board().interaction().reply_target, None);
        assert_eq!(a.board().tree(), b.board().tree());
        assert_eq!(store.test_num_posts(), 1);
    }
}
