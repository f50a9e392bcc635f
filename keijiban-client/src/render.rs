use chrono::Local;

use crate::{
    api::{Post, PostId, Time},
    Board, EditSession, PendingOp,
};

/// Which post controls are usable on a row
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Actions {
    pub reply: bool,
    pub edit: bool,
    pub delete: bool,
    /// Only set on the row being edited
    pub save: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    pub post: Post,
    /// 0 for root posts, 1 for replies
    pub level: u8,
    pub author: String,
    pub posted_at: String,
    pub is_reply_target: bool,
    pub editing: Option<EditSession>,
    pub actions: Actions,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComposeView {
    pub reply_target: Option<PostId>,
    /// Display name of the reply target's author
    pub replying_to: Option<String>,
    pub submit_enabled: bool,
}

/// Flattens the board tree into display rows, each root followed by its replies
pub fn render(board: &Board) -> Vec<Row> {
    board
        .tree()
        .iter()
        .flat_map(|n| {
            std::iter::once(row(board, &n.post, 0))
                .chain(n.children.iter().map(|c| row(board, c, 1)))
        })
        .collect()
}

fn row(board: &Board, post: &Post, level: u8) -> Row {
    let interaction = board.interaction();
    let editing = interaction
        .editing
        .as_ref()
        .filter(|e| e.post_id == post.id)
        .cloned();
    let deleting = board.is_pending(PendingOp::Delete(post.id));
    let updating = board.is_pending(PendingOp::Update(post.id));
    let actions = Actions {
        reply: post.is_root() && !deleting,
        edit: !deleting && !updating,
        delete: !deleting,
        save: editing
            .as_ref()
            .map_or(false, |e| !updating && !e.content.trim().is_empty()),
    };
    Row {
        post: post.clone(),
        level,
        author: String::from(post.display_name()),
        posted_at: format_time(post.created_at),
        is_reply_target: interaction.reply_target == Some(post.id),
        editing,
        actions,
    }
}

/// Shown in the viewer's timezone
fn format_time(t: Time) -> String {
    t.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub fn render_compose(board: &Board) -> ComposeView {
    let reply_target = board.interaction().reply_target;
    let replying_to = reply_target.and_then(|id| {
        board
            .posts()
            .iter()
            .find(|p| p.id == id)
            .map(|p| String::from(p.display_name()))
    });
    ComposeView {
        reply_target,
        replying_to,
        submit_enabled: !board.is_pending(PendingOp::Create)
            && !board.compose().content.trim().is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures::post, UiEvent};

    fn board() -> Board {
        let mut b = Board::new();
        let mut root = post(1, 10, None);
        root.author_name = Some(String::from("taro"));
        let t = b.begin_refresh();
        b.finish_refresh(
            t,
            Ok(vec![
                post(4, 40, Some(1)),
                post(2, 20, None),
                root,
                post(3, 30, Some(1)),
                post(5, 50, Some(99)),
            ]),
        );
        b
    }

    #[test]
    fn rows_follow_tree_order() {
        let rows = render(&board());
        let shape = rows
            .iter()
            .map(|r| (r.post.id.0, r.level))
            .collect::<Vec<_>>();
        assert_eq!(shape, vec![(1, 0), (3, 1), (4, 1), (2, 0)]);
        assert_eq!(rows[0].author, "taro");
        assert_eq!(rows[1].author, crate::api::ANONYMOUS);
        let local = crate::fixtures::at(10).with_timezone(&Local);
        assert_eq!(rows[0].posted_at, local.format("%Y-%m-%d %H:%M:%S").to_string());
    }

    #[test]
    fn times_are_shown_in_local_time() {
        let t = crate::fixtures::at(3600 * 7);
        let expected = t
            .with_timezone(&Local)
            .naive_local()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(format_time(t), expected);
    }

    #[test]
    fn reply_only_offered_on_roots() {
        let rows = render(&board());
        assert!(rows.iter().all(|r| r.actions.reply == (r.level == 0)));
        assert!(rows.iter().all(|r| r.actions.edit && r.actions.delete));
        assert!(rows.iter().all(|r| !r.actions.save));
    }

    #[test]
    fn markers_follow_interaction_state() {
        let mut b = board();
        b.dispatch(UiEvent::SelectReply(PostId(2))).unwrap();
        b.dispatch(UiEvent::StartEdit(PostId(3))).unwrap();
        let rows = render(&b);
        let flagged = |f: fn(&Row) -> bool| {
            rows.iter()
                .filter(|r| f(r))
                .map(|r| r.post.id.0)
                .collect::<Vec<_>>()
        };
        assert_eq!(flagged(|r| r.is_reply_target), vec![2]);
        assert_eq!(flagged(|r| r.editing.is_some()), vec![3]);
        assert_eq!(flagged(|r| r.actions.save), vec![3]);

        b.dispatch(UiEvent::EditContent(String::from(" "))).unwrap();
        assert!(render(&b).iter().all(|r| !r.actions.save));

        let view = render_compose(&b);
        assert_eq!(view.reply_target, Some(PostId(2)));
        assert_eq!(view.replying_to.as_deref(), Some(crate::api::ANONYMOUS));
    }

    #[test]
    fn pending_ops_disable_controls() {
        let mut b = board();
        b.dispatch(UiEvent::StartEdit(PostId(1))).unwrap();
        let _u = b.begin_update(PostId(1), String::from("x"), None).unwrap();
        let _d = b.begin_delete(PostId(2)).unwrap();
        let rows = render(&b);
        let r1 = rows.iter().find(|r| r.post.id == PostId(1)).unwrap();
        assert_eq!(
            r1.actions,
            Actions {
                reply: true,
                edit: false,
                delete: true,
                save: false,
            }
        );
        let r2 = rows.iter().find(|r| r.post.id == PostId(2)).unwrap();
        assert_eq!(r2.actions, Actions::default());
    }

    #[test]
    fn compose_submit_gating() {
        let mut b = board();
        assert!(!render_compose(&b).submit_enabled);
        b.compose_mut().content = String::from("hi");
        assert!(render_compose(&b).submit_enabled);
        let _t = b.begin_create(String::from("hi"), None, None).unwrap();
        assert!(!render_compose(&b).submit_enabled);
    }
}
