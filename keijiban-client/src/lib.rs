mod board;
pub use board::{
    Board, Compose, CreateTicket, DeleteTicket, Notice, PendingOp, Refresh, RefreshTicket,
    UpdateTicket,
};

mod coordinator;
pub use coordinator::Coordinator;

mod error;
pub use error::Error;

mod http;
pub use http::HttpGateway;

mod render;
pub use render::{render, render_compose, Actions, ComposeView, Row};

mod state;
pub use state::{EditSession, Interaction, UiEvent};

mod tree;
pub use tree::{build_tree, TreeNode};

#[cfg(test)]
mod fixtures;

pub mod api {
    pub use keijiban_api::*;
}
