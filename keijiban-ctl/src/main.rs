use anyhow::{anyhow, Context};
use keijiban_client::{
    api::PostId, render, Coordinator, HttpGateway, Notice, Refresh, Row, UiEvent,
};
use tracing_subscriber::EnvFilter;

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(
        short,
        long,
        env = "KEIJIBAN_HOST",
        default_value = "http://127.0.0.1:3000"
    )]
    host: String,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Show the board
    List,

    /// Create a new top-level post
    Post {
        content: String,

        /// Author name, anonymous if absent
        #[structopt(short, long)]
        name: Option<String>,
    },

    /// Reply to a top-level post
    Reply {
        to: i64,

        content: String,

        /// Author name, anonymous if absent
        #[structopt(short, long)]
        name: Option<String>,
    },

    /// Replace the content of a post
    Edit {
        id: i64,

        content: String,

        /// New author name, the current one is kept if absent
        #[structopt(short, long)]
        name: Option<String>,
    },

    /// Delete a post, its replies are hidden but not deleted
    Delete { id: i64 },
}

fn print_rows(rows: &[Row]) {
    for r in rows {
        let indent = "    ".repeat(usize::from(r.level));
        println!("{indent}{} {} ({})", r.post.id, r.author, r.posted_at);
        for line in r.post.content.lines() {
            println!("{indent}  {line}");
        }
    }
}

fn print_notices(notices: Vec<Notice>) {
    for n in notices {
        match n {
            Notice::Posted => eprintln!("Posted"),
            Notice::Updated(id) => eprintln!("Updated post {id}"),
            Notice::Deleted(id) => eprintln!("Deleted post {id}"),
            Notice::Failed(op, reason) => eprintln!("Failed {op:?}: {reason}"),
            Notice::RefreshFailed(reason) => eprintln!("Could not reload the board: {reason}"),
        }
    }
}

async fn load(c: &mut Coordinator<HttpGateway>) -> anyhow::Result<()> {
    match c.refresh().await {
        Refresh::Applied => Ok(()),
        _ => {
            let notices = c.board_mut().take_notices();
            Err(anyhow!("failed loading the board: {notices:?}"))
        }
    }
}

async fn run(c: &mut Coordinator<HttpGateway>, cmd: Command) -> anyhow::Result<()> {
    load(c).await?;
    tracing::debug!(posts = c.board().posts().len(), "loaded board");
    match cmd {
        Command::List => (),
        Command::Post { content, name } => {
            tracing::info!(?name, "creating post");
            c.create(content, name, None).await?;
        }
        Command::Reply { to, content, name } => {
            tracing::info!(to, ?name, "replying");
            let board = c.board_mut();
            board.dispatch(UiEvent::SelectReply(PostId(to)))?;
            board.compose_mut().content = content;
            board.compose_mut().author_name = name.unwrap_or_default();
            c.submit_compose().await?;
        }
        Command::Edit { id, content, name } => {
            tracing::info!(id, ?name, "editing post");
            let board = c.board_mut();
            board.dispatch(UiEvent::StartEdit(PostId(id)))?;
            board.dispatch(UiEvent::EditContent(content))?;
            if let Some(name) = name {
                board.dispatch(UiEvent::EditAuthorName(name))?;
            }
            if !c.save_edit().await? {
                return Err(anyhow!("post {id} was not open for editing"));
            }
        }
        Command::Delete { id } => {
            tracing::info!(id, "deleting post");
            c.delete(PostId(id)).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let mut c = Coordinator::new(HttpGateway::new(opt.host.clone()));

    let res = run(&mut c, opt.cmd)
        .await
        .with_context(|| format!("talking to {}", opt.host));
    print_notices(c.board_mut().take_notices());
    res?;
    print_rows(&render(c.board()));
    Ok(())
}
