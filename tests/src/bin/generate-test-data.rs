use chrono::{Duration, Utc};
use keijiban_api::{Post, PostId, Time};
use rand::{seq::SliceRandom, Rng};

const NUM_POSTS: usize = 200;
const REPLY_RATIO: f64 = 0.6;
// replies whose parent id was never handed out, as if the parent got deleted
const DANGLING_RATIO: f64 = 0.05;
const POST_WORD_COUNT: usize = 25;
const NAMES: &[&str] = &["taro", "hanako", "jiro", "sakura", "   "];

fn gen_n_items(table: &str, columns: &str, n: usize, mut f: impl FnMut(usize) -> String) {
    println!("INSERT INTO {} ({}) VALUES", table, columns);
    for i in 0..n {
        if i != 0 {
            println!(",");
        }
        print!("    {}", f(i));
    }
    println!();
    println!("ON CONFLICT DO NOTHING;");
}

fn sql_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn sql_opt_string(s: &Option<String>) -> String {
    s.as_deref().map(sql_string).unwrap_or_else(|| String::from("NULL"))
}

fn gen_post(rng: &mut impl Rng, id: i64, roots: &[PostId], created_at: Time) -> Post {
    let words = rng.gen_range(1..POST_WORD_COUNT);
    let author_name = match rng.gen_bool(0.3) {
        true => None,
        false => NAMES.choose(rng).map(|n| String::from(*n)),
    };
    let parent_id = if rng.gen_bool(DANGLING_RATIO) {
        Some(PostId(id + NUM_POSTS as i64 + rng.gen_range(1..1000)))
    } else if rng.gen_bool(REPLY_RATIO) {
        roots.choose(rng).copied()
    } else {
        None
    };
    Post {
        id: PostId(id),
        content: lipsum::lipsum_words(words),
        author_name,
        created_at,
        parent_id,
    }
}

fn main() {
    let mut rng = rand::thread_rng();
    let start = Utc::now() - Duration::days(30);

    let mut roots = Vec::new();
    let mut time = start;
    let posts = (1..=NUM_POSTS as i64)
        .map(|id| {
            time = time + Duration::seconds(rng.gen_range(1..3600));
            let post = gen_post(&mut rng, id, &roots, time);
            if post.is_root() {
                roots.push(post.id);
            }
            post
        })
        .collect::<Vec<_>>();

    gen_n_items(
        "posts",
        "id, content, name, created_at, parent_id",
        posts.len(),
        |i| {
            let p = &posts[i];
            format!(
                "({}, {}, {}, {}, {})",
                p.id.0,
                sql_string(&p.content),
                sql_opt_string(&p.author_name),
                sql_string(&p.created_at.to_rfc3339()),
                p.parent_id
                    .map(|id| id.0.to_string())
                    .unwrap_or_else(|| String::from("NULL")),
            )
        },
    );
}
