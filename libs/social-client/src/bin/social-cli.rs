use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use social_client::{ApiClient, ClientConfig, FileStore, LoadOutcome, NewPost, Session};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SESSION_FILE: &str = ".social-session.json";

fn usage() {
    eprintln!("Usage:");
    eprintln!("  social-cli login <email> <password>");
    eprintln!("  social-cli logout");
    eprintln!("  social-cli whoami");
    eprintln!("  social-cli feed [pages]");
    eprintln!("  social-cli notifications");
    eprintln!("  social-cli post <content>");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,social_client=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output stays pipeable
    if env::var("SOCIAL_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    let session_file = config
        .session_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
    let session = Session::restore(Arc::new(FileStore::new(&session_file)))
        .with_context(|| format!("Failed to read session from {}", session_file.display()))?;
    let client = ApiClient::new(config, session)?;

    match args[1].as_str() {
        "login" if args.len() == 4 => {
            let response = client.login(&args[2], &args[3]).await?;
            let name = response
                .user
                .as_ref()
                .map(|u| u.username.clone())
                .or_else(|| client.session().user_id())
                .unwrap_or_else(|| "unknown user".to_string());
            println!("Signed in as {}", name);
        }
        "logout" if args.len() == 2 => {
            if let Err(e) = client.logout().await {
                eprintln!("Server logout failed ({}); local session cleared", e.user_message());
            } else {
                println!("Signed out");
            }
        }
        "whoami" if args.len() == 2 => {
            let Some(user_id) = client.session().user_id() else {
                bail!("Not signed in");
            };
            let profile = client.get_user(&user_id).await?;
            println!(
                "{} (@{}) id={}",
                profile.summary().display_name(),
                profile.username,
                profile.id
            );
            if client.session().is_expired() {
                println!("Warning: the access token has expired");
            }
        }
        "feed" if args.len() <= 3 => {
            let pages: usize = match args.get(2) {
                Some(n) => n.parse().context("pages must be a number")?,
                None => 1,
            };
            let feed = client.feed();
            for _ in 0..pages {
                match feed.load_more().await? {
                    LoadOutcome::Loaded { has_more: false, .. } | LoadOutcome::Skipped(_) => break,
                    _ => {}
                }
            }
            feed.with_items(|posts| {
                for post in posts {
                    let author = post
                        .author
                        .as_ref()
                        .map(|a| a.display_name().to_string())
                        .unwrap_or_else(|| post.author_id.clone());
                    println!(
                        "[{}] {}: {} ({} reactions, {} comments)",
                        post.created_at.format("%Y-%m-%d %H:%M"),
                        author,
                        post.content,
                        post.reactions.total(),
                        post.comment_count
                    );
                }
            });
            info!(count = feed.len(), more = feed.has_more(), "Feed printed");
        }
        "notifications" if args.len() == 2 => {
            let notifications = client.notifications();
            notifications.load_more().await?;
            notifications.with_items(|items| {
                for n in items {
                    let marker = if n.is_read { " " } else { "*" };
                    let actor = n.actor.as_ref().map(|a| a.display_name()).unwrap_or("someone");
                    println!(
                        "{} {:?} from {}: {}",
                        marker,
                        n.kind,
                        actor,
                        n.message.as_deref().unwrap_or("")
                    );
                }
            });
        }
        "post" if args.len() >= 3 => {
            let content = args[2..].join(" ");
            let post = client.create_post(&NewPost::text(content)).await?;
            println!("Created post {}", post.id);
        }
        _ => {
            usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
