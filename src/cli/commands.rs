use tracing::debug;

use crate::app::{AppContext, Result, StrandError};
use crate::domain::Sort;
use crate::render::FeedItem;
use crate::timeline::{ViewIntent, ViewOptions};

pub async fn follow(ctx: &AppContext, url: &str) -> Result<()> {
    if ctx.store.follow_actor(url).await? {
        println!("Following {}", url);
    } else {
        println!("Already following {}", url);
    }
    Ok(())
}

pub async fn unfollow(ctx: &AppContext, url: &str) -> Result<()> {
    if !ctx.store.unfollow_actor(url).await? {
        return Err(StrandError::NotFound(url.to_string()));
    }
    println!("Unfollowed {}", url);
    Ok(())
}

pub async fn list_following(ctx: &AppContext) -> Result<()> {
    let followed = ctx.store.get_followed_actors().await?;

    if followed.is_empty() {
        println!("Not following anyone");
        return Ok(());
    }

    for actor in followed {
        println!("{}", actor.url);
    }
    Ok(())
}

pub async fn ingest(ctx: &AppContext) -> Result<()> {
    let report = ctx.coordinator.ensure_ready().await?;

    for (url, count) in &report.ingested {
        println!("  {} notes from {}", count, url);
    }
    for (url, message) in &report.failed {
        eprintln!("  Error ingesting {}: {}", url, message);
    }

    println!(
        "Ingest complete: {} notes, {} errors",
        report.total_notes(),
        report.failed.len()
    );
    Ok(())
}

pub async fn timeline(
    ctx: &AppContext,
    sort: Option<Sort>,
    limit: Option<usize>,
    pages: usize,
) -> Result<()> {
    let sort = sort.unwrap_or(ctx.config.timeline.sort);
    let mut timeline = ctx.timeline(sort, limit);

    timeline.open().await?;
    for _ in 1..pages {
        if !timeline.state().has_more_items {
            break;
        }
        timeline.apply(ViewIntent::RequestMore).await?;
    }

    if timeline.items().is_empty() {
        println!("No notes");
    }
    for item in timeline.items() {
        print_item(ctx, item).await;
    }

    let state = timeline.state();
    println!(
        "-- {} notes, sort={}{}",
        timeline.items().len(),
        state.sort,
        if state.has_more_items { ", more available" } else { "" }
    );

    timeline.teardown();
    Ok(())
}

pub async fn post(ctx: &AppContext, url: &str, replies: bool) -> Result<()> {
    let options = ViewOptions {
        show_replies: replies,
        ..ViewOptions::default()
    };
    let item = ctx.renderer().load(url, &options).await;
    print_item(ctx, &item).await;
    Ok(())
}

async fn print_item(ctx: &AppContext, item: &FeedItem) {
    if let Some(author) = item.as_post().and_then(|post| post.note.attributed_to.as_deref()) {
        match ctx.renderer().actor_card(author).await {
            Ok(Some(card)) => {
                let name = card.name.as_deref().unwrap_or(&card.id);
                println!("{} {}", name, card.handle.as_deref().unwrap_or_default());
            }
            Ok(None) => {}
            Err(e) => debug!("No actor card for {}: {}", author, e),
        }
    }
    println!("{}\n", item);
}
