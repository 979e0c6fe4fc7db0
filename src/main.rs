use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use strand::app::AppContext;
use strand::cli::{commands, Cli, Commands};
use strand::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(cli.db, config)?;

    match cli.command {
        Commands::Follow { url } => commands::follow(&ctx, &url).await?,
        Commands::Unfollow { url } => commands::unfollow(&ctx, &url).await?,
        Commands::Following => commands::list_following(&ctx).await?,
        Commands::Ingest => commands::ingest(&ctx).await?,
        Commands::Timeline { sort, limit, pages } => {
            commands::timeline(&ctx, sort, limit, pages).await?
        }
        Commands::Post { url, replies } => commands::post(&ctx, &url, replies).await?,
    }

    Ok(())
}
