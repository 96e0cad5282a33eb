use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pricewatch::app::AppContext;
use pricewatch::cli::{commands, Cli, Commands};
use pricewatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Commands::Open { id } = &cli.command {
        commands::open(id)?;
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(kind) = cli.loader {
        config.loader.kind = kind;
    }
    let ctx = AppContext::new(cli.db, config)?;

    match cli.command {
        Commands::Track { url } => {
            commands::track(&ctx, &url).await?;
        }
        Commands::Toggle { url, name, price } => {
            commands::toggle(&ctx, &url, &name, price)?;
        }
        Commands::Visit { url } => {
            commands::visit(&ctx, &url).await?;
        }
        Commands::Search { query, limit } => {
            commands::search(&ctx, &query, limit).await?;
        }
        Commands::List => {
            commands::list(&ctx)?;
        }
        Commands::Show { url, days } => {
            commands::show(&ctx, &url, days)?;
        }
        Commands::Alert {
            url,
            below,
            above,
            clear,
        } => {
            commands::set_alert(&ctx, &url, below, above, clear)?;
        }
        Commands::Check => {
            commands::check(&ctx).await?;
        }
        Commands::Watch {
            interval,
            no_initial_check,
        } => {
            commands::watch(&ctx, interval, no_initial_check).await?;
        }
        Commands::Rpc => {
            commands::rpc(&ctx).await?;
        }
        Commands::Open { .. } => {}
    }

    Ok(())
}
