use tokio::io::BufReader;

use crate::alert;
use crate::app::{AppContext, PriceWatchError, Result};
use crate::checker::CheckerConfig;
use crate::domain::{format_time_ago, now_millis, AlertKind, TrackedProduct};
use crate::extract::CURRENCY_GLYPH;
use crate::history::RecordOutcome;
use crate::service::{catalog_search_url, serve_lines};

fn format_price(price: f64) -> String {
    format!("{} {}", CURRENCY_GLYPH, price)
}

fn format_change(percent: f64) -> String {
    if percent > 0.0 {
        format!("▲ {:.1}%", percent)
    } else if percent < 0.0 {
        format!("▼ {:.1}%", percent.abs())
    } else {
        "no change".to_string()
    }
}

pub async fn track(ctx: &AppContext, url: &str) -> Result<()> {
    if ctx.history.get_product(url)?.is_some() {
        ctx.history.toggle_tracking(url, "", 0.0)?;
        println!("Stopped tracking: {}", url);
        return Ok(());
    }

    let info = ctx.service.inspect(url).await?;
    let price = info
        .price
        .ok_or_else(|| PriceWatchError::Other(format!("No price found on {}", url)))?;
    let name = info.name.unwrap_or_else(|| url.to_string());

    ctx.history.toggle_tracking(url, &name, price)?;
    println!("Now tracking: {}\n  {} at {}", name, url, format_price(price));
    Ok(())
}

pub fn toggle(ctx: &AppContext, url: &str, name: &str, price: f64) -> Result<()> {
    if ctx.history.toggle_tracking(url, name, price)? {
        println!("Now tracking: {}", url);
    } else {
        println!("Stopped tracking: {}", url);
    }
    Ok(())
}

pub async fn visit(ctx: &AppContext, url: &str) -> Result<()> {
    match ctx.service.visit(url).await? {
        None => println!("No price found on {}", url),
        Some(RecordOutcome::Untracked) => println!("Not tracked: {}", url),
        Some(RecordOutcome::Recorded { product, signals }) => {
            println!("{}: {}", product.name, format_price(product.current_price));
            for signal in &signals {
                println!("{} {}", signal.title(), signal.message());
            }
        }
    }
    Ok(())
}

pub async fn search(ctx: &AppContext, query: &str, limit: usize) -> Result<()> {
    let search_url = catalog_search_url(query)?;
    println!("Searching: {}", search_url);

    let scrape = ctx.service.search(search_url.as_str()).await?;
    tracing::debug!("{}", scrape.diagnostics);

    if scrape.products.is_empty() {
        println!("No products found");
        println!("  {}", scrape.diagnostics);
        return Ok(());
    }

    for product in scrape.products.iter().take(limit) {
        println!("{:>12}  {}\n              {}", format_price(product.price), product.name, product.url);
    }

    if scrape.products.len() > limit {
        println!("... and {} more", scrape.products.len() - limit);
    }
    Ok(())
}

fn print_product(url: &str, product: &TrackedProduct, now: i64) {
    println!("{}\n  {}", product.name, url);
    println!(
        "  current {}  low {}  high {}  ({})",
        format_price(product.current_price),
        format_price(product.lowest_price),
        format_price(product.highest_price),
        format_change(product.price_change_percent())
    );

    let mut alerts = Vec::new();
    if let Some(below) = product.price_alerts.below {
        alerts.push(format!("below {}", format_price(below)));
    }
    if let Some(above) = product.price_alerts.above {
        alerts.push(format!("above {}", format_price(above)));
    }

    println!(
        "  checked {}, tracking {}{}",
        format_time_ago(product.last_checked, now),
        product.tracking_duration_label(now),
        if alerts.is_empty() {
            String::new()
        } else {
            format!(", alerts: {}", alerts.join(", "))
        }
    );
}

pub fn list(ctx: &AppContext) -> Result<()> {
    let products = ctx.history.tracked_products()?;

    if products.is_empty() {
        println!("No tracked products");
        return Ok(());
    }

    let now = now_millis();
    for (url, product) in &products {
        print_product(url, product, now);
    }
    Ok(())
}

pub fn show(ctx: &AppContext, url: &str, days: i64) -> Result<()> {
    let product = ctx
        .history
        .get_product(url)?
        .ok_or_else(|| PriceWatchError::ProductNotFound(url.to_string()))?;
    let now = now_millis();

    print_product(url, &product, now);

    let history = ctx.history.filter_history(url, days)?;
    println!("\nLast {} days ({} prices):", days, history.len());
    for point in &history {
        let date = point
            .observed_at()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "                ".to_string());
        println!("  {}  {}", date, format_price(point.price));
    }
    Ok(())
}

pub fn set_alert(
    ctx: &AppContext,
    url: &str,
    below: Option<f64>,
    above: Option<f64>,
    clear: Option<AlertKind>,
) -> Result<()> {
    let (kind, threshold) = match (below, above, clear) {
        (Some(price), _, _) => (AlertKind::Below, Some(price)),
        (_, Some(price), _) => (AlertKind::Above, Some(price)),
        (_, _, Some(kind)) => (kind, None),
        _ => return Err(PriceWatchError::Other("No alert threshold given".into())),
    };

    let alerts = ctx.history.set_alert(url, kind, threshold)?;
    match alerts.get(kind) {
        Some(price) => println!("Alert set: {} {}", kind, format_price(price)),
        None => println!("Alert cleared: {}", kind),
    }
    Ok(())
}

pub async fn check(ctx: &AppContext) -> Result<()> {
    let urls = ctx.history.tracked_urls()?;
    if urls.is_empty() {
        println!("No tracked products to check");
        return Ok(());
    }

    println!("Checking {} products...", urls.len());
    let summary = ctx.checker.check_all().await;
    println!(
        "Check complete: {} updated, {} errors, {} alerts",
        summary.updated, summary.failed, summary.alerts
    );
    Ok(())
}

pub async fn watch(ctx: &AppContext, interval: Option<String>, no_initial_check: bool) -> Result<()> {
    let mut config: CheckerConfig = ctx.config.checker.clone();
    if let Some(interval) = interval {
        config.interval = interval;
    }
    if no_initial_check {
        config.check_on_start = false;
    }

    ctx.checker.run(&config).await
}

pub async fn rpc(ctx: &AppContext) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    serve_lines(&ctx.service, stdin, tokio::io::stdout()).await
}

pub fn open(id: &str) -> Result<()> {
    alert::open_notification(id)?;
    if let Some(url) = alert::notification_target(id) {
        println!("Opened {}", url);
    }
    Ok(())
}
