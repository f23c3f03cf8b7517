use tapebot_core::{Exchange, ExchangeError, Trade};
use tracing::{debug, info};

/// Poll `list_trades` until the exchange reports an exhausted history, or
/// until `max_pages` non-empty pages have been handed to `on_page`.
///
/// Returns the number of trades delivered. The first error aborts the drain
/// and is returned as-is; pages already delivered stay delivered.
pub async fn drain_trades<E, F>(
    exchange: &mut E,
    product_id: &str,
    max_pages: Option<usize>,
    mut on_page: F,
) -> Result<usize, ExchangeError>
where
    E: Exchange + ?Sized,
    F: FnMut(Vec<Trade>),
{
    let mut pages = 0usize;
    let mut total = 0usize;

    loop {
        if max_pages.is_some_and(|max| pages >= max) {
            debug!(product = %product_id, pages, "Page limit reached");
            break;
        }

        let page = exchange.list_trades(product_id).await?;
        if page.is_empty() {
            break;
        }

        pages += 1;
        total += page.len();
        on_page(page);
    }

    info!(
        exchange = exchange.name(),
        product = %product_id,
        pages,
        trades = total,
        "Trade drain finished"
    );
    Ok(total)
}
