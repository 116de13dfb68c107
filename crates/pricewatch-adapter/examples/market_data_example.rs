/*
[INPUT]:  Symbol identifier (e.g., "BTCUSDT")
[OUTPUT]: Last price and top-of-book from Binance and Bybit
[POS]:    Examples - public market data queries
[UPDATE]: When adding exchanges or market data endpoints
*/

use std::sync::Arc;

use pricewatch_adapter::exchange::binance::DEFAULT_BINANCE_URL;
use pricewatch_adapter::exchange::bybit::DEFAULT_BYBIT_URL;
use pricewatch_adapter::*;

/// Example: query the same symbol on every supported exchange
///
/// These endpoints are public and need no API key.
#[tokio::main]
async fn main() {
    let symbol = std::env::args().nth(1).unwrap_or_else(|| "BTCUSDT".to_string());

    let adapters: Vec<Arc<dyn ExchangeAdapter>> = match (
        BinanceAdapter::new(ClientConfig::default(), DEFAULT_BINANCE_URL, None),
        BybitAdapter::new(ClientConfig::default(), DEFAULT_BYBIT_URL, "spot"),
    ) {
        (Ok(binance), Ok(bybit)) => vec![Arc::new(binance), Arc::new(bybit)],
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Failed to create adapters: {e}");
            return;
        }
    };

    for adapter in adapters {
        let exchange = adapter.exchange();

        match adapter.get_price(&symbol).await {
            Ok(price) => println!("{exchange} {symbol} price: {price}"),
            Err(e) => println!("{exchange} price error: {e}"),
        }

        match adapter.get_order_book(&symbol, 5).await {
            Ok(book) => println!(
                "{exchange} best bid {:?}, best ask {:?}",
                book.bids.first().map(RawLevel::price),
                book.asks.first().map(RawLevel::price)
            ),
            Err(e) => println!("{exchange} order book error: {e}"),
        }
    }
}
