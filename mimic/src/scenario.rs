use fnv::FnvHashMap;
use mimic_integration::llm::LlmProvider;
use mimic_message::order::{OrderOutcome, OrderRequest, OrderType, Side, TimeInForce};
use rust_decimal::Decimal;
use serde::Deserialize;
use smol_str::SmolStr;
use tracing::warn;

const LLM_SYSTEM_PROMPT: &str = "You translate trading intents into orders. Reply with a \
single JSON object with keys: symbol (ticker string), side (BUY|SELL|SELL_SHORT), order_type \
(MARKET|LIMIT|STOP|STOP_LIMIT), quantity (integer), price (number, omit for MARKET), \
time_in_force (DAY|GTC|IOC|FOK|GTD|AT_CLOSE), expected_outcome (FILL|REJECTED, optional). No \
other text.";

const QUANTITY_MAX: u64 = 9_999_999;

/// Maps free-form English intent to a structured [`OrderRequest`].
///
/// The keyword path is fully deterministic: no I/O, no randomness, identical input yields an
/// identical request. An optional [`LlmProvider`] may be preferred via
/// [`Self::translate_preferring_llm`]; the deterministic path remains the fallback whenever the
/// provider is absent, unavailable, or returns something unparseable.
#[derive(Debug, Clone)]
pub struct ScenarioTranslator {
    symbols: FnvHashMap<SmolStr, SmolStr>,
}

impl Default for ScenarioTranslator {
    fn default() -> Self {
        let known = [
            ("apple", "AAPL"),
            ("aapl", "AAPL"),
            ("google", "GOOG"),
            ("alphabet", "GOOG"),
            ("goog", "GOOG"),
            ("microsoft", "MSFT"),
            ("msft", "MSFT"),
            ("tesla", "TSLA"),
            ("tsla", "TSLA"),
            ("amazon", "AMZN"),
            ("amzn", "AMZN"),
        ];

        Self {
            symbols: known
                .into_iter()
                .map(|(alias, ticker)| (SmolStr::new(alias), SmolStr::new(ticker)))
                .collect(),
        }
    }
}

impl ScenarioTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the known-symbol dictionary with an alias. Aliases match case-insensitively on
    /// full words.
    pub fn with_symbol<A: Into<SmolStr>, T: Into<SmolStr>>(mut self, alias: A, ticker: T) -> Self {
        self.symbols
            .insert(SmolStr::new(alias.into().to_lowercase()), ticker.into());
        self
    }

    /// Deterministic keyword extraction of an [`OrderRequest`] from free-form English.
    pub fn translate(&self, text: &str) -> OrderRequest {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split_whitespace()
            .map(|token| token.trim_matches(|c| matches!(c, ',' | '.' | ';' | ':' | '!' | '?' | '(' | ')')))
            .filter(|token| !token.is_empty())
            .collect();
        let has_word = |word: &str| tokens.iter().any(|token| *token == word);

        let side = if has_word("sell") || has_word("short") {
            Side::Sell
        } else {
            Side::Buy
        };

        let mut order_type = OrderType::Market;
        if has_word("limit") {
            order_type = OrderType::Limit;
        }
        if has_word("stop") {
            order_type = OrderType::Stop;
        }

        let mut time_in_force = TimeInForce::Day;
        if has_word("close") || has_word("moc") {
            time_in_force = TimeInForce::AtTheClose;
        }
        if has_word("gtc") {
            time_in_force = TimeInForce::GoodTilCancel;
        }
        if has_word("ioc") || has_word("immediate") {
            time_in_force = TimeInForce::ImmediateOrCancel;
        }

        let symbol = tokens
            .iter()
            .find_map(|token| self.symbols.get(*token))
            .cloned()
            .unwrap_or_else(|| SmolStr::new_static("UNKNOWN"));

        let quantity = extract_quantity(&tokens).unwrap_or(100);
        let price = extract_price(&tokens).unwrap_or(Decimal::new(1000, 1));

        let expected_outcome = if lowered.contains("reject")
            || lowered.contains("fat-finger")
            || lowered.contains("fat finger")
        {
            Some(OrderOutcome::Rejected)
        } else if lowered.contains("fill") {
            Some(OrderOutcome::Fill)
        } else {
            None
        };

        let mut builder = OrderRequest::builder(symbol)
            .side(side)
            .order_type(order_type)
            .quantity(quantity)
            .time_in_force(time_in_force);

        // Price is only meaningful away from MARKET
        if order_type.requires_price() {
            builder = builder.price(price);
        }

        if let Some(outcome) = expected_outcome {
            builder = builder.expected_outcome(outcome);
        }

        builder
            .build()
            .expect("deterministic translation always produces a buildable request")
    }

    /// Prefer the provided LLM when it is available; fall back to [`Self::translate`] on
    /// absence, unavailability, completion failure or unparseable output.
    pub async fn translate_preferring_llm<L>(&self, text: &str, llm: Option<&L>) -> OrderRequest
    where
        L: LlmProvider,
    {
        if let Some(provider) = llm
            && provider.is_available()
        {
            match provider.complete(LLM_SYSTEM_PROMPT, text).await {
                Ok(completion) => {
                    if let Some(request) = self.parse_llm_completion(&completion) {
                        return request;
                    }
                    warn!(%completion, "llm completion unparseable - using deterministic path");
                }
                Err(error) => {
                    warn!(%error, "llm completion failed - using deterministic path");
                }
            }
        }

        self.translate(text)
    }

    fn parse_llm_completion(&self, completion: &str) -> Option<OrderRequest> {
        let start = completion.find('{')?;
        let end = completion.rfind('}')?;
        let parsed: LlmOrder = serde_json::from_str(completion.get(start..=end)?).ok()?;

        let mut builder = OrderRequest::builder(parsed.symbol);

        if let Some(side) = parsed.side {
            builder = builder.side(match side.to_uppercase().as_str() {
                "SELL" => Side::Sell,
                "SELL_SHORT" | "SHORT" => Side::SellShort,
                _ => Side::Buy,
            });
        }

        let order_type = parsed.order_type.map(|order_type| {
            match order_type.to_uppercase().as_str() {
                "LIMIT" => OrderType::Limit,
                "STOP" => OrderType::Stop,
                "STOP_LIMIT" => OrderType::StopLimit,
                _ => OrderType::Market,
            }
        });
        if let Some(order_type) = order_type {
            builder = builder.order_type(order_type);
        }

        if let Some(quantity) = parsed.quantity {
            builder = builder.quantity(quantity);
        }

        if let Some(price) = parsed.price {
            builder = builder.price(price);
        }

        if let Some(tif) = parsed.time_in_force {
            builder = builder.time_in_force(match tif.to_uppercase().as_str() {
                "GTC" => TimeInForce::GoodTilCancel,
                "IOC" => TimeInForce::ImmediateOrCancel,
                "FOK" => TimeInForce::FillOrKill,
                "GTD" => TimeInForce::GoodTilDate,
                "AT_CLOSE" | "MOC" => TimeInForce::AtTheClose,
                _ => TimeInForce::Day,
            });
        }

        if let Some(outcome) = parsed.expected_outcome {
            builder = builder.expected_outcome(match outcome.to_uppercase().as_str() {
                "REJECTED" => OrderOutcome::Rejected,
                _ => OrderOutcome::Fill,
            });
        }

        builder.build().ok()
    }
}

#[derive(Debug, Deserialize)]
struct LlmOrder {
    symbol: String,
    side: Option<String>,
    order_type: Option<String>,
    quantity: Option<u64>,
    price: Option<Decimal>,
    time_in_force: Option<String>,
    expected_outcome: Option<String>,
}

const PRICE_MARKERS: [&str; 3] = ["at", "@", "price"];

fn is_price_marker(token: &str) -> bool {
    PRICE_MARKERS.contains(&token)
}

/// First integer in `1..=9_999_999` that is not positioned as a price.
fn extract_quantity(tokens: &[&str]) -> Option<u64> {
    tokens.iter().enumerate().find_map(|(index, token)| {
        let follows_marker = index
            .checked_sub(1)
            .is_some_and(|prev| is_price_marker(tokens[prev]));

        if follows_marker || token.starts_with('@') {
            return None;
        }

        token
            .parse::<u64>()
            .ok()
            .filter(|quantity| (1..=QUANTITY_MAX).contains(quantity))
    })
}

/// First number following "at", "@" or "price" (inline `@180` included).
fn extract_price(tokens: &[&str]) -> Option<Decimal> {
    let mut marker_seen = false;

    for token in tokens {
        if let Some(inline) = token.strip_prefix('@')
            && !inline.is_empty()
        {
            if let Some(price) = parse_number(inline) {
                return Some(price);
            }
        }

        if is_price_marker(token) {
            marker_seen = true;
            continue;
        }

        if marker_seen {
            if let Some(price) = parse_number(token) {
                return Some(price);
            }
            // Markers only bind to the next numeric-looking token run; keep scanning
        }
    }

    None
}

fn parse_number(token: &str) -> Option<Decimal> {
    token.trim_start_matches('$').parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sell_limit_scenario() {
        let request = ScenarioTranslator::new().translate("Sell 500 shares of AAPL limit at 180");

        assert_eq!(request.side, Side::Sell);
        assert_eq!(request.order_type, OrderType::Limit);
        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.quantity, 500);
        assert_eq!(request.price, Some(dec!(180)));
        assert_eq!(request.time_in_force, TimeInForce::Day);
        assert_eq!(request.currency, "USD");
    }

    #[test]
    fn test_defaults_for_bare_buy() {
        let request = ScenarioTranslator::new().translate("buy apple");

        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.order_type, OrderType::Market);
        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.quantity, 100);
        assert_eq!(request.price, None);
        assert_eq!(request.time_in_force, TimeInForce::Day);
    }

    #[test]
    fn test_price_after_at_is_not_mistaken_for_quantity() {
        let request = ScenarioTranslator::new().translate("buy microsoft limit at 180");

        assert_eq!(request.quantity, 100);
        assert_eq!(request.price, Some(dec!(180)));
    }

    #[test]
    fn test_inline_at_sign_price() {
        let request = ScenarioTranslator::new().translate("sell 50 tesla limit @180.25");

        assert_eq!(request.quantity, 50);
        assert_eq!(request.price, Some(dec!(180.25)));
    }

    #[test]
    fn test_market_order_drops_extracted_price() {
        let request = ScenarioTranslator::new().translate("buy 200 amazon at 150");

        assert_eq!(request.order_type, OrderType::Market);
        assert_eq!(request.price, None);
        assert_eq!(request.quantity, 200);
    }

    #[test]
    fn test_stop_overrides_limit_and_extracts_price() {
        let request = ScenarioTranslator::new().translate("sell google stop at 95.5");

        assert_eq!(request.order_type, OrderType::Stop);
        assert_eq!(request.price, Some(dec!(95.5)));
    }

    #[test]
    fn test_time_in_force_keywords() {
        let translator = ScenarioTranslator::new();

        assert_eq!(
            translator.translate("buy apple at the close").time_in_force,
            TimeInForce::AtTheClose
        );
        assert_eq!(
            translator.translate("buy apple moc").time_in_force,
            TimeInForce::AtTheClose
        );
        assert_eq!(
            translator.translate("buy apple gtc").time_in_force,
            TimeInForce::GoodTilCancel
        );
        assert_eq!(
            translator.translate("buy apple ioc").time_in_force,
            TimeInForce::ImmediateOrCancel
        );
        assert_eq!(
            translator.translate("buy apple immediate").time_in_force,
            TimeInForce::ImmediateOrCancel
        );
    }

    #[test]
    fn test_unknown_symbol() {
        let request = ScenarioTranslator::new().translate("buy 10 cabbages");

        assert_eq!(request.symbol, "UNKNOWN");
        assert_eq!(request.quantity, 10);
    }

    #[test]
    fn test_expected_outcomes() {
        let translator = ScenarioTranslator::new();

        assert_eq!(
            translator
                .translate("buy apple expecting a fat-finger reject")
                .expected_outcome,
            Some(OrderOutcome::Rejected)
        );
        assert_eq!(
            translator.translate("buy apple fat finger").expected_outcome,
            Some(OrderOutcome::Rejected)
        );
        assert_eq!(
            translator.translate("buy apple and expect a fill").expected_outcome,
            Some(OrderOutcome::Fill)
        );
        assert_eq!(translator.translate("buy apple").expected_outcome, None);
    }

    #[test]
    fn test_translation_is_deterministic() {
        let translator = ScenarioTranslator::new();
        let text = "Sell 500 shares of AAPL limit at 180";

        assert_eq!(translator.translate(text), translator.translate(text));
    }

    #[test]
    fn test_custom_symbol_alias() {
        let translator = ScenarioTranslator::new().with_symbol("Netflix", "NFLX");

        assert_eq!(translator.translate("buy netflix").symbol, "NFLX");
    }

    #[test]
    fn test_quantity_bounds() {
        let translator = ScenarioTranslator::new();

        // Out-of-range integers are ignored
        assert_eq!(translator.translate("buy 10000000 apple").quantity, 100);
        assert_eq!(translator.translate("buy 9999999 apple").quantity, 9_999_999);
        assert_eq!(translator.translate("buy 0 apple then 7 more").quantity, 7);
    }

    #[test]
    fn test_llm_completion_parsing() {
        let translator = ScenarioTranslator::new();

        let request = translator
            .parse_llm_completion(
                r#"{"symbol": "NVDA", "side": "SELL", "order_type": "LIMIT", "quantity": 25, "price": 900.5, "time_in_force": "GTC"}"#,
            )
            .unwrap();

        assert_eq!(request.symbol, "NVDA");
        assert_eq!(request.side, Side::Sell);
        assert_eq!(request.order_type, OrderType::Limit);
        assert_eq!(request.quantity, 25);
        assert_eq!(request.price, Some(dec!(900.5)));
        assert_eq!(request.time_in_force, TimeInForce::GoodTilCancel);

        assert!(translator.parse_llm_completion("no json here").is_none());
        // A LIMIT completion without a price fails order validation and is unparseable
        assert!(
            translator
                .parse_llm_completion(r#"{"symbol": "NVDA", "order_type": "LIMIT"}"#)
                .is_none()
        );
    }
}
