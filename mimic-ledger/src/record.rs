use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use fnv::FnvHashMap;
use mimic_message::key::RequestKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Channel a trade record was observed on. Reconciliation output order depends on this.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum TradeSource {
    #[display("FIX")]
    Fix,
    #[display("MQ")]
    Mq,
    #[display("API")]
    Api,
}

/// Field compared during reconciliation, in verdict output order.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum FieldName {
    #[display("price")]
    Price,
    #[display("quantity")]
    Quantity,
    #[display("amount")]
    Amount,
    #[display("settlementDate")]
    SettlementDate,
    #[display("symbol")]
    Symbol,
    #[display("currency")]
    Currency,
    #[display("account")]
    Account,
}

impl FieldName {
    /// Reconciliation verdict order.
    pub const ORDERED: [FieldName; 7] = [
        Self::Price,
        Self::Quantity,
        Self::Amount,
        Self::SettlementDate,
        Self::Symbol,
        Self::Currency,
        Self::Account,
    ];
}

/// Normalised view of one fill as observed on a single source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TradeRecord {
    pub source: TradeSource,
    pub request_key: Option<RequestKey>,
    pub order_id: Option<SmolStr>,
    pub symbol: SmolStr,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub currency: Option<SmolStr>,
    pub settlement_date: Option<NaiveDate>,
    pub time_execution: Option<DateTime<Utc>>,
    pub account: Option<SmolStr>,
    pub exec_type: Option<SmolStr>,
    pub extra: FnvHashMap<SmolStr, SmolStr>,
}

impl TradeRecord {
    /// Construct a [`TradeRecordBuilder`] for the provided source and symbol.
    pub fn builder<S: Into<SmolStr>>(source: TradeSource, symbol: S) -> TradeRecordBuilder {
        TradeRecordBuilder::new(source, symbol)
    }

    /// Correlation key grouping this record with its counterparts on the other sources:
    /// the request key when present, otherwise the venue order id.
    pub fn correlation_key(&self) -> Option<SmolStr> {
        self.request_key
            .as_ref()
            .map(|key| key.0.clone())
            .or_else(|| self.order_id.clone())
    }
}

#[derive(Debug, Clone)]
pub struct TradeRecordBuilder {
    record: TradeRecord,
}

impl TradeRecordBuilder {
    fn new<S: Into<SmolStr>>(source: TradeSource, symbol: S) -> Self {
        Self {
            record: TradeRecord {
                source,
                request_key: None,
                order_id: None,
                symbol: symbol.into(),
                quantity: None,
                price: None,
                amount: None,
                currency: None,
                settlement_date: None,
                time_execution: None,
                account: None,
                exec_type: None,
                extra: FnvHashMap::default(),
            },
        }
    }

    pub fn request_key(mut self, key: RequestKey) -> Self {
        self.record.request_key = Some(key);
        self
    }

    pub fn order_id<S: Into<SmolStr>>(mut self, id: S) -> Self {
        self.record.order_id = Some(id.into());
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.record.quantity = Some(quantity);
        self
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.record.price = Some(price);
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.record.amount = Some(amount);
        self
    }

    pub fn currency<S: Into<SmolStr>>(mut self, currency: S) -> Self {
        self.record.currency = Some(currency.into());
        self
    }

    pub fn settlement_date(mut self, date: NaiveDate) -> Self {
        self.record.settlement_date = Some(date);
        self
    }

    pub fn time_execution(mut self, time: DateTime<Utc>) -> Self {
        self.record.time_execution = Some(time);
        self
    }

    pub fn account<S: Into<SmolStr>>(mut self, account: S) -> Self {
        self.record.account = Some(account.into());
        self
    }

    pub fn exec_type<S: Into<SmolStr>>(mut self, exec_type: S) -> Self {
        self.record.exec_type = Some(exec_type.into());
        self
    }

    pub fn extra<K: Into<SmolStr>, V: Into<SmolStr>>(mut self, key: K, value: V) -> Self {
        self.record.extra.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> TradeRecord {
        self.record
    }
}
