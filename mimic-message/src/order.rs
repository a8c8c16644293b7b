use crate::{envelope::MessageEnvelope, key::RequestKey, tag};
use chrono::Utc;
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum OrderRequestError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum Side {
    Buy,
    Sell,
    SellShort,
}

impl Side {
    pub fn fix_code(&self) -> char {
        match self {
            Self::Buy => '1',
            Self::Sell => '2',
            Self::SellShort => '5',
        }
    }

    pub fn from_fix_code(code: char) -> Option<Self> {
        match code {
            '1' => Some(Self::Buy),
            '2' => Some(Self::Sell),
            '5' => Some(Self::SellShort),
            _ => None,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

impl OrderType {
    pub fn fix_code(&self) -> char {
        match self {
            Self::Market => '1',
            Self::Limit => '2',
            Self::Stop => '3',
            Self::StopLimit => '4',
        }
    }

    pub fn from_fix_code(code: char) -> Option<Self> {
        match code {
            '1' => Some(Self::Market),
            '2' => Some(Self::Limit),
            '3' => Some(Self::Stop),
            '4' => Some(Self::StopLimit),
            _ => None,
        }
    }

    /// Limit and stop variants carry a mandatory price.
    pub fn requires_price(&self) -> bool {
        !matches!(self, Self::Market)
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum TimeInForce {
    Day,
    GoodTilCancel,
    ImmediateOrCancel,
    FillOrKill,
    GoodTilDate,
    AtTheClose,
}

impl TimeInForce {
    pub fn fix_code(&self) -> char {
        match self {
            Self::Day => '0',
            Self::GoodTilCancel => '1',
            Self::ImmediateOrCancel => '3',
            Self::FillOrKill => '4',
            Self::GoodTilDate => '6',
            Self::AtTheClose => '7',
        }
    }

    pub fn from_fix_code(code: char) -> Option<Self> {
        match code {
            '0' => Some(Self::Day),
            '1' => Some(Self::GoodTilCancel),
            '3' => Some(Self::ImmediateOrCancel),
            '4' => Some(Self::FillOrKill),
            '6' => Some(Self::GoodTilDate),
            '7' => Some(Self::AtTheClose),
            _ => None,
        }
    }
}

/// Outcome a test author expects the venue to produce for a request.
///
/// Mirrors the exec-type code reported on execution reports.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum OrderOutcome {
    New,
    PartialFill,
    Fill,
    Canceled,
    Replaced,
    PendingCancel,
    Rejected,
}

impl OrderOutcome {
    pub fn exec_type(&self) -> char {
        match self {
            Self::New => '0',
            Self::PartialFill => '1',
            Self::Fill => '2',
            Self::Canceled => '4',
            Self::Replaced => '5',
            Self::PendingCancel => '6',
            Self::Rejected => '8',
        }
    }

    pub fn from_exec_type(code: char) -> Option<Self> {
        match code {
            '0' => Some(Self::New),
            '1' => Some(Self::PartialFill),
            '2' => Some(Self::Fill),
            '4' => Some(Self::Canceled),
            '5' => Some(Self::Replaced),
            '6' => Some(Self::PendingCancel),
            '8' => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Immutable order request, constructed via [`OrderRequest::builder`].
///
/// Invalid combinations (eg/ a Limit order without a price) are caught at build time rather than
/// when the request reaches the venue.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct OrderRequest {
    pub symbol: SmolStr,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<Decimal>,
    pub quantity: u64,
    pub time_in_force: TimeInForce,
    pub account: Option<SmolStr>,
    pub key: Option<RequestKey>,
    pub currency: SmolStr,
    pub expected_outcome: Option<OrderOutcome>,
}

impl OrderRequest {
    /// Construct an [`OrderRequestBuilder`] for the provided symbol.
    pub fn builder<S: Into<SmolStr>>(symbol: S) -> OrderRequestBuilder {
        OrderRequestBuilder::new(symbol)
    }

    /// Render this request as a NewOrderSingle-style [`MessageEnvelope`] addressed from
    /// `sender` to `target`.
    pub fn to_message<S: Into<SmolStr>>(&self, sender: S, target: S) -> MessageEnvelope {
        let mut message = MessageEnvelope::new(tag::msg_type::NEW_ORDER_SINGLE);
        message
            .set_sender_comp_id(sender)
            .set_target_comp_id(target)
            .set_sending_time(Utc::now());

        if let Some(key) = &self.key {
            message.set_text(tag::CL_ORD_ID, key.0.clone());
        }

        message
            .set_text(tag::SYMBOL, self.symbol.clone())
            .set_char(tag::SIDE, self.side.fix_code())
            .set_int(tag::ORDER_QTY, self.quantity as i64)
            .set_char(tag::ORD_TYPE, self.order_type.fix_code())
            .set_char(tag::TIME_IN_FORCE, self.time_in_force.fix_code())
            .set_text(tag::CURRENCY, self.currency.clone())
            .set_timestamp(tag::TRANSACT_TIME, Utc::now());

        if let Some(price) = self.price {
            message.set_decimal(tag::PRICE, price);
        }

        if let Some(account) = &self.account {
            message.set_text(tag::ACCOUNT, account.clone());
        }

        message
    }
}

#[derive(Debug, Clone)]
pub struct OrderRequestBuilder {
    symbol: SmolStr,
    side: Side,
    order_type: OrderType,
    price: Option<Decimal>,
    quantity: u64,
    time_in_force: TimeInForce,
    account: Option<SmolStr>,
    key: Option<RequestKey>,
    currency: SmolStr,
    expected_outcome: Option<OrderOutcome>,
}

impl OrderRequestBuilder {
    fn new<S: Into<SmolStr>>(symbol: S) -> Self {
        Self {
            symbol: symbol.into(),
            side: Side::Buy,
            order_type: OrderType::Market,
            price: None,
            quantity: 100,
            time_in_force: TimeInForce::Day,
            account: None,
            key: None,
            currency: SmolStr::new_static("USD"),
            expected_outcome: None,
        }
    }

    pub fn side(self, value: Side) -> Self {
        Self {
            side: value,
            ..self
        }
    }

    pub fn order_type(self, value: OrderType) -> Self {
        Self {
            order_type: value,
            ..self
        }
    }

    pub fn price(self, value: Decimal) -> Self {
        Self {
            price: Some(value),
            ..self
        }
    }

    pub fn quantity(self, value: u64) -> Self {
        Self {
            quantity: value,
            ..self
        }
    }

    pub fn time_in_force(self, value: TimeInForce) -> Self {
        Self {
            time_in_force: value,
            ..self
        }
    }

    pub fn account<S: Into<SmolStr>>(self, value: S) -> Self {
        Self {
            account: Some(value.into()),
            ..self
        }
    }

    pub fn key(self, value: RequestKey) -> Self {
        Self {
            key: Some(value),
            ..self
        }
    }

    pub fn currency<S: Into<SmolStr>>(self, value: S) -> Self {
        Self {
            currency: value.into(),
            ..self
        }
    }

    pub fn expected_outcome(self, value: OrderOutcome) -> Self {
        Self {
            expected_outcome: Some(value),
            ..self
        }
    }

    pub fn build(self) -> Result<OrderRequest, OrderRequestError> {
        if self.symbol.is_empty() {
            return Err(OrderRequestError::InvalidParameter(
                "symbol must be non-empty".to_string(),
            ));
        }

        if self.quantity == 0 {
            return Err(OrderRequestError::InvalidParameter(
                "quantity must be positive".to_string(),
            ));
        }

        match self.price {
            None if self.order_type.requires_price() => {
                return Err(OrderRequestError::InvalidParameter(format!(
                    "{} order requires a price",
                    self.order_type
                )));
            }
            Some(price) if price <= Decimal::ZERO => {
                return Err(OrderRequestError::InvalidParameter(format!(
                    "price must be positive, got: {price}"
                )));
            }
            _ => {}
        }

        Ok(OrderRequest {
            symbol: self.symbol,
            side: self.side,
            order_type: self.order_type,
            price: self.price,
            quantity: self.quantity,
            time_in_force: self.time_in_force,
            account: self.account,
            key: self.key,
            currency: self.currency,
            expected_outcome: self.expected_outcome,
        })
    }
}
