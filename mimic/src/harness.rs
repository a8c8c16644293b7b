use crate::scenario::ScenarioTranslator;
use chrono::NaiveDate;
use mimic_data::{calendar::BusinessCalendar, clock::LiveClock, generate::SyntheticData};
use mimic_execution::{
    client::correlator::{Correlator, DEFAULT_RESPONSE_TIMEOUT},
    error::ExecutionError,
    venue::{
        interceptor::{Interceptor, ShutdownHandle},
        stub::StubRegistry,
    },
};
use mimic_integration::{
    channel::{Tx, mpsc_unbounded},
    error::TransportError,
    transport::{ChannelSink, CompId, Session, TransportSink},
};
use mimic_ledger::{
    compare::ComparisonConfig,
    error::LedgerError,
    ledger::ReconciliationLedger,
    record::{TradeRecord, TradeSource},
};
use mimic_message::{envelope::MessageEnvelope, key::RequestKey, order::OrderRequest, tag};
use smol_str::SmolStr;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::debug;

/// Plain-value configuration for a [`VenueHarness`]. No file loading happens here; the
/// embedding test framework decides where these values come from.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub venue_comp_id: SmolStr,
    pub client_comp_id: SmolStr,
    /// Tags copied from request to response by the interceptor.
    pub correlation_tags: Vec<u32>,
    pub comparison: ComparisonConfig,
    pub calendar: BusinessCalendar,
    pub response_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            venue_comp_id: SmolStr::new_static("VENUE"),
            client_comp_id: SmolStr::new_static("INITIATOR"),
            correlation_tags: vec![tag::CL_ORD_ID],
            comparison: ComparisonConfig::default(),
            calendar: BusinessCalendar::nyse(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

/// [`TransportSink`] handing venue responses straight to the initiator's correlator.
#[derive(Debug, Clone)]
struct DeliverySink {
    correlator: Arc<Correlator<ChannelSink>>,
}

impl TransportSink for DeliverySink {
    fn send(&self, message: MessageEnvelope, _: &Session) -> Result<(), TransportError> {
        if !self.correlator.deliver(&message) {
            debug!(%message, "venue response not claimed by any outstanding request");
        }
        Ok(())
    }
}

/// In-process loopback of the full engine: stub registry + interceptor on the venue side,
/// correlator on the initiator side, reconciliation ledger and synthetic data generation.
///
/// The send path runs correlator -> interceptor inbox; the response path runs interceptor ->
/// [`Correlator::deliver`]. Everything is instanced - two harnesses never share state.
#[derive(Debug)]
pub struct VenueHarness {
    config: HarnessConfig,
    registry: Arc<StubRegistry>,
    correlator: Arc<Correlator<ChannelSink>>,
    ledger: Arc<ReconciliationLedger>,
    generator: SyntheticData<LiveClock>,
    translator: ScenarioTranslator,
    shutdown: ShutdownHandle,
    interceptor_task: JoinHandle<()>,
    pump_task: JoinHandle<()>,
}

impl VenueHarness {
    /// Wire and start the harness on the current tokio runtime.
    pub fn start(config: HarnessConfig) -> Self {
        let registry = Arc::new(StubRegistry::new());
        let ledger = Arc::new(ReconciliationLedger::with_config(config.comparison));

        let (client_tx, mut client_rx) = mpsc_unbounded();
        let correlator = Arc::new(Correlator::new(ChannelSink::new(client_tx)));

        let client_session = Session::new(
            CompId::new(config.client_comp_id.clone()),
            CompId::new(config.venue_comp_id.clone()),
        );
        correlator.bind_session(client_session.clone());

        let (venue_tx, venue_rx) = mpsc_unbounded::<MessageEnvelope, TransportError>();
        let (interceptor, shutdown) = Interceptor::new(
            Arc::clone(&registry),
            DeliverySink {
                correlator: Arc::clone(&correlator),
            },
            client_session.reverse(),
        );
        let interceptor = interceptor.with_correlation_tags(config.correlation_tags.clone());
        let interceptor_task = tokio::spawn(interceptor.run(venue_rx));

        // Outbound client messages loop back as the venue's inbound stream
        let pump_task = tokio::spawn(async move {
            while let Some((message, _session)) = client_rx.rx.recv().await {
                if venue_tx.send(message).is_err() {
                    break;
                }
            }
        });

        let generator = SyntheticData::new(config.calendar.clone(), LiveClock);

        Self {
            config,
            registry,
            correlator,
            ledger,
            generator,
            translator: ScenarioTranslator::new(),
            shutdown,
            interceptor_task,
            pump_task,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn registry(&self) -> &StubRegistry {
        &self.registry
    }

    pub fn correlator(&self) -> &Correlator<ChannelSink> {
        &self.correlator
    }

    pub fn ledger(&self) -> &ReconciliationLedger {
        &self.ledger
    }

    pub fn generator(&self) -> &SyntheticData<LiveClock> {
        &self.generator
    }

    pub fn translator(&self) -> &ScenarioTranslator {
        &self.translator
    }

    /// Send `request` to the synthetic venue and await the correlated response.
    ///
    /// A request without an explicit key is assigned a freshly minted one.
    pub async fn place_order(
        &self,
        request: &OrderRequest,
    ) -> Result<MessageEnvelope, ExecutionError> {
        let key = request
            .key
            .clone()
            .unwrap_or_else(|| self.generator.request_key());

        let mut message = request.to_message(
            self.config.client_comp_id.clone(),
            self.config.venue_comp_id.clone(),
        );
        if !message.is_set(tag::CL_ORD_ID) {
            message.set_text(tag::CL_ORD_ID, key.0.clone());
        }

        self.correlator
            .send_and_await(message, key, self.config.response_timeout)
            .await
    }

    /// Normalise an execution report observed on the FIX channel onto the ledger.
    pub fn record_fix_report(&self, report: &MessageEnvelope) -> Result<SmolStr, LedgerError> {
        self.ledger
            .add_record(trade_record_from_report(TradeSource::Fix, report))
    }

    /// Stop the interceptor (aborting any response delay in flight) and detach the loopback.
    pub async fn shutdown(self) {
        self.shutdown.shutdown();
        let _ = self.interceptor_task.await;
        self.pump_task.abort();
    }
}

/// Normalise an execution report into a per-source [`TradeRecord`].
pub fn trade_record_from_report(source: TradeSource, report: &MessageEnvelope) -> TradeRecord {
    let mut builder = TradeRecord::builder(
        source,
        report.get_text(tag::SYMBOL).unwrap_or("UNKNOWN"),
    );

    if let Some(key) = report.get_text(tag::CL_ORD_ID) {
        builder = builder.request_key(RequestKey::new(key));
    }
    if let Some(order_id) = report.get_text(tag::ORDER_ID) {
        builder = builder.order_id(order_id);
    }

    let quantity = report
        .get_decimal(tag::LAST_QTY)
        .or_else(|| report.get_decimal(tag::CUM_QTY));
    let price = report
        .get_decimal(tag::LAST_PX)
        .or_else(|| report.get_decimal(tag::AVG_PX));

    if let Some(quantity) = quantity {
        builder = builder.quantity(quantity);
    }
    if let Some(price) = price {
        builder = builder.price(price);
    }
    if let (Some(price), Some(quantity)) = (price, quantity) {
        builder = builder.amount(price * quantity);
    }

    if let Some(currency) = report.get_text(tag::CURRENCY) {
        builder = builder.currency(currency);
    }
    if let Some(account) = report.get_text(tag::ACCOUNT) {
        builder = builder.account(account);
    }
    if let Some(exec_type) = report.get_char(tag::EXEC_TYPE) {
        builder = builder.exec_type(SmolStr::from_iter([exec_type]));
    }
    if let Some(settlement) = report
        .get_text(tag::SETTL_DATE)
        .and_then(parse_settlement_date)
    {
        builder = builder.settlement_date(settlement);
    }
    if let Some(time_execution) = report.get_timestamp(tag::TRANSACT_TIME) {
        builder = builder.time_execution(time_execution);
    }

    builder.build()
}

/// Settlement dates arrive either ISO (`2026-08-11`) or FIX-compact (`20260811`).
fn parse_settlement_date(value: &str) -> Option<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
}
