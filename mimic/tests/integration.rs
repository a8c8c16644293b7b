use mimic::{
    harness::{HarnessConfig, VenueHarness, trade_record_from_report},
    scenario::ScenarioTranslator,
};
use mimic_data::calendar::BusinessCalendar;
use mimic_execution::{error::ExecutionError, venue::respond};
use mimic_ledger::record::{FieldName, TradeRecord, TradeSource};
use mimic_message::{
    envelope::MessageEnvelope,
    key::RequestKey,
    order::{OrderOutcome, OrderRequest, OrderType, Side, TimeInForce},
    tag,
};
use rust_decimal_macros::dec;
use std::time::Duration;

fn harness() -> VenueHarness {
    VenueHarness::start(HarnessConfig {
        response_timeout: Duration::from_secs(2),
        ..HarnessConfig::default()
    })
}

/// Fat-finger rejection: a rejection stub answers the AAPL order, the FIX observation lands on
/// the ledger, and the rejection is verifiable by symbol.
#[tokio::test]
async fn fat_finger_rejection_is_stubbed_and_verified() {
    let harness = harness();

    harness
        .registry()
        .when(|message| message.get_text(tag::SYMBOL) == Some("AAPL"))
        .respond_with(respond::reject("Fat-finger price check failed"))
        .label("aapl-fat-finger")
        .register()
        .unwrap();

    let request = OrderRequest::builder("AAPL")
        .side(Side::Buy)
        .order_type(OrderType::Limit)
        .price(dec!(9999))
        .quantity(100)
        .key(RequestKey::new("K-REJECT"))
        .expected_outcome(OrderOutcome::Rejected)
        .build()
        .unwrap();

    let report = harness.place_order(&request).await.unwrap();

    assert_eq!(report.get_char(tag::EXEC_TYPE), Some('8'));
    assert_eq!(
        report.get_text(tag::TEXT),
        Some("Fat-finger price check failed")
    );
    assert_eq!(report.get_text(tag::CL_ORD_ID), Some("K-REJECT"));

    harness.record_fix_report(&report).unwrap();
    assert!(harness.ledger().verify_rejection_handled("AAPL"));
    assert!(!harness.ledger().verify_rejection_handled("MSFT"));

    harness.shutdown().await;
}

/// Fill reconciliation: matching observations on all three channels reconcile to seven passing
/// verdicts.
#[tokio::test]
async fn fill_reconciles_across_three_sources() {
    let harness = harness();
    let price = dec!(420.5);
    let quantity = dec!(250);
    let settlement = harness
        .generator()
        .settlement_date(mimic_data::generate::SettlementCycle::T2);

    harness
        .registry()
        .when(|message| message.get_text(tag::SYMBOL) == Some("MSFT"))
        .respond_with(respond::fill(price))
        .register()
        .unwrap();

    let request = OrderRequest::builder("MSFT")
        .quantity(250)
        .key(RequestKey::new("K-FILL"))
        .build()
        .unwrap();

    let report = harness.place_order(&request).await.unwrap();
    assert_eq!(report.get_char(tag::EXEC_TYPE), Some('2'));

    // FIX observation comes straight off the wire; MQ and API views arrive out of band
    let mut fix_record = trade_record_from_report(TradeSource::Fix, &report);
    fix_record.settlement_date = Some(settlement);
    harness.ledger().add_record(fix_record).unwrap();

    for source in [TradeSource::Mq, TradeSource::Api] {
        harness
            .ledger()
            .add_record(
                TradeRecord::builder(source, "MSFT")
                    .request_key(RequestKey::new("K-FILL"))
                    .quantity(quantity)
                    .price(price)
                    .amount(price * quantity)
                    .currency("USD")
                    .settlement_date(settlement)
                    .build(),
            )
            .unwrap();
    }

    let result = harness.ledger().reconcile("K-FILL");

    assert!(result.passed);
    assert_eq!(result.verdicts.len(), 7);
    let fields: Vec<FieldName> = result.verdicts.iter().map(|verdict| verdict.field).collect();
    assert_eq!(fields, FieldName::ORDERED);

    result
        .assert_parity()
        .and_then(|result| result.assert_amount_match(dec!(0.0001)))
        .and_then(|result| result.assert_settlement_date_match())
        .unwrap();

    harness.shutdown().await;
}

/// Sequential responses: a two-generator rule answers ack then fill, with the terminal
/// generator sticky for every later order.
#[tokio::test]
async fn sequential_stub_responses_advance_and_saturate() {
    let harness = harness();

    let rule = harness
        .registry()
        .when(|message| message.get_text(tag::SYMBOL) == Some("TSLA"))
        .respond_with(respond::ack())
        .respond_with(respond::fill(dec!(250)))
        .register()
        .unwrap();

    let mut exec_types = Vec::new();
    for index in 0..4 {
        let request = OrderRequest::builder("TSLA")
            .key(RequestKey::new(format!("K-SEQ-{index}")))
            .build()
            .unwrap();

        let report = harness.place_order(&request).await.unwrap();
        exec_types.push(report.get_char(tag::EXEC_TYPE).unwrap());
    }

    assert_eq!(exec_types, vec!['0', '2', '2', '2']);
    assert_eq!(rule.call_count(), 4);

    harness.shutdown().await;
}

/// Settlement over a holiday: an explicit Friday holiday pushes T+1 from Thursday to Monday.
#[test]
fn settlement_skips_explicit_holiday() {
    let calendar = BusinessCalendar::new("adhoc")
        .with_holiday(chrono::NaiveDate::from_ymd_opt(2026, 12, 25).unwrap());

    let settled = calendar.add_business_days(
        chrono::NaiveDate::from_ymd_opt(2026, 12, 24).unwrap(),
        1,
    );

    assert_eq!(settled, chrono::NaiveDate::from_ymd_opt(2026, 12, 28).unwrap());
}

/// Scenario translation drives an order the venue then fills.
#[tokio::test]
async fn translated_scenario_round_trips_through_the_venue() {
    let harness = harness();

    let request = ScenarioTranslator::new().translate("Sell 500 shares of AAPL limit at 180");

    assert_eq!(request.side, Side::Sell);
    assert_eq!(request.order_type, OrderType::Limit);
    assert_eq!(request.symbol, "AAPL");
    assert_eq!(request.quantity, 500);
    assert_eq!(request.price, Some(dec!(180)));
    assert_eq!(request.time_in_force, TimeInForce::Day);
    assert_eq!(request.currency, "USD");

    harness
        .registry()
        .when(|message| message.get_char(tag::SIDE) == Some('2'))
        .respond_with(respond::fill(dec!(180)))
        .register()
        .unwrap();

    let report = harness.place_order(&request).await.unwrap();
    assert_eq!(report.get_char(tag::EXEC_TYPE), Some('2'));
    assert_eq!(report.get_decimal(tag::CUM_QTY), Some(dec!(500)));

    harness.shutdown().await;
}

/// Correlator timeout: with no stub programmed nothing answers, the await fails after the
/// deadline, and a late matching delivery is discarded without error.
#[tokio::test]
async fn unanswered_request_times_out_and_late_response_is_dropped() {
    let harness = VenueHarness::start(HarnessConfig {
        response_timeout: Duration::from_millis(50),
        ..HarnessConfig::default()
    });

    let request = OrderRequest::builder("MSFT")
        .key(RequestKey::new("K-LATE"))
        .build()
        .unwrap();

    let result = harness.place_order(&request).await;
    assert!(matches!(result, Err(ExecutionError::Timeout(_))));

    // A matching response arriving after expiry is dropped, not redelivered
    let late = MessageEnvelope::new(tag::msg_type::EXECUTION_REPORT)
        .with_text(tag::CL_ORD_ID, "K-LATE")
        .with_char(tag::EXEC_TYPE, '2');
    assert!(!harness.correlator().deliver(&late));
    assert_eq!(harness.correlator().pending(), 0);

    harness.shutdown().await;
}

/// Delayed stubs suspend the response without blocking the venue for other rules.
#[tokio::test]
async fn delayed_stub_response_arrives_after_the_delay() {
    let harness = harness();

    harness
        .registry()
        .when(|message| message.get_text(tag::SYMBOL) == Some("GOOG"))
        .respond_with(respond::fill(dec!(180)))
        .delay(Duration::from_millis(50))
        .register()
        .unwrap();

    let request = OrderRequest::builder("GOOG")
        .key(RequestKey::new("K-DELAY"))
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let report = harness.place_order(&request).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(report.get_char(tag::EXEC_TYPE), Some('2'));

    harness.shutdown().await;
}
