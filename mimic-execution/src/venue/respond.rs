use super::stub::ResponseGenerator;
use chrono::Utc;
use mimic_message::{envelope::MessageEnvelope, tag};
use rust_decimal::Decimal;
use smol_str::{SmolStr, format_smolstr};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Execution-report skeleton echoing the identifying fields of the inbound request.
///
/// Each generator owns its own order-id sequence, so a reset registry restarts numbering
/// without any global state.
fn execution_report(request: &MessageEnvelope, sequence: &AtomicU64) -> MessageEnvelope {
    let sequence = sequence.fetch_add(1, Ordering::Relaxed) + 1;

    let mut report = MessageEnvelope::new(tag::msg_type::EXECUTION_REPORT);
    report
        .set_text(tag::ORDER_ID, format_smolstr!("SIM-{sequence}"))
        .set_text(tag::EXEC_ID, format_smolstr!("EXEC-{sequence}"))
        .set_timestamp(tag::TRANSACT_TIME, Utc::now());

    for copied in [
        tag::CL_ORD_ID,
        tag::SYMBOL,
        tag::SIDE,
        tag::ACCOUNT,
        tag::CURRENCY,
    ] {
        if let Some(value) = request.get(copied) {
            report.set(copied, value.clone());
        }
    }

    report
}

fn order_qty(request: &MessageEnvelope) -> Decimal {
    request.get_decimal(tag::ORDER_QTY).unwrap_or(Decimal::ZERO)
}

/// Acknowledge the order as accepted (exec-type '0').
pub fn ack() -> ResponseGenerator {
    let sequence = Arc::new(AtomicU64::new(0));

    Arc::new(move |request| {
        let mut report = execution_report(request, &sequence);
        report
            .set_char(tag::EXEC_TYPE, '0')
            .set_char(tag::ORD_STATUS, '0')
            .set_decimal(tag::CUM_QTY, Decimal::ZERO)
            .set_decimal(tag::LEAVES_QTY, order_qty(request));
        Some(report)
    })
}

/// Fill the full order quantity at `price` (exec-type '2').
pub fn fill(price: Decimal) -> ResponseGenerator {
    let sequence = Arc::new(AtomicU64::new(0));

    Arc::new(move |request| {
        let quantity = order_qty(request);

        let mut report = execution_report(request, &sequence);
        report
            .set_char(tag::EXEC_TYPE, '2')
            .set_char(tag::ORD_STATUS, '2')
            .set_decimal(tag::LAST_PX, price)
            .set_decimal(tag::LAST_QTY, quantity)
            .set_decimal(tag::CUM_QTY, quantity)
            .set_decimal(tag::LEAVES_QTY, Decimal::ZERO)
            .set_decimal(tag::AVG_PX, price);
        Some(report)
    })
}

/// Fill `quantity` of the order at `price`, leaving the remainder open (exec-type '1').
pub fn partial_fill(price: Decimal, quantity: u64) -> ResponseGenerator {
    let sequence = Arc::new(AtomicU64::new(0));

    Arc::new(move |request| {
        let filled = Decimal::from(quantity);
        let leaves = (order_qty(request) - filled).max(Decimal::ZERO);

        let mut report = execution_report(request, &sequence);
        report
            .set_char(tag::EXEC_TYPE, '1')
            .set_char(tag::ORD_STATUS, '1')
            .set_decimal(tag::LAST_PX, price)
            .set_decimal(tag::LAST_QTY, filled)
            .set_decimal(tag::CUM_QTY, filled)
            .set_decimal(tag::LEAVES_QTY, leaves)
            .set_decimal(tag::AVG_PX, price);
        Some(report)
    })
}

/// Reject the order with the venue's reason `text` (exec-type '8').
pub fn reject<S: Into<SmolStr>>(text: S) -> ResponseGenerator {
    let text = text.into();
    let sequence = Arc::new(AtomicU64::new(0));

    Arc::new(move |request| {
        let mut report = execution_report(request, &sequence);
        report
            .set_char(tag::EXEC_TYPE, '8')
            .set_char(tag::ORD_STATUS, '8')
            .set_decimal(tag::CUM_QTY, Decimal::ZERO)
            .set_decimal(tag::LEAVES_QTY, Decimal::ZERO)
            .set_text(tag::TEXT, text.clone());
        Some(report)
    })
}

/// Report the order as cancelled (exec-type '4').
pub fn canceled() -> ResponseGenerator {
    let sequence = Arc::new(AtomicU64::new(0));

    Arc::new(move |request| {
        let mut report = execution_report(request, &sequence);
        report
            .set_char(tag::EXEC_TYPE, '4')
            .set_char(tag::ORD_STATUS, '4')
            .set_decimal(tag::LEAVES_QTY, Decimal::ZERO);
        Some(report)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limit_order() -> MessageEnvelope {
        MessageEnvelope::new(tag::msg_type::NEW_ORDER_SINGLE)
            .with_text(tag::CL_ORD_ID, "ORD-1")
            .with_text(tag::SYMBOL, "AAPL")
            .with_char(tag::SIDE, '1')
            .with_int(tag::ORDER_QTY, 100)
            .with_decimal(tag::PRICE, dec!(9999))
    }

    #[test]
    fn test_reject_reports_exec_type_8_with_text() {
        let generator = reject("Fat-finger price check failed");
        let report = generator(&limit_order()).unwrap();

        assert_eq!(report.msg_type(), Some(tag::msg_type::EXECUTION_REPORT));
        assert_eq!(report.get_char(tag::EXEC_TYPE), Some('8'));
        assert_eq!(
            report.get_text(tag::TEXT),
            Some("Fat-finger price check failed")
        );
        assert_eq!(report.get_text(tag::CL_ORD_ID), Some("ORD-1"));
        assert_eq!(report.get_text(tag::SYMBOL), Some("AAPL"));
    }

    #[test]
    fn test_fill_reports_full_quantity_at_price() {
        let generator = fill(dec!(180.5));
        let report = generator(&limit_order()).unwrap();

        assert_eq!(report.get_char(tag::EXEC_TYPE), Some('2'));
        assert_eq!(report.get_decimal(tag::LAST_PX), Some(dec!(180.5)));
        assert_eq!(report.get_decimal(tag::CUM_QTY), Some(dec!(100)));
        assert_eq!(report.get_decimal(tag::LEAVES_QTY), Some(Decimal::ZERO));
    }

    #[test]
    fn test_partial_fill_tracks_leaves_quantity() {
        let generator = partial_fill(dec!(180.5), 40);
        let report = generator(&limit_order()).unwrap();

        assert_eq!(report.get_char(tag::EXEC_TYPE), Some('1'));
        assert_eq!(report.get_decimal(tag::LAST_QTY), Some(dec!(40)));
        assert_eq!(report.get_decimal(tag::LEAVES_QTY), Some(dec!(60)));
    }

    #[test]
    fn test_order_ids_advance_per_generator() {
        let generator = ack();

        let first = generator(&limit_order()).unwrap();
        let second = generator(&limit_order()).unwrap();

        assert_eq!(first.get_text(tag::ORDER_ID), Some("SIM-1"));
        assert_eq!(second.get_text(tag::ORDER_ID), Some("SIM-2"));
    }
}
