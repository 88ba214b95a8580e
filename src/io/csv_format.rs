//! CSV format handling for reward events and summary output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvEventRecord structure for deserialization
//! - Conversion from CSV records to domain types
//! - Per-user summary output serialization
//!
//! All functions are pure (no I/O beyond the writer handed in) for easy
//! testing. Presence checks for kind-specific fields are the engine's job;
//! the converter only validates what every event needs.

use crate::core::UserSummary;
use crate::types::{EventKind, EventRecord, RewardError, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns:
/// `type,user,counterparty,points,amount,tx,expiry_days,ref,description`.
/// Most fields are optional because each event kind uses a different
/// subset; the engine rejects events missing a field their kind requires.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvEventRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: UserId,
    #[serde(default)]
    pub counterparty: Option<UserId>,
    #[serde(default)]
    pub points: Option<u64>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub tx: Option<TransactionId>,
    #[serde(default)]
    pub expiry_days: Option<i64>,
    #[serde(rename = "ref", default)]
    pub reference: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Convert a CsvEventRecord to an EventRecord
///
/// Parses the event type string into an [`EventKind`] and the amount
/// string, if present, into a [`Decimal`].
///
/// # Errors
///
/// - `InvalidEventType` if the type column is not a known event kind
/// - `InvalidAmount` if the amount column is present but not a number
pub fn convert_event_record(csv_record: CsvEventRecord) -> Result<EventRecord, RewardError> {
    let kind = match csv_record.kind.to_lowercase().as_str() {
        "booking" => EventKind::Booking,
        "reservation" => EventKind::Reservation,
        "earn" => EventKind::Earn,
        "redeem" => EventKind::Redeem,
        "transfer" => EventKind::Transfer,
        "reverse" => EventKind::Reverse,
        other => return Err(RewardError::invalid_event_type(other)),
    };

    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => {
            let parsed = Decimal::from_str(amount_str.trim())
                .map_err(|_| RewardError::invalid_amount(amount_str, csv_record.user))?;
            Some(parsed)
        }
        _ => None,
    };

    Ok(EventRecord {
        kind,
        user: csv_record.user,
        counterparty: csv_record.counterparty,
        points: csv_record.points,
        amount,
        tx: csv_record.tx,
        expiry_days: csv_record.expiry_days,
        reference: csv_record.reference,
        description: csv_record.description.unwrap_or_default(),
    })
}

/// Write per-user summaries to CSV format
///
/// Columns: `user,balance,tier,discount_percent`. Summaries are written in
/// the order given; the engines already sort them by user ID.
///
/// # Errors
///
/// Returns `IoError` if a write fails.
pub fn write_summaries_csv(
    summaries: &[UserSummary],
    output: &mut dyn Write,
) -> Result<(), RewardError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["user", "balance", "tier", "discount_percent"])?;

    for summary in summaries {
        writer.write_record(&[
            summary.user.to_string(),
            summary.balance.to_string(),
            summary.tier.clone(),
            summary.discount_percent.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(kind: &str) -> CsvEventRecord {
        CsvEventRecord {
            kind: kind.to_string(),
            user: 1,
            counterparty: None,
            points: None,
            amount: None,
            tx: None,
            expiry_days: None,
            reference: None,
            description: None,
        }
    }

    #[rstest]
    #[case("booking", EventKind::Booking)]
    #[case("reservation", EventKind::Reservation)]
    #[case("earn", EventKind::Earn)]
    #[case("redeem", EventKind::Redeem)]
    #[case("transfer", EventKind::Transfer)]
    #[case("reverse", EventKind::Reverse)]
    #[case::case_insensitive("BOOKING", EventKind::Booking)]
    fn test_convert_event_kinds(#[case] kind: &str, #[case] expected: EventKind) {
        let result = convert_event_record(record(kind)).unwrap();
        assert_eq!(result.kind, expected);
    }

    #[test]
    fn test_convert_unknown_kind_fails() {
        let result = convert_event_record(record("withdrawal"));

        assert!(matches!(
            result.unwrap_err(),
            RewardError::InvalidEventType { .. }
        ));
    }

    #[rstest]
    #[case("199.99", Some(Decimal::new(19999, 2)))]
    #[case("  100.0  ", Some(Decimal::new(1000, 1)))]
    #[case("", None)]
    #[case("   ", None)]
    fn test_convert_amount_parsing(#[case] amount: &str, #[case] expected: Option<Decimal>) {
        let mut csv_record = record("booking");
        csv_record.amount = Some(amount.to_string());

        let result = convert_event_record(csv_record).unwrap();
        assert_eq!(result.amount, expected);
    }

    #[test]
    fn test_convert_invalid_amount_fails() {
        let mut csv_record = record("booking");
        csv_record.amount = Some("not_a_number".to_string());

        let result = convert_event_record(csv_record);

        assert!(matches!(
            result.unwrap_err(),
            RewardError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn test_convert_carries_optional_fields() {
        let csv_record = CsvEventRecord {
            kind: "transfer".to_string(),
            user: 1,
            counterparty: Some(2),
            points: Some(300),
            amount: None,
            tx: None,
            expiry_days: Some(90),
            reference: None,
            description: Some("gift".to_string()),
        };

        let result = convert_event_record(csv_record).unwrap();

        assert_eq!(result.counterparty, Some(2));
        assert_eq!(result.points, Some(300));
        assert_eq!(result.expiry_days, Some(90));
        assert_eq!(result.description, "gift");
    }

    #[rstest]
    #[case::empty(vec![], "user,balance,tier,discount_percent\n")]
    #[case::single(
        vec![UserSummary {
            user: 1,
            balance: 500,
            tier: "Silver".to_string(),
            discount_percent: 5,
        }],
        "user,balance,tier,discount_percent\n1,500,Silver,5\n"
    )]
    #[case::multiple(
        vec![
            UserSummary {
                user: 1,
                balance: 1500,
                tier: "Gold".to_string(),
                discount_percent: 10,
            },
            UserSummary {
                user: 2,
                balance: 6000,
                tier: "Platinum".to_string(),
                discount_percent: 15,
            },
        ],
        "user,balance,tier,discount_percent\n1,1500,Gold,10\n2,6000,Platinum,15\n"
    )]
    fn test_write_summaries_csv(#[case] summaries: Vec<UserSummary>, #[case] expected: &str) {
        let mut output = Vec::new();
        write_summaries_csv(&summaries, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
