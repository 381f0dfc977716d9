//! Human readable document numbers
//!
//! Numbers are `prefix + zero padded sequence`. The next sequence is the
//! highest numeric suffix among existing numbers with the same prefix plus
//! one; suffixes that are not purely numeric are ignored. Callers hold a
//! database lock while reading existing numbers and inserting the new one.

use chrono::NaiveDate;

use crate::models::BillKind;

/// Lock keys for `pg_advisory_xact_lock(hashtext(..))`
pub const TRANSFER_NUMBER_LOCK: &str = "stock_transfer_number";
pub const INVOICE_NUMBER_LOCK: &str = "customer_bill_invoice_no";
pub const CUSTOMER_CODE_LOCK: &str = "customer_code";

/// Next sequence after the existing numbers sharing `prefix`
pub fn next_sequence<'a, I>(existing: I, prefix: &str) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|number| number.strip_prefix(prefix))
        .filter(|suffix| !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// `ST-YYYYMMDD-`
pub fn transfer_prefix(date: NaiveDate) -> String {
    format!("ST-{}-", date.format("%Y%m%d"))
}

/// `ST-YYYYMMDD-NNN`
pub fn transfer_number(date: NaiveDate, sequence: u32) -> String {
    format!("{}{:03}", transfer_prefix(date), sequence)
}

/// `INV-YYMM` or `ORD-YYMM`
pub fn bill_prefix(kind: BillKind, date: NaiveDate) -> String {
    format!("{}-{}", kind.prefix(), date.format("%y%m"))
}

/// `INV-YYMM####` or `ORD-YYMM####`
pub fn bill_number(kind: BillKind, date: NaiveDate, sequence: u32) -> String {
    format!("{}{:04}", bill_prefix(kind, date), sequence)
}

pub const CUSTOMER_CODE_PREFIX: &str = "CUST";

/// `CUST0001`; sequences past 9999 keep all their digits
pub fn customer_code(sequence: u32) -> String {
    format!("{}{:04}", CUSTOMER_CODE_PREFIX, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_number_of_the_day() {
        let prefix = transfer_prefix(date(2024, 1, 15));
        assert_eq!(next_sequence(std::iter::empty(), &prefix), 1);
        assert_eq!(transfer_number(date(2024, 1, 15), 1), "ST-20240115-001");
    }

    #[test]
    fn test_next_after_max() {
        let prefix = transfer_prefix(date(2024, 1, 15));
        let existing = ["ST-20240115-001", "ST-20240115-007", "ST-20240115-003", "ST-20240114-099"];
        assert_eq!(next_sequence(existing, &prefix), 8);
    }

    #[test]
    fn test_non_numeric_suffixes_ignored() {
        let existing = ["INV-2401CUSTOM", "INV-24010002", "INV-2401"];
        assert_eq!(next_sequence(existing, "INV-2401"), 3);
    }

    #[test]
    fn test_bill_numbers() {
        let d = date(2024, 3, 9);
        assert_eq!(bill_number(BillKind::Invoice, d, 12), "INV-24030012");
        assert_eq!(bill_number(BillKind::Order, d, 1), "ORD-24030001");
    }

    #[test]
    fn test_customer_codes() {
        assert_eq!(customer_code(1), "CUST0001");
        assert_eq!(customer_code(12345), "CUST12345");
        assert_eq!(next_sequence(["CUST0009", "CUST0010"], CUSTOMER_CODE_PREFIX), 11);
        assert_eq!(next_sequence(["CUST9999"], CUSTOMER_CODE_PREFIX), 10000);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A generated number never collides with an existing one
        #[test]
        fn prop_next_number_is_unused(seqs in prop::collection::vec(1u32..5000, 0..30)) {
            let d = date(2024, 6, 1);
            let existing: Vec<String> = seqs.iter().map(|s| bill_number(BillKind::Invoice, d, *s)).collect();
            let prefix = bill_prefix(BillKind::Invoice, d);
            let next = next_sequence(existing.iter().map(String::as_str), &prefix);
            let candidate = bill_number(BillKind::Invoice, d, next);
            prop_assert!(!existing.contains(&candidate));
            prop_assert_eq!(next, seqs.iter().max().map_or(1, |m| m + 1));
        }
    }
}
