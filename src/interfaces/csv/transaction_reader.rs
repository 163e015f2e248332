use crate::domain::transaction::TransactionRequest;
use crate::error::{BankError, Result};
use std::io::Read;

/// Reads teller transaction requests from a CSV source.
///
/// Expected columns are `type, account, to_account, amount`; `to_account` may be left empty for
/// deposits and withdrawals. This reader wraps `csv::Reader` and provides an iterator over
/// `Result<TransactionRequest>`. It handles whitespace trimming and flexible record lengths
/// automatically.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransactionReader<R> {
    /// Creates a new `TransactionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes requests.
    ///
    /// A malformed row yields an error for that row only; reading continues with the next one.
    pub fn requests(self) -> impl Iterator<Item = Result<TransactionRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(BankError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountNumber;
    use crate::domain::transaction::TransactionType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "type, account, to_account, amount\n\
                    deposit, 0987654321000001, , 100.00\n\
                    transfer, 0987654321000001, 0987654321000002, 20\n\
                    withdrawal, 0987654321000002,, 5.5";
        let reader = TransactionReader::new(data.as_bytes());
        let results: Vec<Result<TransactionRequest>> = reader.requests().collect();

        assert_eq!(results.len(), 3);
        let deposit = results[0].as_ref().unwrap();
        assert_eq!(deposit.kind, TransactionType::Deposit);
        assert_eq!(deposit.account, Some(AccountNumber::from_sequence(1)));
        assert_eq!(deposit.to_account, None);
        assert_eq!(deposit.amount, dec!(100));

        let transfer = results[1].as_ref().unwrap();
        assert_eq!(transfer.to_account, Some(AccountNumber::from_sequence(2)));
        assert_eq!(results[2].as_ref().unwrap().amount, dec!(5.5));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "type, account, to_account, amount\n\
                    refund, 0987654321000001, , 1.0\n\
                    deposit, 0987654321000001, , lots\n\
                    deposit, 0987654321000001, , 1.0";
        let reader = TransactionReader::new(data.as_bytes());
        let results: Vec<Result<TransactionRequest>> = reader.requests().collect();

        assert!(matches!(results[0], Err(BankError::Csv(_))));
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
