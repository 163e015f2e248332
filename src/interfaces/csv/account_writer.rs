use crate::domain::account::Account;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct AccountRow<'a> {
    account: &'a str,
    user: &'a str,
    balance: String,
}

/// Writes account states as CSV with the header `account,user,balance`.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts<I>(&mut self, accounts: I) -> Result<()>
    where
        I: IntoIterator<Item = Account>,
    {
        let mut wrote_any = false;
        for account in accounts {
            self.writer.serialize(AccountRow {
                account: account.number.as_str(),
                user: account.owner.as_str(),
                balance: account.balance.to_string(),
            })?;
            wrote_any = true;
        }
        if !wrote_any {
            self.writer.write_record(["account", "user", "balance"])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountNumber;
    use crate::domain::user::UserId;
    use chrono::Utc;

    #[test]
    fn test_writes_header_and_rows() {
        let account = Account::open(
            AccountNumber::from_sequence(1),
            UserId::new("12345678901"),
            Utc::now(),
        );
        let mut out = Vec::new();
        AccountWriter::new(&mut out)
            .write_accounts(vec![account])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "account,user,balance\n0987654321000001,12345678901,0.00\n"
        );
    }

    #[test]
    fn test_header_only_when_empty() {
        let mut out = Vec::new();
        AccountWriter::new(&mut out)
            .write_accounts(Vec::new())
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "account,user,balance\n");
    }
}
