use anyhow::Result;
use rust_decimal::Decimal;

use super::{Transaction, TransactionType};

/// Income/outcome summary derived from a set of transactions. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub income: Decimal,
    pub outcome: Decimal,
    pub total: Decimal,
}

impl Balance {
    /// Fails only when a sum leaves the range `Decimal` can represent.
    pub fn from_transactions(transactions: &[Transaction]) -> Result<Self> {
        let mut income = Decimal::ZERO;
        let mut outcome = Decimal::ZERO;

        for txn in transactions {
            let sum = match txn.kind {
                TransactionType::Income => &mut income,
                TransactionType::Outcome => &mut outcome,
            };
            *sum = sum.checked_add(txn.value).ok_or_else(|| {
                anyhow::anyhow!("{} total overflowed at transaction {:?}", txn.kind, txn.id)
            })?;
        }

        let total = income
            .checked_sub(outcome)
            .ok_or_else(|| anyhow::anyhow!("Balance total overflowed"))?;

        Ok(Self {
            income,
            outcome,
            total,
        })
    }
}
