use std::collections::BTreeMap;

use tracing::debug;

use crate::intelligence::types::{SpendRecord, Transaction};

/// How a source encodes money leaving the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignConvention {
    NegativeIsSpend,
    PositiveIsSpend,
}

impl SignConvention {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NegativeIsSpend => "negative_is_spend",
            Self::PositiveIsSpend => "positive_is_spend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "negative_is_spend" => Some(Self::NegativeIsSpend),
            "positive_is_spend" => Some(Self::PositiveIsSpend),
            _ => None,
        }
    }

    /// More than half of the rows negative means the source records spend as
    /// negative numbers. An empty batch falls back to positive.
    pub fn infer(transactions: &[Transaction]) -> Self {
        let counts = SignCounts::from_amounts(transactions.iter().map(|row| row.amount));
        let convention = counts.convention();
        debug!(
            negative_count = counts.negative_count,
            total_count = counts.total_count,
            convention = convention.as_str(),
            "inferred amount sign convention"
        );
        convention
    }

    /// Under `NegativeIsSpend` refunds also count as spend; under
    /// `PositiveIsSpend` credits clamp to zero.
    pub fn spend(self, amount: f64) -> f64 {
        match self {
            Self::NegativeIsSpend => amount.abs(),
            Self::PositiveIsSpend => {
                if amount > 0.0 {
                    amount
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SignCounts {
    pub(crate) negative_count: usize,
    pub(crate) total_count: usize,
}

impl SignCounts {
    pub(crate) fn from_amounts<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut counts = Self::default();
        for amount in amounts {
            counts.total_count += 1;
            if amount < 0.0 {
                counts.negative_count += 1;
            }
        }
        counts
    }

    pub(crate) fn negative_ratio(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        (self.negative_count as f64) / (self.total_count as f64)
    }

    pub(crate) fn convention(&self) -> SignConvention {
        if self.negative_ratio() > 0.5 {
            SignConvention::NegativeIsSpend
        } else {
            SignConvention::PositiveIsSpend
        }
    }
}

/// Derives spend records without touching the caller's transactions.
pub fn with_spend(transactions: &[Transaction], convention: SignConvention) -> Vec<SpendRecord> {
    transactions
        .iter()
        .map(|row| SpendRecord {
            date: row.date,
            merchant: row.merchant.clone(),
            spend: convention.spend(row.amount),
        })
        .collect()
}

/// Infers the convention from this batch alone and applies it.
pub fn with_inferred_spend(transactions: &[Transaction]) -> Vec<SpendRecord> {
    with_spend(transactions, SignConvention::infer(transactions))
}

/// Groups rows with positive spend under `key_of`, each group sorted by date.
/// Rows sharing a date keep their input order.
pub(crate) fn positive_spend_groups<F>(
    records: &[SpendRecord],
    key_of: F,
) -> BTreeMap<String, Vec<SpendRecord>>
where
    F: Fn(&SpendRecord) -> String,
{
    let mut groups: BTreeMap<String, Vec<SpendRecord>> = BTreeMap::new();
    for record in records {
        if record.spend.is_nan() || record.spend <= 0.0 {
            continue;
        }
        groups.entry(key_of(record)).or_default().push(record.clone());
    }

    for rows in groups.values_mut() {
        rows.sort_by_key(|row| row.date);
    }
    groups
}
