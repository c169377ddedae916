use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Income,
    Outcome,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Outcome => "outcome",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "outcome" => Some(Self::Outcome),
            _ => None,
        }
    }

    pub fn all() -> &'static [TransactionType] {
        &[Self::Income, Self::Outcome]
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub title: String,
    pub kind: TransactionType,
    pub value: Decimal,
    pub category_id: Option<i64>,
    pub created_at: String,
}

impl Transaction {
    pub fn new(
        title: String,
        kind: TransactionType,
        value: Decimal,
        category_id: Option<i64>,
    ) -> Self {
        Self {
            id: None,
            title,
            kind,
            value,
            category_id,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_outcome(&self) -> bool {
        self.kind == TransactionType::Outcome
    }
}
