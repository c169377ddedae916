mod balance;
mod category;
mod transaction;

pub use balance::Balance;
pub use category::Category;
pub use transaction::{Transaction, TransactionType};
