pub mod ledger;
pub mod product;

// Re-export commonly used types
pub use ledger::{Fulfillment, InventoryLedger, LedgerEntry, MutationKind, Receipt};
pub use product::Product;
