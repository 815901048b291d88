pub mod analysis;
pub mod format;
pub mod ledger;
pub mod streak;
pub mod time;
