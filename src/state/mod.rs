// Live state store and local alert derivation

mod alerts;
mod deriver;
mod snapshot;
mod store;

pub use alerts::{AlertLog, UpsertOutcome};
pub use deriver::{AlertDeriver, ConditionState, FirefighterConditions};
pub use snapshot::{LiveSnapshot, StoreChange};
pub use store::{LiveStore, StoreConfig};
