//! Store seams and the in-memory reference implementations.

mod memory;
mod seed;
mod traits;

pub use memory::{InMemoryBindingStore, InMemoryFailureStore, InMemoryProviderStore};
pub use seed::{MemoryStores, SeedData, ThresholdSeed};
pub use traits::{CronBindingStore, FailureCounterStore, ProviderConfigStore};
