mod selection;
mod store;

pub use selection::PlatformSelection;
pub use store::{GenerationStore, PlatformState, StoreEvent};
