// ── Reactive alert store ──
//
// Keyed, order-preserving alert storage with push-based change
// notification.

mod collection;
mod data_store;

pub use data_store::AlertStore;
