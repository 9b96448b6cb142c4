// services/dispatch-dash/src/lib.rs
//
// Delivery dispatch dashboard: feed store, polling, derived views and
// route selection shared by the terminal front end

pub mod adapter;
pub mod api;
pub mod mock;
pub mod nav;
pub mod poller;
pub mod screens;
pub mod selection;
pub mod status;
pub mod store;
pub mod transform;

#[cfg(test)]
mod testing;

pub use adapter::DataSourceAdapter;
pub use api::{DeliveryApi, HttpDeliveryApi};
pub use mock::MockDeliveryApi;
pub use store::DashboardStore;
