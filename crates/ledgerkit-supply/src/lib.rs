//! ledgerkit-supply — supply-chain status tracking.
//!
//! Products are registered in the lifecycle's initial status and then moved
//! along the edges of a [`TransitionGraph`]. Every accepted move appends a
//! timestamped entry to the product's history; nothing is ever removed.
//!
//! The default lifecycle is
//! `Manufactured -> Shipped -> In-Transit -> Delivered`. Other lifecycles
//! can be built in code or loaded from TOML with [`LifecycleConfig`].

pub mod lifecycle;
pub mod tracker;
pub mod types;

pub use lifecycle::{
    DELIVERED, GraphError, IN_TRANSIT, LifecycleConfig, MANUFACTURED, SHIPPED, TransitionGraph,
};
pub use tracker::{
    ALL_PRODUCTS, EVENT_PRODUCT_REGISTERED, EVENT_PRODUCT_STATUS_UPDATED, SupplyTracker,
};
pub use types::{Product, ProductId, StatusEntry};
