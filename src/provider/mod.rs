//! Provider layer: the capability contract every backend satisfies, the
//! HTTP clients implementing it, and the factory that resolves a model to
//! a live provider instance.

pub mod adapter;
pub mod clients;
pub mod factory;
pub mod model_map;
pub mod traits;

pub use factory::{ProviderCtor, ServiceFactory};
pub use model_map::ModelProviderMap;
pub use traits::ProviderService;
