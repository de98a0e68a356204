//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod inventory_dto;
pub mod pool_dto;

pub use common_dto::*;
pub use inventory_dto::*;
pub use pool_dto::*;
