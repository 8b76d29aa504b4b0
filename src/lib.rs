pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use auth::{Caller, HttpIdentityProvider, IdentityError, IdentityProvider, MockIdentityProvider};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    CommissionRequest, Currency, PartnerId, PartnerProfile, RequestStatus, Role, Sale, SaleType,
    SettlementStatus, TimeMs,
};
pub use engine::Aggregation;
pub use error::AppError;
pub use orchestration::{CommissionError, CommissionService};
