//! Regional pricing: strategy chain, resolver, expiring cache and the
//! background refresh that keeps it warm.

pub mod cache;
pub mod resolver;
pub mod scheduler;
pub mod strategy;

pub use cache::{PricingCache, DEFAULT_EXPIRY_DAYS};
pub use resolver::{PricingResolver, ResolveError};
pub use scheduler::{RefreshReport, RefreshScheduler, ScheduleHandles, SchedulerConfig, SchedulerError};
pub use strategy::{LaborStrategyChain, ResolvedRate};
