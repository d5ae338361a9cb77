//! Background Tasks Module
//!
//! Contains tasks that outlive the request that started them.
//!
//! # Tasks
//! - Revalidation: refreshes cache entries served by stale-while-revalidate

mod revalidate;

pub use revalidate::Revalidator;
