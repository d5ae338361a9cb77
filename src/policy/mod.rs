//! Policy Module
//!
//! Resource classes, their caching policies and the URL classifier.

mod classifier;
mod strategy;

pub use classifier::{Classifier, ResourceClass, ResourcePolicy, UrlPattern};
pub use strategy::Strategy;
