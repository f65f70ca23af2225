// core/src/conditional/mod.rs

//! Conditional execution of scoped pipelines inside one step of a parent
//! pipeline. Each scope pairs a predicate on the parent context with a
//! `Pipeline<SData, Err>` and an extractor producing its `ContextData<SData>`.

pub mod builder;
pub mod scope;

pub use builder::{ConditionalScopeBuilder, ConditionalScopeConfigurator};
