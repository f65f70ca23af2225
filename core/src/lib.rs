// core/src/lib.rs

//! sealcart-flow: the step pipeline engine that the sealcart checkout and
//! webhook reconciliation flows are written in.
//!
//! A pipeline is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers; a handler returns
//! [`PipelineControl::Continue`] to keep going or [`PipelineControl::Stop`]
//! to end the run early. A step can also host conditional scopes: scoped
//! sub-pipelines over their own context, chosen by a predicate on the
//! parent context. [`FlowRegistry`] dispatches a run to the pipeline
//! registered for the context's data type.

pub mod conditional;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::conditional::builder::{ConditionalScopeBuilder, ConditionalScopeConfigurator};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::StepDef;
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::Pipeline;
pub use crate::registry::FlowRegistry;
