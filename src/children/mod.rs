// Child creation: the pipeline graph and the policy built on it

pub mod pipeline;
pub mod policy;

pub use pipeline::{Pipeline, PipelineFilters, PipelineGraph};
pub use policy::{suggest, suggested_children, ChildSuggestions, SuggestedChild};
