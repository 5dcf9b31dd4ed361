//! Remote query layer
//!
//! - [`QueryClient`]: transport contract (walk / get)
//! - [`PollContext`]: cancellation, deadline and read limits for one poll
//! - [`QueryTree`]: labeled query definitions and the recursive reader
//! - [`PropertyGroups`]: grouped rows ordered by index, decodable into records
//! - [`OperatorPipeline`]: value normalization applied per leaf

pub mod client;
pub mod context;
pub mod group;
pub mod mock;
pub mod oid;
pub mod operators;
pub mod reader;

pub use client::{QueryClient, Response};
pub use context::PollContext;
pub use group::{PropertyGroup, PropertyGroups};
pub use oid::Oid;
pub use operators::{Operator, OperatorPipeline, ValueOperator};
pub use reader::{Cell, GroupedRows, QueryLeaf, QueryNode, QueryTree, Row};
