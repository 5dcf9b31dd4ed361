//! Hand-written vendor overrides
//!
//! Overrides cover what a declarative query tree can't express, such as
//! correlating several tables. They are registered by class name in an
//! [`OverrideRegistry`](crate::communicator::OverrideRegistry).

pub mod timos_sas;

pub use timos_sas::TimosSasCommunicator;
