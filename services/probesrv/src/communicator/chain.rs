//! Ordered fallback over property sources

use std::fmt;

use errors::{ProbeError, Result};
use futures::future::BoxFuture;
use tracing::debug;

/// Position of a source in the resolution chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Declarative query tree of the class
    Class,
    /// Hand-written override for the class
    Override,
    /// Parent communicator
    Inherited,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Class => "class",
            Step::Override => "override",
            Step::Inherited => "inherited",
        })
    }
}

/// Try each source in order until one yields a value
///
/// - `Ok` returns immediately.
/// - `NotImplemented` (or a missing source) moves on to the next source.
/// - `NotFound` is remembered and the next source is tried.
/// - Any other error is returned as-is without trying later sources.
///
/// When no source succeeds the result is `NotImplemented` if every source was
/// missing or unimplemented, `NotFound` otherwise.
pub async fn try_in_order<'a, T, I>(property: &str, steps: I) -> Result<T>
where
    I: IntoIterator<Item = (Step, Option<BoxFuture<'a, Result<T>>>)>,
{
    let mut found_nothing = false;

    for (step, source) in steps {
        let Some(source) = source else {
            continue;
        };
        match source.await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_not_implemented() => {
                debug!(property, %step, "not implemented, trying next source");
            },
            Err(e) if e.is_not_found() => {
                debug!(property, %step, "no value ({}), trying next source", e);
                found_nothing = true;
            },
            Err(e) => return Err(e),
        }
    }

    if found_nothing {
        Err(ProbeError::not_found(format!(
            "failed to get {} through any device class",
            property
        )))
    } else {
        Err(ProbeError::not_implemented(format!(
            "no source implements {}",
            property
        )))
    }
}
