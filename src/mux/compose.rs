//! Mux composition helpers.
//!
//! `every` builds AND-groups and `some` builds OR-groups out of whole
//! muxes, so gate conditions can be assembled from smaller muxes and then
//! nested (an OR inside an AND composes as expected).

use std::sync::Arc;

use super::Mux;
use crate::layer::Request;

/// A mux matching only when every given mux matches.
///
/// The matcher lists of the given muxes are merged into the new mux; their
/// layers are discarded.
pub fn every<I>(muxes: I) -> Mux
where
    I: IntoIterator<Item = Mux>,
{
    let mut combined = Mux::new();
    for mux in muxes {
        combined = combined.every(mux.matchers().iter().cloned());
    }
    combined
}

/// A mux matching when at least one of the given muxes matches.
///
/// The group becomes a single synthesized matcher, so it can be nested
/// inside an AND-group.
pub fn some<I>(muxes: I) -> Mux
where
    I: IntoIterator<Item = Mux>,
{
    let muxes: Vec<Mux> = muxes.into_iter().collect();
    Mux::new().add_matcher(Arc::new(move |req: &Request| {
        muxes.iter().any(|m| m.matches(req))
    }))
}
