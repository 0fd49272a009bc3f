//! The leaders clustering pass: greedy clique formation.
//!
//! Two named algorithms, deliberately kept separate because they can produce
//! different clusterings on the same input:
//!
//! - [`ExactFirstFit`] - traverses points in store order and assigns each to
//!   the *first* existing clique (in creation order) whose moving centroid
//!   is within tau; a miss creates a new clique. Order-dependent by design.
//! - [`LeaderWindow`] - traverses points in store order, skipping consumed
//!   ones; each unconsumed point becomes the fixed leader of a new clique
//!   whose membership is carved in one shot from the leader's neighbor
//!   window. Membership is anchored to the leader's neighborhood, not to a
//!   moving centroid.
//!
//! Both passes produce an exact partition of the input indices: no point is
//! omitted, none is assigned twice. Singleton cliques are a valid outcome,
//! as are degenerate clique counts for extreme tau values.

mod exact;
#[cfg(test)]
mod tests;
mod window;

pub use exact::ExactFirstFit;
pub use window::LeaderWindow;
