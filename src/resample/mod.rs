pub use rand::Rng;

/// A resampling scheme: turns a `T` into a stream of resamples.
pub trait Re<T> {
    /// What one resample looks like.
    type Item;
    /// Stream of resamples of `t`.
    fn re(&self, t: &T) -> impl Iterator<Item = Self::Item>;
}

mod multinomial;

pub use multinomial::{Multinomial, MultinomialIter, draw_weights};
