use std::marker::PhantomData;
use vodca::{AsRefln, Fromln};

/// Optimistic-concurrency marker of an entity. Starts at 1 and only grows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln)]
pub struct Version<T>(i64, PhantomData<T>);

impl<T> Version<T> {
    pub fn new(version: impl Into<i64>) -> Self {
        Self(version.into(), PhantomData)
    }

    pub fn initial() -> Self {
        Self::new(1)
    }

    pub(crate) fn next(&self) -> Self {
        Self::new(self.0 + 1)
    }
}
