use std::marker::PhantomData;
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln)]
pub struct IsDiscarded<T>(bool, PhantomData<T>);

impl<T> IsDiscarded<T> {
    pub fn new(value: impl Into<bool>) -> Self {
        IsDiscarded(value.into(), PhantomData)
    }
}
