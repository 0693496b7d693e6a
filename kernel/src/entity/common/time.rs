use std::marker::PhantomData;

use time::OffsetDateTime;
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln)]
pub struct CreatedAt<T>(OffsetDateTime, PhantomData<T>);

impl<T> CreatedAt<T> {
    pub fn new(time: impl Into<OffsetDateTime>) -> Self {
        Self(time.into(), PhantomData)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln)]
pub struct UpdatedAt<T>(OffsetDateTime, PhantomData<T>);

impl<T> UpdatedAt<T> {
    pub fn new(time: impl Into<OffsetDateTime>) -> Self {
        Self(time.into(), PhantomData)
    }
}

#[cfg(test)]
mod test {
    use time::macros::datetime;

    use super::{CreatedAt, UpdatedAt};

    #[test]
    fn timestamps_expose_their_instant() {
        let created = CreatedAt::<()>::new(datetime!(2024-01-01 8:00 UTC));
        let updated = UpdatedAt::<()>::new(datetime!(2024-01-02 8:00 UTC));
        assert_eq!(created.as_ref(), &datetime!(2024-01-01 8:00 UTC));
        assert!(updated.as_ref() > created.as_ref());
    }
}
