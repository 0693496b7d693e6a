use uuid::Uuid;
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Fromln, AsRefln)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new(id: impl Into<Uuid>) -> Self {
        Self(id.into())
    }
}
