use error_stack::Report;
use time::OffsetDateTime;

use crate::entity::{CreatedAt, IsDiscarded, UpdatedAt, Version};
use crate::KernelError;

/// Version counter, discard flag and timestamps shared by every mutable entity.
///
/// Entities hold one of these next to their own fields and route every
/// effective mutation through [`Lifecycle::increment_version`].
///
/// A restored lifecycle also remembers the version it was loaded at, which
/// repositories compare against the stored row. It takes no part in equality.
#[derive(Debug, Clone)]
pub struct Lifecycle<T> {
    version: Version<T>,
    discarded: IsDiscarded<T>,
    created_at: CreatedAt<T>,
    updated_at: UpdatedAt<T>,
    persisted_version: Option<Version<T>>,
}

impl<T> PartialEq for Lifecycle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.version.as_ref() == other.version.as_ref()
            && self.discarded.as_ref() == other.discarded.as_ref()
            && self.created_at.as_ref() == other.created_at.as_ref()
            && self.updated_at.as_ref() == other.updated_at.as_ref()
    }
}

impl<T> Eq for Lifecycle<T> {}

impl<T> Lifecycle<T> {
    pub fn new() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            version: Version::initial(),
            discarded: IsDiscarded::new(false),
            created_at: CreatedAt::new(now),
            updated_at: UpdatedAt::new(now),
            persisted_version: None,
        }
    }

    pub fn restore(
        version: Version<T>,
        discarded: IsDiscarded<T>,
        created_at: CreatedAt<T>,
        updated_at: UpdatedAt<T>,
    ) -> Self {
        Self {
            persisted_version: Some(Version::new(*version.as_ref())),
            version,
            discarded,
            created_at,
            updated_at,
        }
    }

    pub fn version(&self) -> &Version<T> {
        &self.version
    }

    /// Version the entity had when it was restored. `None` until it has been
    /// loaded from storage.
    pub fn persisted_version(&self) -> Option<&Version<T>> {
        self.persisted_version.as_ref()
    }

    pub fn is_discarded(&self) -> bool {
        *self.discarded.as_ref()
    }

    pub fn created_at(&self) -> &CreatedAt<T> {
        &self.created_at
    }

    pub fn updated_at(&self) -> &UpdatedAt<T> {
        &self.updated_at
    }

    pub fn check_not_discarded(&self) -> error_stack::Result<(), KernelError> {
        if self.is_discarded() {
            return Err(Report::new(KernelError::Discarded)
                .attach_printable(format!("{} has been discarded", entity_name::<T>())));
        }
        Ok(())
    }

    pub fn increment_version(&mut self) {
        self.version = self.version.next();
        self.updated_at = UpdatedAt::new(OffsetDateTime::now_utc());
    }

    /// Marks the owner as discarded. Returns `false` when it already was.
    pub fn discard(&mut self) -> bool {
        if self.is_discarded() {
            return false;
        }
        self.discarded = IsDiscarded::new(true);
        self.increment_version();
        true
    }
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Assigns `value` to `slot` only when they differ by value.
pub(crate) fn replace_if_changed<V: PartialEq>(slot: &mut V, value: V) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn entity_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}
