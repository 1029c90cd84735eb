//! # Filter — Which Entities Does a System Want?
//!
//! Every system owns a [`Filter`]: a pair of masks describing the components
//! an entity **must** have (`required`) and **must not** have (`excluded`).
//! The scene checks the filter against an entity's occupancy mask whenever
//! the entity's components change, and attaches or detaches the entity
//! accordingly.
//!
//! A component id can't be in both masks at once — `require` clears the
//! excluded bit and `exclude` clears the required bit, so the last call
//! wins. Bits outside both masks are never examined: an entity may carry
//! any extra components unless the filter says otherwise (see
//! [`FilterBuilder::exclude_not_required`] for the strict-schema mode).
//!
//! Systems declare their filter through [`FilterBuilder`] in
//! [`System::filter`](super::system::System::filter); the builder resolves
//! component types to ids through the scene's registry.

use crate::ecs::mask::Mask;
use crate::ecs::registry::{ComponentId, TypeRegistry};
use crate::error::Error;

/// A required/excluded mask pair with a matching predicate.
#[derive(Clone, Copy, Default, Debug)]
pub struct Filter {
    required: Mask,
    excluded: Mask,
}

impl Filter {
    /// Marks `id` as required (and not excluded).
    pub fn require_id(&mut self, id: ComponentId) {
        self.required.set(id.index());
        self.excluded.clear(id.index());
    }

    /// Marks `id` as excluded (and not required).
    pub fn exclude_id(&mut self, id: ComponentId) {
        self.required.clear(id.index());
        self.excluded.set(id.index());
    }

    /// Removes `id` from both masks.
    pub fn ignore_id(&mut self, id: ComponentId) {
        self.required.clear(id.index());
        self.excluded.clear(id.index());
    }

    /// Excludes every component kind that is not required: the entity must
    /// have exactly the required set and nothing else.
    pub fn exclude_not_required(&mut self) {
        self.excluded = self.required.inverted();
    }

    /// Requires nothing and excludes everything — matches no entity that
    /// owns any component (and only component-less entities otherwise).
    pub fn exclude_all(&mut self) {
        self.required = Mask::EMPTY;
        self.excluded = Mask::ALL;
    }

    /// Returns whether an entity with occupancy `mask` satisfies the filter:
    /// no excluded bit present, every required bit present.
    pub fn check(&self, mask: Mask) -> bool {
        if self.excluded.intersects(mask) {
            return false;
        }
        mask.contains_all(self.required)
    }
}

/// Typed facade over [`Filter`] used while registering a system.
///
/// Resolves component types to ids through the scene's registry, which is
/// why it is handed to [`System::filter`](super::system::System::filter) by
/// the scene rather than constructed by user code. Calls chain:
///
/// ```ignore
/// fn filter(&self, f: &mut FilterBuilder<'_>) -> Result<(), Error> {
///     f.require::<Position>()?.require::<Velocity>()?.exclude::<Frozen>()?;
///     Ok(())
/// }
/// ```
pub struct FilterBuilder<'a> {
    registry: &'a mut TypeRegistry,
    filter: Filter,
}

impl<'a> FilterBuilder<'a> {
    pub(crate) fn new(registry: &'a mut TypeRegistry) -> Self {
        Self {
            registry,
            filter: Filter::default(),
        }
    }

    /// The entity must own a `T` component.
    pub fn require<T: 'static>(&mut self) -> Result<&mut Self, Error> {
        let id = self.registry.component_id::<T>()?;
        self.filter.require_id(id);
        Ok(self)
    }

    /// The entity must not own a `T` component.
    pub fn exclude<T: 'static>(&mut self) -> Result<&mut Self, Error> {
        let id = self.registry.component_id::<T>()?;
        self.filter.exclude_id(id);
        Ok(self)
    }

    /// Drops `T` from both the required and excluded sets.
    pub fn ignore<T: 'static>(&mut self) -> Result<&mut Self, Error> {
        let id = self.registry.component_id::<T>()?;
        self.filter.ignore_id(id);
        Ok(self)
    }

    /// See [`Filter::exclude_not_required`].
    pub fn exclude_not_required(&mut self) -> &mut Self {
        self.filter.exclude_not_required();
        self
    }

    /// See [`Filter::exclude_all`].
    pub fn exclude_all(&mut self) -> &mut Self {
        self.filter.exclude_all();
        self
    }

    pub(crate) fn finish(self) -> Filter {
        self.filter
    }
}
