// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Component and component-set traits
//!
//! Components are plain data attached to entities; the storage engine moves
//! them as raw bytes and zero-initializes fresh rows, which is why the
//! [`Component`] trait requires [`bytemuck::Pod`]. Tuples of component types
//! form a [`ComponentSet`] (registration, mask, typed column access) and a
//! [`Bundle`] (a set carrying values to write).

use std::marker::PhantomData;
use std::ptr::NonNull;

use bytemuck::Pod;
use smallvec::SmallVec;

use crate::archetype::Archetype;
use crate::mask::ComponentMask;
use crate::registry::ComponentRegistry;

/// Maximum number of components in one tuple set
pub const MAX_SET_COMPONENTS: usize = 8;

/// Component ids of one set, in declaration order
pub type SetIds = SmallVec<[u8; MAX_SET_COMPONENTS]>;

/// Marker trait for components
///
/// Components must be plain data: freely byte-copyable and valid when
/// zero-initialized. The engine never runs constructors or destructors.
pub trait Component: Pod + Send + Sync + 'static {}

/// Automatically implement Component for all valid types
impl<T: Pod + Send + Sync + 'static> Component for T {}

/// Typed view of one raw component column.
///
/// Holds the column's base pointer; the row stride is `size_of::<T>()`.
pub struct ColumnPtr<T> {
    base: NonNull<u8>,
    _marker: PhantomData<*mut T>,
}

impl<T> Clone for ColumnPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ColumnPtr<T> {}

impl<T: Component> ColumnPtr<T> {
    pub(crate) fn new(base: NonNull<u8>) -> Self {
        Self {
            base,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn at(&self, row: usize) -> *mut T {
        // For zero-sized components the offset is always 0 and the base is a
        // well-aligned dangling pointer.
        unsafe { self.base.as_ptr().add(row * std::mem::size_of::<T>()) as *mut T }
    }

    /// # Safety
    /// `row` must be an occupied row of the column's archetype, and the
    /// archetype must outlive `'w` without structural changes.
    #[inline]
    pub(crate) unsafe fn row<'w>(&self, row: usize) -> &'w T {
        &*self.at(row)
    }

    /// # Safety
    /// As [`row`](Self::row), plus no other live reference to the same row.
    #[inline]
    pub(crate) unsafe fn row_mut<'w>(&self, row: usize) -> &'w mut T {
        &mut *self.at(row)
    }

    /// # Safety
    /// `row` must be an allocated row of the column's archetype.
    #[inline]
    pub(crate) unsafe fn write(&self, row: usize, value: T) {
        std::ptr::write(self.at(row), value);
    }
}

/// A tuple of component types
///
/// Provides registration, mask construction, and typed access to the
/// matching columns of an archetype. Implemented for tuples up to arity 8;
/// the empty tuple `()` is the empty set.
pub trait ComponentSet: 'static {
    /// Column base pointers, one per member, in declaration order.
    type Columns: Copy;
    /// Shared references to one row.
    type Refs<'w>;
    /// Mutable references to one row.
    type Muts<'w>;

    /// Register every member, returning ids in declaration order.
    ///
    /// # Panics
    /// Panics if a component type repeats within the set, or on id overflow.
    fn register(registry: &mut ComponentRegistry) -> SetIds;

    /// Combined mask from already-registered ids; `None` if any member is
    /// unknown to the registry.
    fn lookup_mask(registry: &ComponentRegistry) -> Option<ComponentMask>;

    /// Resolve column base pointers in `archetype`; `None` if any member
    /// column is absent.
    fn columns(archetype: &Archetype, registry: &ComponentRegistry) -> Option<Self::Columns>;

    /// # Safety
    /// `row` must be an occupied row of the archetype `columns` was resolved
    /// from, which must stay structurally unchanged for `'w`.
    unsafe fn refs_at<'w>(columns: &Self::Columns, row: usize) -> Self::Refs<'w>;

    /// # Safety
    /// As [`refs_at`](Self::refs_at), plus exclusive access to the archetype
    /// for `'w` and no repeated fetch of the same row.
    unsafe fn muts_at<'w>(columns: &Self::Columns, row: usize) -> Self::Muts<'w>;
}

/// A [`ComponentSet`] carrying values to write
pub trait Bundle: ComponentSet + Sized {
    /// Write the bundle's values into `columns` at `row`.
    ///
    /// # Safety
    /// `row` must be an allocated row of the archetype `columns` was
    /// resolved from.
    unsafe fn write(self, columns: &Self::Columns, row: usize);
}

// DO NOT implement ComponentSet for bare T: Component.
// Single components go through 1-tuples; this keeps tuple impls conflict-free.

macro_rules! impl_component_set {
    ($(($T:ident, $i:tt)),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            type Columns = ($(ColumnPtr<$T>,)+);
            type Refs<'w> = ($(&'w $T,)+);
            type Muts<'w> = ($(&'w mut $T,)+);

            fn register(registry: &mut ComponentRegistry) -> SetIds {
                let mut ids = SetIds::new();
                let mut seen = ComponentMask::EMPTY;
                $(
                    let info = registry.register::<$T>();
                    if seen.contains(info.id) {
                        panic!(
                            "duplicate component type {} in set",
                            std::any::type_name::<$T>()
                        );
                    }
                    seen.set(info.id);
                    ids.push(info.id);
                )+
                ids
            }

            fn lookup_mask(registry: &ComponentRegistry) -> Option<ComponentMask> {
                let mut mask = ComponentMask::EMPTY;
                $(
                    mask.set(registry.lookup::<$T>()?.id);
                )+
                Some(mask)
            }

            fn columns(
                archetype: &Archetype,
                registry: &ComponentRegistry,
            ) -> Option<Self::Columns> {
                Some(($(
                    ColumnPtr::<$T>::new(
                        archetype.column_base(registry.lookup::<$T>()?.id)?.0,
                    ),
                )+))
            }

            #[inline]
            unsafe fn refs_at<'w>(columns: &Self::Columns, row: usize) -> Self::Refs<'w> {
                ($(columns.$i.row(row),)+)
            }

            #[inline]
            unsafe fn muts_at<'w>(columns: &Self::Columns, row: usize) -> Self::Muts<'w> {
                ($(columns.$i.row_mut(row),)+)
            }
        }

        impl<$($T: Component),+> Bundle for ($($T,)+) {
            #[inline]
            unsafe fn write(self, columns: &Self::Columns, row: usize) {
                $(columns.$i.write(row, self.$i);)+
            }
        }
    };
}

// Implement for tuples of 1-8 components
impl_component_set!((A, 0));
impl_component_set!((A, 0), (B, 1));
impl_component_set!((A, 0), (B, 1), (C, 2));
impl_component_set!((A, 0), (B, 1), (C, 2), (D, 3));
impl_component_set!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_component_set!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_component_set!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6));
impl_component_set!(
    (A, 0),
    (B, 1),
    (C, 2),
    (D, 3),
    (E, 4),
    (F, 5),
    (G, 6),
    (H, 7)
);

// The empty set: matches no columns, writes nothing. Used by filters with no
// required components.
impl ComponentSet for () {
    type Columns = ();
    type Refs<'w> = ();
    type Muts<'w> = ();

    fn register(_registry: &mut ComponentRegistry) -> SetIds {
        SetIds::new()
    }

    fn lookup_mask(_registry: &ComponentRegistry) -> Option<ComponentMask> {
        Some(ComponentMask::EMPTY)
    }

    fn columns(_archetype: &Archetype, _registry: &ComponentRegistry) -> Option<Self::Columns> {
        Some(())
    }

    unsafe fn refs_at<'w>(_columns: &Self::Columns, _row: usize) -> Self::Refs<'w> {}

    unsafe fn muts_at<'w>(_columns: &Self::Columns, _row: usize) -> Self::Muts<'w> {}
}

impl Bundle for () {
    unsafe fn write(self, _columns: &Self::Columns, _row: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
    #[repr(C)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[test]
    fn test_register_declaration_order() {
        let mut registry = ComponentRegistry::new();
        let ids = <(Velocity, Position)>::register(&mut registry);
        assert_eq!(ids.as_slice(), &[0, 1]);
        assert_eq!(registry.lookup::<Velocity>().unwrap().id, 0);
        assert_eq!(registry.lookup::<Position>().unwrap().id, 1);
    }

    #[test]
    #[should_panic(expected = "duplicate component type")]
    fn test_duplicate_in_set_panics() {
        let mut registry = ComponentRegistry::new();
        <(Position, Position)>::register(&mut registry);
    }

    #[test]
    fn test_lookup_mask_requires_registration() {
        let mut registry = ComponentRegistry::new();
        assert!(<(Position,)>::lookup_mask(&registry).is_none());
        <(Position,)>::register(&mut registry);
        let mask = <(Position,)>::lookup_mask(&registry).unwrap();
        assert!(mask.contains(0));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn test_empty_set() {
        let mut registry = ComponentRegistry::new();
        assert!(<()>::register(&mut registry).is_empty());
        assert_eq!(<()>::lookup_mask(&registry), Some(ComponentMask::EMPTY));
    }
}
