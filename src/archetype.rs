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

//! Archetype storage: one entity column plus one raw byte column per
//! component id in the mask
//!
//! Columns are manually allocated buffers aligned to the component's native
//! alignment. All columns grow in lockstep and share one row count; capacity
//! doubles on overflow and never shrinks. Component bytes are opaque to the
//! archetype; rows move with `copy_nonoverlapping`.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use smallvec::SmallVec;

use crate::entity::Entity;
use crate::mask::ComponentMask;
use crate::registry::ComponentRegistry;

/// Sentinel in the per-id column table for "id not in mask".
const NO_COLUMN: u16 = u16::MAX;

/// Raw byte buffer holding one component's values, row-indexed.
///
/// The column does not track its own length; the owning archetype's row
/// count is authoritative and identical across all columns. `row_ptr` is the
/// sole access point for row bytes.
pub(crate) struct Column {
    data: NonNull<u8>,
    item_size: usize,
    align: usize,
}

impl Column {
    fn new(item_size: usize, align: usize) -> Self {
        // Well-aligned dangling pointer until the first grow; zero-sized
        // components never allocate.
        Self {
            data: NonNull::new(align as *mut u8).expect("alignment is non-zero"),
            item_size,
            align,
        }
    }

    #[inline]
    pub(crate) fn item_size(&self) -> usize {
        self.item_size
    }

    #[inline]
    pub(crate) fn base(&self) -> NonNull<u8> {
        self.data
    }

    /// Address of the row's bytes. Dereferencing is up to the caller; the
    /// owning archetype guarantees `row` is within capacity.
    #[inline]
    pub(crate) fn row_ptr(&self, row: usize) -> *mut u8 {
        // Offset is 0 for zero-sized components, keeping the dangling base.
        unsafe { self.data.as_ptr().add(row * self.item_size) }
    }

    /// Zero the bytes of `row`.
    #[inline]
    fn zero_row(&mut self, row: usize) {
        unsafe {
            std::ptr::write_bytes(self.row_ptr(row), 0, self.item_size);
        }
    }

    /// Copy the bytes of row `from` into row `to`. Rows must be distinct.
    #[inline]
    fn copy_row(&mut self, from: usize, to: usize) {
        debug_assert_ne!(from, to);
        unsafe {
            std::ptr::copy_nonoverlapping(self.row_ptr(from), self.row_ptr(to), self.item_size);
        }
    }

    fn grow(&mut self, old_cap: usize, new_cap: usize) {
        if self.item_size == 0 {
            return;
        }

        let new_bytes = new_cap
            .checked_mul(self.item_size)
            .expect("column byte size overflow");
        let new_layout =
            Layout::from_size_align(new_bytes, self.align).expect("invalid column layout");

        let ptr = unsafe {
            if old_cap == 0 {
                alloc::alloc(new_layout)
            } else {
                let old_layout =
                    Layout::from_size_align(old_cap * self.item_size, self.align).unwrap();
                alloc::realloc(self.data.as_ptr(), old_layout, new_bytes)
            }
        };

        self.data = NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(new_layout));
    }

    fn dealloc(&mut self, cap: usize) {
        if self.item_size == 0 || cap == 0 {
            return;
        }
        unsafe {
            let layout = Layout::from_size_align(cap * self.item_size, self.align).unwrap();
            alloc::dealloc(self.data.as_ptr(), layout);
        }
    }
}

/// Storage bucket for all entities sharing one exact component mask
pub struct Archetype {
    mask: ComponentMask,
    /// Component ids present, ascending. Fixed at construction.
    component_order: SmallVec<[u8; 8]>,
    /// Parallel to `component_order`.
    columns: Vec<Column>,
    /// id -> column slot, O(1). `NO_COLUMN` for absent ids.
    column_of: Box<[u16; 256]>,
    entities: Vec<Entity>,
    /// Row capacity shared by every column.
    cap: usize,
    /// Own position in the world's ordered archetype list.
    index: usize,
}

impl Archetype {
    pub(crate) fn new(mask: ComponentMask, registry: &ComponentRegistry, index: usize) -> Self {
        let component_order: SmallVec<[u8; 8]> = mask.ones().collect();
        let mut column_of = Box::new([NO_COLUMN; 256]);
        let mut columns = Vec::with_capacity(component_order.len());

        for (slot, &id) in component_order.iter().enumerate() {
            let info = registry.info(id);
            column_of[id as usize] = slot as u16;
            columns.push(Column::new(info.size, info.align));
        }

        Self {
            mask,
            component_order,
            columns,
            column_of,
            entities: Vec::new(),
            cap: 0,
            index,
        }
    }

    /// The exact component set stored here.
    #[inline]
    pub fn mask(&self) -> &ComponentMask {
        &self.mask
    }

    /// Component ids present, ascending.
    pub fn component_order(&self) -> &[u8] {
        &self.component_order
    }

    /// Current row count.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity handle at every occupied row.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn has_component(&self, id: u8) -> bool {
        self.mask.contains(id)
    }

    /// Column slot for a component id, `None` if the id is not in the mask.
    #[inline]
    pub(crate) fn column_slot(&self, id: u8) -> Option<usize> {
        let slot = self.column_of[id as usize];
        if slot == NO_COLUMN {
            None
        } else {
            Some(slot as usize)
        }
    }

    pub(crate) fn column(&self, slot: usize) -> &Column {
        &self.columns[slot]
    }

    /// Base pointer and row stride of the column for `id`.
    pub(crate) fn column_base(&self, id: u8) -> Option<(NonNull<u8>, usize)> {
        let slot = self.column_slot(id)?;
        let col = &self.columns[slot];
        Some((col.base(), col.item_size()))
    }

    /// Address of one occupied row's bytes in the column for `id`.
    pub(crate) fn component_ptr(&self, id: u8, row: usize) -> Option<NonNull<u8>> {
        debug_assert!(row < self.len());
        let slot = self.column_slot(id)?;
        NonNull::new(self.columns[slot].row_ptr(row))
    }

    /// Grow every column by one zeroed row, append the entity, return the
    /// new row index. Capacity doubles on overflow.
    pub(crate) fn push_zeroed(&mut self, entity: Entity) -> usize {
        let row = self.entities.len();
        if row == self.cap {
            let new_cap = if self.cap == 0 { 4 } else { self.cap * 2 };
            self.grow_to(new_cap);
        }

        for col in &mut self.columns {
            col.zero_row(row);
        }
        self.entities.push(entity);
        row
    }

    /// Ensure capacity for `additional` more rows, doubling as needed.
    pub(crate) fn reserve_rows(&mut self, additional: usize) {
        let target = self.entities.len() + additional;
        if target <= self.cap {
            return;
        }
        let mut new_cap = if self.cap == 0 { 4 } else { self.cap };
        while new_cap < target {
            new_cap *= 2;
        }
        self.grow_to(new_cap);
    }

    fn grow_to(&mut self, new_cap: usize) {
        debug_assert!(new_cap > self.cap);
        for col in &mut self.columns {
            col.grow(self.cap, new_cap);
        }
        self.entities.reserve(new_cap - self.entities.len());
        self.cap = new_cap;
    }

    /// Move the last row into `row` for every column, shrink by one, and
    /// return the entity that was moved into `row` (if any). The caller
    /// patches the directory entry of the returned entity.
    pub(crate) fn swap_remove(&mut self, row: usize) -> Option<Entity> {
        let last = self.entities.len() - 1;
        if row != last {
            for col in &mut self.columns {
                col.copy_row(last, row);
            }
        }

        self.entities.swap_remove(row);

        if row < self.entities.len() {
            Some(self.entities[row])
        } else {
            None
        }
    }

    /// Drop all rows. Capacity and column bytes are retained.
    pub(crate) fn clear_rows(&mut self) {
        self.entities.clear();
    }
}

impl Drop for Archetype {
    fn drop(&mut self) {
        for col in &mut self.columns {
            col.dealloc(self.cap);
        }
    }
}

// Columns own their allocations and hold only plain data; the component
// trait bound keeps every stored type Send + Sync.
unsafe impl Send for Archetype {}
unsafe impl Sync for Archetype {}
