//! Per-tile field arrays with ghost cells.
//!
//! A [`Fab`] is one tile's block of samples, a [`TiledField`] is one fab per
//! tile of a [`TileLayout`]. Fabs carry the memory location their data lives
//! in. Kernels read through [`FabView`] wherever the data lives; host-side
//! loops go through [`Fab::host_view`], which stages off-host data into a
//! temporary pinned copy first.

use std::borrow::Cow;

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::geometry::{Centering, IndexBox};
use crate::layout::TileLayout;
use crate::real::Real;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryLocation {
    #[default]
    Host,
    /// Page-locked host memory, the staging target for device reads.
    Pinned,
    Device,
    Managed,
}

impl MemoryLocation {
    /// Whether host code may index the data in place.
    pub fn is_host_accessible(self) -> bool {
        matches!(self, MemoryLocation::Host | MemoryLocation::Pinned)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fab<R: Real> {
    bx: IndexBox,
    data: Vec<R>,
    location: MemoryLocation,
}

impl<R: Real> Fab<R> {
    pub fn new(bx: IndexBox, location: MemoryLocation) -> Self {
        Self {
            bx,
            data: vec![R::ZERO; bx.num_cells()],
            location,
        }
    }

    /// Fab with `f(iv)` at every index of `bx`.
    pub fn from_fn(bx: IndexBox, location: MemoryLocation, f: impl FnMut(IVec3) -> R) -> Self {
        Self {
            bx,
            data: bx.cells().map(f).collect(),
            location,
        }
    }

    pub fn index_box(&self) -> IndexBox {
        self.bx
    }

    pub fn location(&self) -> MemoryLocation {
        self.location
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    pub fn view(&self) -> FabView<'_, R> {
        let size = self.bx.size();
        let j_stride = size.x as usize;
        let k_stride = j_stride * size.y as usize;
        FabView {
            data: &self.data,
            bx: self.bx,
            j_stride,
            k_stride,
        }
    }

    pub fn set(&mut self, iv: IVec3, value: R) {
        let offset = self.view().offset(iv);
        self.data[offset] = value;
    }

    pub fn contains_non_finite(&self) -> bool {
        self.data.iter().any(|v| !v.is_finite())
    }

    /// Host-readable form of this fab.
    ///
    /// Host-accessible data is borrowed as is. Device or managed data is
    /// copied into a pinned host fab; the copy completes before this returns
    /// and is freed when the returned value is dropped.
    pub fn host_view(&self) -> Cow<'_, Fab<R>> {
        if self.location.is_host_accessible() {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(self.stage_to_host())
        }
    }

    fn stage_to_host(&self) -> Fab<R> {
        let mut staged = Fab::new(self.bx, MemoryLocation::Pinned);
        let src: &[u8] = bytemuck::cast_slice(&self.data);
        bytemuck::cast_slice_mut::<R, u8>(&mut staged.data).copy_from_slice(src);
        log::debug!(
            "staged {} bytes of {:?} field data {} to host",
            src.len(),
            self.location,
            self.bx
        );
        staged
    }
}

/// Bounds-checked read access to one fab.
#[derive(Clone, Copy, Debug)]
pub struct FabView<'a, R> {
    data: &'a [R],
    bx: IndexBox,
    j_stride: usize,
    k_stride: usize,
}

impl<'a, R: Real> FabView<'a, R> {
    #[inline]
    fn offset(&self, iv: IVec3) -> usize {
        assert!(
            self.bx.contains(iv),
            "index ({}, {}, {}) outside field box {}",
            iv.x,
            iv.y,
            iv.z,
            self.bx
        );
        let d = iv - self.bx.lo;
        d.x as usize + d.y as usize * self.j_stride + d.z as usize * self.k_stride
    }

    #[inline]
    pub fn get(&self, iv: IVec3) -> R {
        self.data[self.offset(iv)]
    }

    pub fn index_box(&self) -> IndexBox {
        self.bx
    }
}

/// One fab per tile of a layout.
#[derive(Clone, Debug, PartialEq)]
pub struct TiledField<R: Real> {
    layout: TileLayout,
    centering: Centering,
    n_grow: i32,
    location: MemoryLocation,
    fabs: Vec<Fab<R>>,
}

impl<R: Real> TiledField<R> {
    pub fn new(
        layout: &TileLayout,
        centering: Centering,
        n_grow: i32,
        location: MemoryLocation,
    ) -> Self {
        let fabs = layout
            .boxes()
            .iter()
            .map(|b| Fab::new(b.with_centering(centering).grow(n_grow), location))
            .collect();
        Self {
            layout: layout.clone(),
            centering,
            n_grow,
            location,
            fabs,
        }
    }

    /// Field with `f(iv)` at every index, ghost cells included. `iv` is the
    /// global index in the field's own centering.
    pub fn from_fn(
        layout: &TileLayout,
        centering: Centering,
        n_grow: i32,
        location: MemoryLocation,
        f: impl Fn(IVec3) -> R,
    ) -> Self {
        let fabs = layout
            .boxes()
            .iter()
            .map(|b| Fab::from_fn(b.with_centering(centering).grow(n_grow), location, &f))
            .collect();
        Self {
            layout: layout.clone(),
            centering,
            n_grow,
            location,
            fabs,
        }
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn centering(&self) -> Centering {
        self.centering
    }

    pub fn n_grow(&self) -> i32 {
        self.n_grow
    }

    pub fn location(&self) -> MemoryLocation {
        self.location
    }

    pub fn fab(&self, tile: usize) -> &Fab<R> {
        &self.fabs[tile]
    }

    pub fn fab_mut(&mut self, tile: usize) -> &mut Fab<R> {
        &mut self.fabs[tile]
    }

    pub fn fabs(&self) -> &[Fab<R>] {
        &self.fabs
    }

    pub fn is_on(&self, layout: &TileLayout) -> bool {
        self.layout == *layout
    }

    pub fn contains_non_finite(&self) -> bool {
        self.fabs.iter().any(Fab::contains_non_finite)
    }
}
