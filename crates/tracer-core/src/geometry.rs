use std::fmt;

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TracerError};
use crate::real::Real;

/// Inclusive box of integer cell indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexBox {
    pub lo: IVec3,
    pub hi: IVec3,
}

impl IndexBox {
    pub fn new(lo: IVec3, hi: IVec3) -> Self {
        Self { lo, hi }
    }

    /// Box of `size` cells starting at the origin.
    pub fn from_size(size: IVec3) -> Self {
        Self {
            lo: IVec3::ZERO,
            hi: size - IVec3::ONE,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hi.cmplt(self.lo).any()
    }

    /// Number of cells along each axis.
    pub fn size(&self) -> IVec3 {
        (self.hi - self.lo + IVec3::ONE).max(IVec3::ZERO)
    }

    pub fn num_cells(&self) -> usize {
        let s = self.size();
        s.x as usize * s.y as usize * s.z as usize
    }

    #[inline]
    pub fn contains(&self, iv: IVec3) -> bool {
        iv.cmpge(self.lo).all() && iv.cmple(self.hi).all()
    }

    /// Grow by `n` cells on every side (shrink for negative `n`).
    pub fn grow(&self, n: i32) -> Self {
        Self {
            lo: self.lo - IVec3::splat(n),
            hi: self.hi + IVec3::splat(n),
        }
    }

    /// Extend the upper bound along `axis` by `n`.
    pub fn grow_hi(&self, axis: usize, n: i32) -> Self {
        let mut hi = self.hi;
        hi[axis] += n;
        Self { lo: self.lo, hi }
    }

    pub fn intersection(&self, other: &IndexBox) -> Option<IndexBox> {
        let b = IndexBox {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        };
        (!b.is_empty()).then_some(b)
    }

    /// Index box of a field with the given centering over these cells.
    pub fn with_centering(&self, centering: Centering) -> Self {
        match centering {
            Centering::Cell => *self,
            Centering::Face(axis) => self.grow_hi(axis, 1),
            Centering::Node => Self {
                lo: self.lo,
                hi: self.hi + IVec3::ONE,
            },
        }
    }

    /// Split into boxes of at most `max_size` cells per axis, x varying fastest.
    pub fn chop(&self, max_size: IVec3) -> Vec<IndexBox> {
        if self.is_empty() {
            return Vec::new();
        }
        let max_size = max_size.max(IVec3::ONE);
        let mut boxes = Vec::new();
        let mut lo = self.lo;
        while lo.z <= self.hi.z {
            lo.y = self.lo.y;
            while lo.y <= self.hi.y {
                lo.x = self.lo.x;
                while lo.x <= self.hi.x {
                    let hi = (lo + max_size - IVec3::ONE).min(self.hi);
                    boxes.push(IndexBox::new(lo, hi));
                    lo.x += max_size.x;
                }
                lo.y += max_size.y;
            }
            lo.z += max_size.z;
        }
        boxes
    }

    /// All cells in the box, x varying fastest.
    pub fn cells(&self) -> Cells {
        Cells {
            bx: *self,
            next: (!self.is_empty()).then_some(self.lo),
        }
    }
}

impl fmt::Display for IndexBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(({},{},{}) ({},{},{}))",
            self.lo.x, self.lo.y, self.lo.z, self.hi.x, self.hi.y, self.hi.z
        )
    }
}

pub struct Cells {
    bx: IndexBox,
    next: Option<IVec3>,
}

impl Iterator for Cells {
    type Item = IVec3;

    fn next(&mut self) -> Option<IVec3> {
        let cur = self.next?;
        let mut n = cur;
        n.x += 1;
        if n.x > self.bx.hi.x {
            n.x = self.bx.lo.x;
            n.y += 1;
            if n.y > self.bx.hi.y {
                n.y = self.bx.lo.y;
                n.z += 1;
            }
        }
        self.next = (n.z <= self.bx.hi.z).then_some(n);
        Some(cur)
    }
}

/// Where a field's samples sit relative to the cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Centering {
    Cell,
    /// On the faces normal to the given axis (nodal along it).
    Face(usize),
    /// On cell corners.
    Node,
}

impl fmt::Display for Centering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Centering::Cell => write!(f, "cell"),
            Centering::Face(axis) => write!(f, "face({axis})"),
            Centering::Node => write!(f, "node"),
        }
    }
}

/// Physical placement of the index domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry<R: Real> {
    domain: IndexBox,
    prob_lo: [R; 3],
    prob_hi: [R; 3],
    cell_size: [R; 3],
    inv_cell_size: [R; 3],
}

impl<R: Real> Geometry<R> {
    pub fn new(domain: IndexBox, prob_lo: [R; 3], prob_hi: [R; 3]) -> Result<Self> {
        if domain.is_empty() {
            return Err(TracerError::InvalidGeometry(format!(
                "empty domain {domain}"
            )));
        }
        let n = domain.size();
        let mut cell_size = [R::ZERO; 3];
        let mut inv_cell_size = [R::ZERO; 3];
        for d in 0..3 {
            let extent = prob_hi[d] - prob_lo[d];
            if !extent.is_finite() || extent <= R::ZERO {
                return Err(TracerError::InvalidGeometry(format!(
                    "axis {d}: prob_hi {} must exceed prob_lo {}",
                    prob_hi[d], prob_lo[d]
                )));
            }
            cell_size[d] = extent / R::of_i32(n[d]);
            inv_cell_size[d] = R::of_i32(n[d]) / extent;
        }
        Ok(Self {
            domain,
            prob_lo,
            prob_hi,
            cell_size,
            inv_cell_size,
        })
    }

    pub fn domain(&self) -> IndexBox {
        self.domain
    }

    pub fn prob_lo(&self) -> [R; 3] {
        self.prob_lo
    }

    pub fn prob_hi(&self) -> [R; 3] {
        self.prob_hi
    }

    pub fn cell_size(&self) -> [R; 3] {
        self.cell_size
    }

    pub fn inv_cell_size(&self) -> [R; 3] {
        self.inv_cell_size
    }

    /// Physical position of a point inside cell `iv`, `offset` being the
    /// fractional position within the cell on each axis (0.5 = center).
    pub fn physical_position(&self, iv: IVec3, offset: [R; 3]) -> [R; 3] {
        let mut p = [R::ZERO; 3];
        for d in 0..3 {
            p[d] = self.prob_lo[d]
                + (R::of_i32(iv[d] - self.domain.lo[d]) + offset[d]) * self.cell_size[d];
        }
        p
    }

    /// Cell holding `pos`, flooring toward negative infinity.
    #[inline]
    pub fn cell_index(&self, pos: [R; 3]) -> IVec3 {
        let mut iv = IVec3::ZERO;
        for d in 0..3 {
            iv[d] = ((pos[d] - self.prob_lo[d]) * self.inv_cell_size[d]).floor_index()
                + self.domain.lo[d];
        }
        iv
    }
}
