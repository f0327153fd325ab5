use crate::glam::IVec2;

use itertools::iproduct;

/// A half-open rectangle of integer (tile) coordinates: `min <= p < min + shape`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TileRect {
    pub min: IVec2,
    pub shape: IVec2,
}

impl TileRect {
    pub const EMPTY: Self = Self {
        min: IVec2::ZERO,
        shape: IVec2::ZERO,
    };

    pub fn new(min: IVec2, shape: IVec2) -> Self {
        Self { min, shape }
    }

    pub fn square(min: IVec2, side: i32) -> Self {
        Self::new(min, IVec2::splat(side))
    }

    /// One past the maximum.
    pub fn least_upper_bound(&self) -> IVec2 {
        self.min + self.shape
    }

    pub fn is_empty(&self) -> bool {
        self.shape.cmple(IVec2::ZERO).any()
    }

    pub fn contains(&self, p: IVec2) -> bool {
        p.cmpge(self.min).all() && p.cmplt(self.least_upper_bound()).all()
    }

    /// Row-major iteration: `y` is the outer loop.
    pub fn iter(&self) -> impl Iterator<Item = IVec2> {
        let lub = self.least_upper_bound();
        let ys = self.min.y..lub.y;
        let xs = self.min.x..lub.x;
        iproduct!(ys, xs).map(|(y, x)| IVec2::new(x, y))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
