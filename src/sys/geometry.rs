use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle. Pixel geometry uses `Rect<i32>`; positions
/// relative to a layout use `Rect<f64>` over the unit square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

/// A point in the unit square. Values outside [0, 1] are allowed and read as
/// "before the first" / "after the last" slot.
pub type NormalizedPoint = Point<f64>;

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self { Self { x, y } }
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self { Self { x, y, width, height } }
}

impl<T> Rect<T>
where T: Copy + Add<Output = T> + Sub<Output = T>
{
    pub fn right(&self) -> T { self.x + self.width }

    pub fn bottom(&self) -> T { self.y + self.height }

    pub fn translate(&self, dx: T, dy: T) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Moves every edge inward by `amount`.
    pub fn shrink(&self, amount: T) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            width: self.width - amount - amount,
            height: self.height - amount - amount,
        }
    }
}

impl<T> Rect<T>
where T: Copy + Default + PartialOrd
{
    /// Width and height may go negative while proxies shrink a rectangle.
    /// Nothing negative may reach the window server.
    pub fn clamp_non_negative(&self) -> Self {
        let zero = T::default();
        Self {
            width: if self.width < zero { zero } else { self.width },
            height: if self.height < zero { zero } else { self.height },
            ..*self
        }
    }
}

impl<T> Add for Rect<T>
where T: Add<Output = T>
{
    type Output = Rect<T>;

    fn add(self, other: Rect<T>) -> Rect<T> {
        Rect {
            x: self.x + other.x,
            y: self.y + other.y,
            width: self.width + other.width,
            height: self.height + other.height,
        }
    }
}

impl Rect<i32> {
    pub fn intersect(&self, other: &Rect<i32>) -> Option<Rect<i32>> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    pub fn to_f64(&self) -> Rect<f64> {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width),
            f64::from(self.height),
        )
    }
}

impl Rect<f64> {
    pub const UNIT: Rect<f64> = Rect::new(0.0, 0.0, 1.0, 1.0);

    pub fn contains(&self, point: NormalizedPoint) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn center(&self) -> NormalizedPoint {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl NormalizedPoint {
    /// Pulls the point just inside the unit square.
    pub fn clamp_to_unit(&self) -> NormalizedPoint {
        const JUST_BELOW_ONE: f64 = 1.0 - 1e-9;
        Point::new(self.x.clamp(0.0, JUST_BELOW_ONE), self.y.clamp(0.0, JUST_BELOW_ONE))
    }
}
