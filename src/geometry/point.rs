use crate::Payoff;
use serde::Deserialize;
use serde::Serialize;

/// payoff pair, player 0 on the x axis and player 1 on the y axis.
/// doubles as a direction vector on the unit circle during the
/// boundary sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: Payoff,
    y: Payoff,
}

impl Point {
    pub fn new(x: Payoff, y: Payoff) -> Self {
        Self { x, y }
    }
    pub fn x(&self) -> Payoff {
        self.x
    }
    pub fn y(&self) -> Payoff {
        self.y
    }
    pub fn dot(&self, other: &Self) -> Payoff {
        self.x * other.x + self.y * other.y
    }
    pub fn norm(&self) -> Payoff {
        self.dot(self).sqrt()
    }
    /// clockwise rotated normal. points "below" the ray through a
    /// direction d are exactly those with normal(d) . x <= normal(d) . p
    pub fn normal(&self) -> Self {
        Self::new(self.y, -self.x)
    }
    pub fn rotate_ccw(&self, radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
    pub fn normalize(&self) -> Self {
        *self * (1. / self.norm())
    }
    pub fn distance(a: &Self, b: &Self) -> Payoff {
        (*a - *b).norm()
    }
    /// componentwise minimum
    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }
    /// componentwise maximum
    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }
}

impl From<(Payoff, Payoff)> for Point {
    fn from((x, y): (Payoff, Payoff)) -> Self {
        Self::new(x, y)
    }
}

/// player indexing
impl std::ops::Index<usize> for Point {
    type Output = Payoff;
    fn index(&self, player: usize) -> &Payoff {
        match player {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("invalid player index: {}", player),
        }
    }
}
impl std::ops::IndexMut<usize> for Point {
    fn index_mut(&mut self, player: usize) -> &mut Payoff {
        match player {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => panic!("invalid player index: {}", player),
        }
    }
}

impl std::ops::Add for Point {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}
impl std::ops::Sub for Point {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}
impl std::ops::Mul<Payoff> for Point {
    type Output = Self;
    fn mul(self, scale: Payoff) -> Self {
        Self::new(self.x * scale, self.y * scale)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_is_clockwise() {
        let east = Point::new(1., 0.);
        let south = Point::new(0., -1.);
        assert!(east.normal() == south);
        assert!(east.normal().dot(&east) == 0.);
    }

    #[test]
    fn rotation_preserves_norm() {
        let p = Point::new(3., -4.);
        let q = p.rotate_ccw(std::f64::consts::PI * 0.37);
        assert!((p.norm() - q.norm()).abs() < 1e-12);
    }

    #[test]
    fn rotation_quarter_turn() {
        let east = Point::new(1., 0.);
        let north = east.rotate_ccw(std::f64::consts::FRAC_PI_2);
        assert!(Point::distance(&north, &Point::new(0., 1.)) < 1e-12);
    }

    #[test]
    fn player_indexing() {
        let p = Point::new(2., 5.);
        assert!(p[0] == 2.);
        assert!(p[1] == 5.);
    }
}
