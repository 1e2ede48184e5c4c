use super::point::Point;
use crate::Payoff;
use crate::Probability;
use serde::Deserialize;
use serde::Serialize;

/// one payoff point per state. the pivot, the threat tuple, and every
/// recorded extreme of the correspondence are all values of this type.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple(Vec<Point>);

impl Tuple {
    pub fn filled(states: usize, point: Point) -> Self {
        Self(vec![point; states])
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.0.iter()
    }
    /// componentwise expectation under a distribution over states
    pub fn expectation(&self, probabilities: &[Probability]) -> Point {
        assert!(probabilities.len() == self.0.len());
        self.0
            .iter()
            .zip(probabilities.iter())
            .fold(Point::default(), |e, (p, w)| e + *p * *w)
    }
    /// one player's expectation under a distribution over states
    pub fn expectation_of(&self, probabilities: &[Probability], player: usize) -> Payoff {
        assert!(probabilities.len() == self.0.len());
        self.0
            .iter()
            .zip(probabilities.iter())
            .map(|(p, w)| p[player] * w)
            .sum()
    }
    /// sup-norm distance across states and players
    pub fn distance(a: &Self, b: &Self) -> Payoff {
        assert!(a.len() == b.len());
        a.0.iter()
            .zip(b.0.iter())
            .flat_map(|(p, q)| [(p[0] - q[0]).abs(), (p[1] - q[1]).abs()])
            .fold(0., f64::max)
    }
    /// true iff one player's coordinate is strictly below the other
    /// tuple's in every state
    pub fn strictly_below(&self, other: &Self, player: usize) -> bool {
        assert!(self.len() == other.len());
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(p, q)| p[player] < q[player])
    }
}

impl From<Vec<Point>> for Tuple {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

/// state indexing
impl std::ops::Index<usize> for Tuple {
    type Output = Point;
    fn index(&self, state: usize) -> &Point {
        &self.0[state]
    }
}
impl std::ops::IndexMut<usize> for Tuple {
    fn index_mut(&mut self, state: usize) -> &mut Point {
        &mut self.0[state]
    }
}

/// broadcast offset, used to pad a tuple by a tolerance
impl std::ops::Add<Point> for &Tuple {
    type Output = Tuple;
    fn add(self, offset: Point) -> Tuple {
        Tuple(self.0.iter().map(|p| *p + offset).collect())
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for point in self.0.iter() {
            write!(f, "{} ", point)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expectation_is_linear() {
        let tuple = Tuple::from(vec![Point::new(1., 2.), Point::new(3., -4.)]);
        let probs = [0.25, 0.75];
        let expected = Point::new(0.25 * 1. + 0.75 * 3., 0.25 * 2. + 0.75 * -4.);
        assert!(Point::distance(&tuple.expectation(&probs), &expected) < 1e-15);
        assert!((tuple.expectation_of(&probs, 0) - expected.x()).abs() < 1e-15);
        assert!((tuple.expectation_of(&probs, 1) - expected.y()).abs() < 1e-15);
    }

    #[test]
    fn distance_is_sup_norm() {
        let a = Tuple::from(vec![Point::new(0., 0.), Point::new(1., 1.)]);
        let b = Tuple::from(vec![Point::new(0., 3.), Point::new(1., 1.)]);
        assert!(Tuple::distance(&a, &b) == 3.);
    }

    #[test]
    fn strictly_below_is_componentwise() {
        let a = Tuple::from(vec![Point::new(0., 0.), Point::new(1., 1.)]);
        let b = Tuple::from(vec![Point::new(1., 0.), Point::new(2., 1.)]);
        assert!(a.strictly_below(&b, 0));
        assert!(!a.strictly_below(&b, 1));
    }
}
