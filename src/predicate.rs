use geo::{BoundingRect, Geometry, Intersects, Relate};
use serde::{Deserialize, Serialize};

/// Spatial relation a row geometry must have with a filter geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    #[default]
    Intersects,
    Within,
    Contains,
    Disjoint,
}

impl Predicate {
    pub fn evaluate(&self, lhs: &Geometry, rhs: &Geometry) -> bool {
        let envelopes_meet = match (lhs.bounding_rect(), rhs.bounding_rect()) {
            (Some(lhs), Some(rhs)) => lhs.intersects(&rhs),
            _ => false,
        };
        if !envelopes_meet {
            return matches!(self, Predicate::Disjoint);
        }
        let matrix = lhs.relate(rhs);
        match self {
            Predicate::Intersects => matrix.is_intersects(),
            Predicate::Within => matrix.is_within(),
            Predicate::Contains => matrix.is_contains(),
            Predicate::Disjoint => matrix.is_disjoint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};
    use rstest::rstest;

    #[rstest]
    #[case(Predicate::Intersects, true, false)]
    #[case(Predicate::Within, true, false)]
    #[case(Predicate::Contains, false, false)]
    #[case(Predicate::Disjoint, false, true)]
    fn point_and_square(#[case] predicate: Predicate, #[case] inside: bool, #[case] outside: bool) {
        let square = Geometry::from(polygon![
            (x: 0., y: 0.),
            (x: 2., y: 0.),
            (x: 2., y: 2.),
            (x: 0., y: 2.),
        ]);
        let in_point = Geometry::from(point!(x: 1., y: 1.));
        let out_point = Geometry::from(point!(x: 5., y: 5.));
        assert_eq!(predicate.evaluate(&in_point, &square), inside);
        assert_eq!(predicate.evaluate(&out_point, &square), outside);
    }
}
