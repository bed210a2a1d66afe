use crate::geometry::Transform;
use crate::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub lower_left: Vec3,
    pub upper_right: Vec3,
    pub center: Vec3,
    pub width: Vec3,
}

impl BoundingBox {
    pub fn new(lower_left: Vec3, upper_right: Vec3) -> Self {
        let center = 0.5 * (lower_left + upper_right);
        let width = upper_right - lower_left;
        BoundingBox {
            lower_left,
            upper_right,
            center,
            width,
        }
    }

    /// Smallest axis-aligned box enclosing all points.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (lower, upper) = iter.fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));
        Some(BoundingBox::new(lower, upper))
    }

    /// Grow the box by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec3::repeat(margin);
        BoundingBox::new(self.lower_left - m, self.upper_right + m)
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.lower_left, self.upper_right);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    pub fn contains(&self, point: &Vec3) -> bool {
        (0..3).all(|i| point[i] >= self.lower_left[i] && point[i] <= self.upper_right[i])
    }

    /// Axis-aligned box enclosing this box after `transform` is applied.
    pub fn transformed(&self, transform: &Transform) -> Self {
        let corners = self.corners().map(|c| transform.to_global(&c));
        // eight corners, never empty
        BoundingBox::enclosing(corners.iter()).unwrap_or_else(|| self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    #[test]
    fn test_center_and_width() {
        let bb = BoundingBox::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 5.0));
        assert_eq!(bb.center, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(bb.width, Vec3::new(2.0, 4.0, 8.0));
    }

    #[test]
    fn test_expanded_contains() {
        let bb = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(!bb.contains(&Vec3::new(1.5, 0.5, 0.5)));
        assert!(bb.expanded(1.0).contains(&Vec3::new(1.5, 0.5, 0.5)));
    }

    #[test]
    fn test_transformed_rotation_swaps_axes() {
        let bb = BoundingBox::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let rotation = Rotation3::from_axis_angle(&Vec3::x_axis(), std::f64::consts::FRAC_PI_2);
        let t = Transform::new(rotation, Vec3::new(0.0, 0.0, 10.0));
        let out = bb.transformed(&t);
        assert!((out.width.y - 6.0).abs() < 1e-10);
        assert!((out.width.z - 4.0).abs() < 1e-10);
        assert!((out.center.z - 10.0).abs() < 1e-10);
    }
}
