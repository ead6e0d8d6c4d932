use nalgebra::geometry::Point2;
use std::f64::consts::PI;

/// Cross-sectional area of a circle of diameter `dia`, in mm^2.
pub fn circle_area(dia: f64) -> f64 {
    PI * dia * dia / 4.0
}

/// XY travel length between two points, in mm.
pub fn travel_length(from: &Point2<f64>, to: &Point2<f64>) -> f64 {
    (to - from).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::geometry::Point2;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn area_of_two_mm_circle() {
        assert!((circle_area(2.0) - PI).abs() < EPSILON);
    }

    #[test]
    fn area_of_feedstock_wire() {
        // 0.9mm wire
        assert!((circle_area(0.9) - 0.636_172_512_351_933).abs() < 1e-9);
    }

    #[test]
    fn diagonal_travel() {
        let a = Point2::new(-5.0, -5.0);
        let b = Point2::new(5.0, 5.0);
        assert!((travel_length(&a, &b) - 10.0 * 2.0_f64.sqrt()).abs() < EPSILON);
    }

    #[test]
    fn axis_aligned_travel() {
        let a = Point2::new(5.0, 0.0);
        let b = Point2::new(-5.0, 0.0);
        assert!((travel_length(&a, &b) - 10.0).abs() < EPSILON);
    }
}
