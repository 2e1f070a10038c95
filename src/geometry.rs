/// Angle at vertex `b` formed by `a-b-c`, in degrees within `[0, 180]`.
pub fn joint_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let radians = (c.1 - b.1).atan2(c.0 - b.0) - (a.1 - b.1).atan2(a.0 - b.0);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 { 360.0 - angle } else { angle }
}

pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f32>() / values.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn right_angle() {
        assert!(close(joint_angle((0.0, 1.0), (0.0, 0.0), (1.0, 0.0)), 90.0));
    }

    #[test]
    fn symmetric_in_outer_points() {
        let cases = [
            ((0.3, 0.2), (0.5, 0.5), (0.9, 0.55)),
            ((0.1, 0.9), (0.4, 0.4), (0.2, 0.1)),
            ((-1.0, 2.0), (0.0, 0.0), (-3.0, -0.5)),
        ];
        for (a, b, c) in cases {
            assert!(close(joint_angle(a, b, c), joint_angle(c, b, a)));
        }
    }

    #[test]
    fn stays_within_half_turn() {
        for step in 0..72 {
            let theta = (step as f32 * 5.0).to_radians();
            let a = (theta.cos(), theta.sin());
            let angle = joint_angle(a, (0.0, 0.0), (-1.0, -0.2));
            assert!((0.0..=180.0).contains(&angle), "{angle}");
        }
    }

    #[test]
    fn collinear_and_coincident_points() {
        assert!(close(joint_angle((0.0, 0.0), (1.0, 1.0), (2.0, 2.0)), 180.0));
        assert!(close(joint_angle((0.2, 0.7), (0.5, 0.5), (0.2, 0.7)), 0.0));
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }
}
