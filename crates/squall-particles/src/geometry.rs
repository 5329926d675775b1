//! Spawn geometry: fall velocity and the off-screen spawn line.

/// Largest tangent used for the off-screen spawn offset. `tan()` diverges as
/// the angle approaches ±90°, so the lateral offset is capped at five times
/// the container height.
pub const MAX_SPAWN_TANGENT: f64 = 5.0;

/// Fraction of each velocity component used as random spawn variation.
pub const VELOCITY_VARIANCE: f32 = 0.05;

/// An integer rectangle in view-local cell coordinates.
///
/// Unlike [`ratatui::layout::Rect`] the edges may be negative, which the
/// spawn line needs when it extends past the left edge of the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Per-axis particle velocity with the random variation allowed around it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub x_variance: f32,
    pub y_variance: f32,
}

/// Split a fall speed into x/y components.
///
/// An angle of 0 falls straight down; positive angles drift to the right.
/// Negative speeds are accepted and reverse the direction.
pub fn compute_velocity(angle_radians: f64, speed: i32) -> Velocity {
    let x = angle_radians.sin() as f32 * speed as f32;
    let y = angle_radians.cos() as f32 * speed as f32;
    Velocity {
        x,
        y,
        x_variance: x * VELOCITY_VARIANCE,
        y_variance: y * VELOCITY_VARIANCE,
    }
}

/// Compute the horizontal line along the top edge where particles spawn.
///
/// Slanted particles that spawn only above the visible area would leave the
/// upwind corner empty, so the line is stretched upwind by however far a
/// particle drifts sideways while crossing the full height.
pub fn compute_spawn_bounds(angle_radians: f64, width: i32, height: i32) -> Bounds {
    let offscreen = angle_radians
        .tan()
        .clamp(-MAX_SPAWN_TANGENT, MAX_SPAWN_TANGENT)
        * height as f64;

    let left = ((-offscreen) as i32).min(0);
    let right = ((width as f64 - offscreen) as i32).max(width);

    Bounds::new(left, 0, right, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn test_velocity_straight_down() {
        let v = compute_velocity(0.0, 30);
        assert_eq!(v.x, 0.0);
        assert_eq!(v.y, 30.0);
        assert_eq!(v.y_variance, 1.5);
    }

    #[test]
    fn test_velocity_sideways() {
        let v = compute_velocity(90f64.to_radians(), 30);
        assert!((v.x - 30.0).abs() < EPSILON);
        assert!(v.y.abs() < EPSILON);
    }

    #[test]
    fn test_negative_speed_reverses() {
        let v = compute_velocity(30f64.to_radians(), -20);
        assert!(v.x < 0.0);
        assert!(v.y < 0.0);
        assert!((v.x_variance - v.x * 0.05).abs() < EPSILON);
    }

    #[test]
    fn test_bounds_unchanged_when_vertical() {
        assert_eq!(compute_spawn_bounds(0.0, 100, 200), Bounds::new(0, 0, 100, 0));
    }

    #[test]
    fn test_bounds_at_45_degrees() {
        let bounds = compute_spawn_bounds(std::f64::consts::FRAC_PI_4, 100, 200);
        // tan(pi/4) is a hair below 1.0 so truncation may land on -199.
        assert!((-200..=-199).contains(&bounds.left));
        assert_eq!(bounds.right, 100);
        assert_eq!(bounds.top, 0);
        assert_eq!(bounds.bottom, 0);
    }

    #[test]
    fn test_bounds_leaning_left_extend_right() {
        let bounds = compute_spawn_bounds(-std::f64::consts::FRAC_PI_4, 100, 200);
        assert_eq!(bounds.left, 0);
        assert!((299..=300).contains(&bounds.right));
    }

    #[test]
    fn test_offset_clamped_near_vertical_asymptote() {
        let height = 40;
        for degrees in [89.999, -89.999, 90.0, -90.0, 270.0] {
            let bounds = compute_spawn_bounds(f64::to_radians(degrees), 80, height);
            let spread = bounds.width() - 80;
            assert!(spread <= 5 * height, "{degrees}: spread {spread}");
        }
    }

    #[test]
    fn test_bounds_never_invert() {
        for step in -720..=720 {
            let angle = (step as f64 * 0.5).to_radians();
            for (w, h) in [(0, 0), (1, 1), (80, 24), (0, 50), (300, 0)] {
                let bounds = compute_spawn_bounds(angle, w, h);
                assert!(bounds.left <= 0);
                assert!(bounds.right >= w);
                assert!(bounds.left <= bounds.right);
            }
        }
    }
}
