/// euclidean distance between (x1, y1) and (x2, y2)
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

/// value `percentage` percent of the way from `a` to `b`
///
/// 0 gives `a`, 100 gives `b`, 50 the midpoint.
pub fn a_to_b(a: f64, b: f64, percentage: f64) -> f64 {
    let t = percentage / 100.0;
    (1.0 - t) * a + t * b
}

/// whether (px, py) lies in the rectangle, edges included
pub fn point_inside_rect(
    px: f64,
    py: f64,
    pos_x: f64,
    pos_y: f64,
    width: f64,
    height: f64,
) -> bool {
    px >= pos_x && px <= pos_x + width && py >= pos_y && py <= pos_y + height
}
