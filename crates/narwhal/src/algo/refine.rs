//! Opt-in geometric clean-up applied after the simulation.
//!
//! Every operation here only moves nodes it has a reason to move: separation leaves pairs that
//! are already far enough apart alone, and with `Refinement::default()` nothing runs at all.

use crate::algo::Refinement;
use crate::graph::Point;

/// Applies `refinement` in place and returns how many nodes moved.
pub fn refine(positions: &mut [Point], refinement: &Refinement) -> usize {
    if positions.is_empty() || !refinement.is_enabled() {
        return 0;
    }

    let mut moved = vec![false; positions.len()];
    if let Some(min_separation) = refinement.min_separation {
        separate(
            positions,
            min_separation,
            refinement.separation_passes,
            &mut moved,
        );
    }
    if refinement.recenter {
        if let Some((cx, cy)) = bounding_box_center(positions) {
            if cx != 0.0 || cy != 0.0 {
                translate(positions, -cx, -cy);
                moved.fill(true);
            }
        }
    }

    moved.into_iter().filter(|m| *m).count()
}

pub fn bounding_box_center(positions: &[Point]) -> Option<(f64, f64)> {
    if positions.is_empty() {
        return None;
    }
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in positions {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
        return None;
    }
    Some(((min_x + max_x) / 2.0, (min_y + max_y) / 2.0))
}

fn translate(positions: &mut [Point], dx: f64, dy: f64) {
    for p in positions {
        p.x += dx;
        p.y += dy;
    }
}

/// Pushes every pair closer than `min_separation` apart, half the shortfall each way. Repeats up
/// to `passes` times because resolving one pair can create another.
fn separate(positions: &mut [Point], min_separation: f64, passes: usize, moved: &mut [bool]) {
    let n = positions.len();
    for _ in 0..passes {
        let mut any = false;
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = positions[j].x - positions[i].x;
                let dy = positions[j].y - positions[i].y;
                let dist = dx.hypot(dy);
                if dist >= min_separation {
                    continue;
                }
                let (ux, uy) = if dist > 0.0 {
                    (dx / dist, dy / dist)
                } else {
                    (1.0, 0.0)
                };
                let push = (min_separation - dist) / 2.0;
                positions[i].x -= ux * push;
                positions[i].y -= uy * push;
                positions[j].x += ux * push;
                positions[j].y += uy * push;
                moved[i] = true;
                moved[j] = true;
                any = true;
            }
        }
        if !any {
            break;
        }
    }
}
