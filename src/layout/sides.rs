use crate::ir::{LabelSide, Point};

use super::visibility::group_by_category;

/// Zig-zag side preference. Categories with at least `min_visible` visible
/// labels alternate above/below along the curve; the pattern runs over the
/// visible labels only so culled points cannot break the alternation.
pub fn assign_sides(points: &[Point], visible: &[bool], min_visible: usize) -> Vec<LabelSide> {
    let mut sides = vec![LabelSide::Auto; points.len()];
    for (_, members) in group_by_category(points) {
        let mut shown: Vec<usize> = members.into_iter().filter(|&i| visible[i]).collect();
        if shown.len() < min_visible.max(1) {
            continue;
        }
        shown.sort_by(|&a, &b| {
            points[a]
                .curve_param
                .total_cmp(&points[b].curve_param)
                .then(a.cmp(&b))
        });
        for (rank, idx) in shown.into_iter().enumerate() {
            sides[idx] = if rank % 2 == 0 {
                LabelSide::Above
            } else {
                LabelSide::Below
            };
        }
    }
    sides
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(params: &[f32]) -> Vec<Point> {
        params
            .iter()
            .enumerate()
            .map(|(i, p)| Point::new(format!("p{i}"), *p, "c"))
            .collect()
    }

    #[test]
    fn alternates_over_visible_points_sorted_by_param() {
        let pts = points(&[5.0, 1.0, 4.0, 2.0, 3.0, 0.5]);
        let visible = vec![true, true, true, true, true, false];
        let sides = assign_sides(&pts, &visible, 5);
        // Sorted visible order: p1, p3, p4, p2, p0.
        assert_eq!(sides[1], LabelSide::Above);
        assert_eq!(sides[3], LabelSide::Below);
        assert_eq!(sides[4], LabelSide::Above);
        assert_eq!(sides[2], LabelSide::Below);
        assert_eq!(sides[0], LabelSide::Above);
        assert_eq!(sides[5], LabelSide::Auto);
    }

    #[test]
    fn small_visible_sets_stay_auto() {
        let pts = points(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let visible = vec![true, false, true, false, true, true];
        let sides = assign_sides(&pts, &visible, 5);
        assert!(sides.iter().all(|s| *s == LabelSide::Auto));
    }
}
