//! Synthetic query points.
//!
//! The report overlays one "test point" on each chart. Its position is
//! random; the classifiers themselves never are. Callers pass the `Rng`, so
//! tests and reproducible reports can seed it.

use rand::Rng;

use crate::embedding::{Bounds, EmbeddedPoint};
use crate::knn::QueryPoint;
use crate::som::{GridCell, GridExtent};

/// Uniform point in `[0, max_col) × [0, max_row)`. A zero extent on either
/// axis widens to 1, so single-row or empty grids still get a spread.
pub fn grid_query<R: Rng + ?Sized>(cells: &[GridCell], rng: &mut R) -> QueryPoint {
    let extent = GridExtent::of(cells);
    let width = if extent.max_col > 0.0 { extent.max_col } else { 1.0 };
    let height = if extent.max_row > 0.0 { extent.max_row } else { 1.0 };

    let x = rng.gen::<f64>() * width;
    let y = rng.gen::<f64>() * height;
    QueryPoint::new(x, y)
}

/// Uniform point inside the cloud's bounding box, or `None` for an empty
/// cloud.
pub fn scatter_query<R: Rng + ?Sized>(
    points: &[EmbeddedPoint],
    rng: &mut R,
) -> Option<QueryPoint> {
    let bounds = Bounds::of(points)?;
    let x = bounds.min_x + rng.gen::<f64>() * (bounds.max_x - bounds.min_x);
    let y = bounds.min_y + rng.gen::<f64>() * (bounds.max_y - bounds.min_y);
    Some(QueryPoint::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label_map::LabelMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cell(row: f64, col: f64) -> GridCell {
        let mut proportions = LabelMap::new();
        proportions.insert("A", 1.0);
        GridCell::new(row, col, proportions)
    }

    #[test]
    fn grid_query_stays_inside_extent() {
        let cells = vec![cell(0.0, 0.0), cell(4.0, 9.0)];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let q = grid_query(&cells, &mut rng);
            assert!((0.0..9.0).contains(&q.x), "x={}", q.x);
            assert!((0.0..4.0).contains(&q.y), "y={}", q.y);
        }
    }

    #[test]
    fn degenerate_grid_uses_unit_extent() {
        let mut rng = StdRng::seed_from_u64(1);
        let q = grid_query(&[cell(0.0, 0.0)], &mut rng);
        assert!((0.0..1.0).contains(&q.x));
        assert!((0.0..1.0).contains(&q.y));
    }

    #[test]
    fn scatter_query_within_bounds() {
        let points = vec![
            EmbeddedPoint::new(-5.0, 2.0, "A"),
            EmbeddedPoint::new(5.0, 8.0, "B"),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let q = scatter_query(&points, &mut rng).unwrap();
            assert!(q.x >= -5.0 && q.x <= 5.0);
            assert!(q.y >= 2.0 && q.y <= 8.0);
        }
        assert!(scatter_query(&[], &mut rng).is_none());
    }

    #[test]
    fn same_seed_same_point() {
        let cells = vec![cell(3.0, 3.0)];
        let a = grid_query(&cells, &mut StdRng::seed_from_u64(9));
        let b = grid_query(&cells, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
