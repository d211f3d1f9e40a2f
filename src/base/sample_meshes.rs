use gemlab::mesh::{Cell, Mesh, Point, PointId};
use gemlab::shapes::GeoKind;

/// Holds some sample meshes
pub struct SampleMeshes;

impl SampleMeshes {
    /// Returns a mesh with a single Tri3
    ///
    /// ```text
    ///  1.0  2
    ///       |`.
    ///       |  `.
    ///       |    `.
    ///       |      `.
    ///  0.0  0--------1
    ///      0.0      1.0
    /// ```
    #[rustfmt::skip]
    pub fn one_tri3() -> Mesh {
        Mesh {
            ndim: 2,
            points: vec![
                Point { id: 0, marker: 0, coords: vec![0.0, 0.0] },
                Point { id: 1, marker: 0, coords: vec![1.0, 0.0] },
                Point { id: 2, marker: 0, coords: vec![0.0, 1.0] },
            ],
            cells: vec![
                Cell { id: 0, attribute: 1, kind: GeoKind::Tri3, points: vec![0, 1, 2] },
            ],
        }
    }

    /// Returns a rectangular box [0,lx] × [0,ly] divided into nx × ny quadrilaterals, each split into two Tri3
    ///
    /// The points are numbered row by row (`id = j (nx + 1) + i`). Each quadrilateral
    /// `(p0, p1, p2, p3)` (counterclockwise from the lower-left corner) yields the
    /// triangles `(p0, p1, p2)` and `(p0, p2, p3)`.
    ///
    /// ```text
    ///  6-----7-----8
    ///  |   / |   / |
    ///  | /   | /   |
    ///  3-----4-----5
    ///  |   / |   / |
    ///  | /   | /   |
    ///  0-----1-----2
    /// ```
    pub fn box2d(lx: f64, ly: f64, nx: usize, ny: usize) -> Mesh {
        let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..(ny + 1) {
            for i in 0..(nx + 1) {
                let x = lx * (i as f64) / (nx as f64);
                let y = ly * (j as f64) / (ny as f64);
                points.push(Point {
                    id: points.len(),
                    marker: 0,
                    coords: vec![x, y],
                });
            }
        }
        let mut cells = Vec::with_capacity(2 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let p0 = j * (nx + 1) + i;
                let p1 = p0 + 1;
                let p2 = p1 + (nx + 1);
                let p3 = p0 + (nx + 1);
                for tri in [vec![p0, p1, p2], vec![p0, p2, p3]] {
                    cells.push(Cell {
                        id: cells.len(),
                        attribute: 1,
                        kind: GeoKind::Tri3,
                        points: tri,
                    });
                }
            }
        }
        Mesh { ndim: 2, points, cells }
    }

    /// Returns the ids of the points with x-coordinate equal to `x` (within a tolerance)
    pub fn points_at_x(mesh: &Mesh, x: f64) -> Vec<PointId> {
        mesh.points
            .iter()
            .filter(|p| f64::abs(p.coords[0] - x) < 1e-10)
            .map(|p| p.id)
            .collect()
    }

    /// Returns the ids of the points with y-coordinate equal to `y` (within a tolerance)
    pub fn points_at_y(mesh: &Mesh, y: f64) -> Vec<PointId> {
        mesh.points
            .iter()
            .filter(|p| f64::abs(p.coords[1] - y) < 1e-10)
            .map(|p| p.id)
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
