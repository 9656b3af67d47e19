//! Lane extraction: turns the raw tile grid into the ordered path debris follow.
//!
//! The lane must be a single non-branching chain of PATH cells with at least
//! one end on the map boundary. The entry is the first boundary endpoint in
//! authoring order: each row's first then last column, then each column's
//! top then bottom row.

use crate::error::MapError;
use crate::game::{Coord, TileType};

/// Grid in file order (row 0 at the top).
struct Grid<'a> {
    rows: &'a [Vec<TileType>],
    n: usize,
    m: usize,
}

impl Grid<'_> {
    fn is_path(&self, r: usize, c: usize) -> bool {
        self.rows[r][c] == TileType::Path
    }

    /// PATH neighbours in flood order: down, left, up, right.
    fn path_neighbours(&self, r: usize, c: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let down = (r + 1 < self.n).then(|| (r + 1, c));
        let left = c.checked_sub(1).map(|c| (r, c));
        let up = r.checked_sub(1).map(|r| (r, c));
        let right = (c + 1 < self.m).then(|| (r, c + 1));
        [down, left, up, right]
            .into_iter()
            .flatten()
            .filter(|&(r, c)| self.is_path(r, c))
    }

    fn is_endpoint(&self, r: usize, c: usize) -> bool {
        self.is_path(r, c) && self.path_neighbours(r, c).count() == 1
    }

    /// Bottom-origin Cartesian coordinate of a file cell.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn cartesian(&self, r: usize, c: usize) -> Coord {
        Coord::new(c as i32, (self.n - 1 - r) as i32)
    }

    fn first_endpoint(&self) -> Option<(usize, usize)> {
        let by_row = (0..self.n).find_map(|i| {
            if self.is_endpoint(i, 0) {
                Some((i, 0))
            } else if self.is_endpoint(i, self.m - 1) {
                Some((i, self.m - 1))
            } else {
                None
            }
        });
        by_row.or_else(|| {
            (0..self.m).find_map(|j| {
                if self.is_endpoint(0, j) {
                    Some((0, j))
                } else if self.is_endpoint(self.n - 1, j) {
                    Some((self.n - 1, j))
                } else {
                    None
                }
            })
        })
    }
}

/// Extract the ordered lane from a rectangular, file-ordered grid.
///
/// # Errors
///
/// - [`MapError::BranchingPath`] if any PATH cell has more than two PATH neighbours
/// - [`MapError::NoEndpoints`] if no boundary PATH cell has exactly one PATH neighbour
/// - [`MapError::DisconnectedPath`] if PATH cells remain unvisited after the walk
pub fn extract_path(rows: &[Vec<TileType>]) -> Result<Vec<Coord>, MapError> {
    let n = rows.len();
    let m = rows.first().map_or(0, Vec::len);
    if n == 0 || m == 0 {
        return Err(MapError::Empty);
    }
    let grid = Grid { rows, n, m };

    let mut total = 0usize;
    for r in 0..n {
        for c in 0..m {
            if !grid.is_path(r, c) {
                continue;
            }
            total += 1;
            if grid.path_neighbours(r, c).count() > 2 {
                let at = grid.cartesian(r, c);
                return Err(MapError::BranchingPath { x: at.x, y: at.y });
            }
        }
    }

    let (mut r, mut c) = grid.first_endpoint().ok_or(MapError::NoEndpoints)?;

    let mut visited = vec![false; n * m];
    let mut path = Vec::with_capacity(total);
    loop {
        visited[r * m + c] = true;
        path.push(grid.cartesian(r, c));
        match grid.path_neighbours(r, c).find(|&(nr, nc)| !visited[nr * m + nc]) {
            Some(next) => (r, c) = next,
            None => break,
        }
    }

    if path.len() != total {
        return Err(MapError::DisconnectedPath {
            unreached: total - path.len(),
        });
    }

    Ok(path)
}
