//! Plain-text rendering of a floor for terminal output.

use std::fmt::Write as _;

use maze_dungeon_core::{CellCoord, Direction, MazeGrid};

/// Draws the grid with `+--+` posts, `|` walls, `##` rock, `. ` room floor
/// and `@ ` on the cell holding `marker`.
pub(crate) fn render(grid: &MazeGrid, marker: Option<CellCoord>) -> String {
    let mut out = String::new();
    for row in 0..grid.height() {
        horizontal_edge(&mut out, grid, row, Direction::North);
        for column in 0..grid.width() {
            let cell = CellCoord::new(column, row);
            out.push(if grid.has_wall(cell, Direction::West) {
                '|'
            } else {
                ' '
            });
            out.push_str(fill(grid, cell, marker));
        }
        let last = CellCoord::new(grid.width().saturating_sub(1), row);
        out.push(if grid.has_wall(last, Direction::East) {
            '|'
        } else {
            ' '
        });
        out.push('\n');
    }
    if let Some(bottom) = grid.height().checked_sub(1) {
        horizontal_edge(&mut out, grid, bottom, Direction::South);
    }
    out
}

fn horizontal_edge(out: &mut String, grid: &MazeGrid, row: u32, side: Direction) {
    for column in 0..grid.width() {
        let edge = if grid.has_wall(CellCoord::new(column, row), side) {
            "--"
        } else {
            "  "
        };
        let _ = write!(out, "+{edge}");
    }
    out.push_str("+\n");
}

fn fill(grid: &MazeGrid, cell: CellCoord, marker: Option<CellCoord>) -> &'static str {
    if marker == Some(cell) {
        "@ "
    } else if grid.is_solid(cell) {
        "##"
    } else if grid.room_at(cell).is_some() {
        ". "
    } else {
        "  "
    }
}
