#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Slot-level path search and sight lines inside a single room.
//!
//! Both queries operate on the [`ObstacleView`] of the active room, where only
//! solid static entities block movement. Enemies and the player never appear
//! in the view, so searches start and end freely on occupied slots.

use maze_dungeon_core::{ObstacleView, SlotCoord};

/// Outcome of a path search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathResult {
    /// Slots leading to the goal, ordered goal first. The last element is the
    /// first step away from the start, which itself is excluded.
    Found(Vec<SlotCoord>),
    /// The goal is blocked, out of bounds or unreachable.
    NoPath,
}

impl PathResult {
    /// First slot to move toward, if a non-empty path exists.
    #[must_use]
    pub fn first_step(&self) -> Option<SlotCoord> {
        match self {
            Self::Found(path) => path.last().copied(),
            Self::NoPath => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeState {
    Unseen,
    Open,
    Closed,
}

/// Searches a four-connected path from `start` to `goal`.
///
/// The open set is scanned linearly and the first node with the lowest
/// `g + h` wins. Steps cost one and `h` is the squared Euclidean distance, so
/// the search leans greedily toward the goal and may return a longer path
/// than the shortest one around obstacles.
#[must_use]
pub fn astar(view: ObstacleView<'_>, start: SlotCoord, goal: SlotCoord) -> PathResult {
    if !view.contains(start) || view.is_blocked(goal) {
        return PathResult::NoPath;
    }
    if start == goal {
        return PathResult::Found(Vec::new());
    }

    let (columns, rows) = view.dimensions();
    let Some(len) = usize::try_from(u64::from(columns) * u64::from(rows)).ok() else {
        return PathResult::NoPath;
    };
    let (Some(start_index), Some(goal_index)) = (index(columns, start), index(columns, goal)) else {
        return PathResult::NoPath;
    };

    let mut state = vec![NodeState::Unseen; len];
    let mut cost = vec![0u64; len];
    let mut parent: Vec<Option<usize>> = vec![None; len];
    let mut open = vec![start_index];
    state[start_index] = NodeState::Open;

    while let Some(position) = lowest_score(&open, &cost, columns, goal) {
        let current = open.remove(position);
        if current == goal_index {
            return PathResult::Found(unwind(&parent, start_index, goal_index, columns));
        }
        state[current] = NodeState::Closed;

        let Some(slot) = slot_at(columns, current) else {
            continue;
        };
        for neighbor in neighbors(slot, columns, rows) {
            if view.is_blocked(neighbor) {
                continue;
            }
            let Some(next) = index(columns, neighbor) else {
                continue;
            };
            let tentative = cost[current] + 1;
            match state[next] {
                NodeState::Closed => {}
                NodeState::Open => {
                    if tentative < cost[next] {
                        cost[next] = tentative;
                        parent[next] = Some(current);
                    }
                }
                NodeState::Unseen => {
                    state[next] = NodeState::Open;
                    cost[next] = tentative;
                    parent[next] = Some(current);
                    open.push(next);
                }
            }
        }
    }

    PathResult::NoPath
}

/// Reports whether a straight line between two slots crosses no obstacle.
///
/// Both endpoints are tested, so a line into a blocked slot is never clear.
#[must_use]
pub fn line_of_sight(view: ObstacleView<'_>, from: SlotCoord, to: SlotCoord) -> bool {
    if !view.contains(from) || !view.contains(to) {
        return false;
    }

    let (mut x, mut y) = (i64::from(from.column()), i64::from(from.row()));
    let (x1, y1) = (i64::from(to.column()), i64::from(to.row()));
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut error = dx + dy;

    loop {
        let (Ok(column), Ok(row)) = (u32::try_from(x), u32::try_from(y)) else {
            return false;
        };
        if view.is_blocked(SlotCoord::new(column, row)) {
            return false;
        }
        if x == x1 && y == y1 {
            return true;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += sx;
        }
        if doubled <= dx {
            error += dx;
            y += sy;
        }
    }
}

fn heuristic(slot: SlotCoord, goal: SlotCoord) -> u64 {
    let dx = u64::from(slot.column().abs_diff(goal.column()));
    let dy = u64::from(slot.row().abs_diff(goal.row()));
    dx * dx + dy * dy
}

fn lowest_score(open: &[usize], cost: &[u64], columns: u32, goal: SlotCoord) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (position, &node) in open.iter().enumerate() {
        let Some(slot) = slot_at(columns, node) else {
            continue;
        };
        let score = cost[node] + heuristic(slot, goal);
        if best.map_or(true, |(_, lowest)| score < lowest) {
            best = Some((position, score));
        }
    }
    best.map(|(position, _)| position)
}

fn unwind(parent: &[Option<usize>], start: usize, goal: usize, columns: u32) -> Vec<SlotCoord> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        let Some(slot) = slot_at(columns, current) else {
            break;
        };
        path.push(slot);
        match parent[current] {
            Some(previous) => current = previous,
            None => break,
        }
    }
    path
}

fn neighbors(slot: SlotCoord, columns: u32, rows: u32) -> impl Iterator<Item = SlotCoord> {
    let (column, row) = (slot.column(), slot.row());
    [
        (column + 1 < columns).then(|| SlotCoord::new(column + 1, row)),
        (row + 1 < rows).then(|| SlotCoord::new(column, row + 1)),
        column.checked_sub(1).map(|left| SlotCoord::new(left, row)),
        row.checked_sub(1).map(|up| SlotCoord::new(column, up)),
    ]
    .into_iter()
    .flatten()
}

fn index(columns: u32, slot: SlotCoord) -> Option<usize> {
    let width = usize::try_from(columns).ok()?;
    let row = usize::try_from(slot.row()).ok()?;
    let column = usize::try_from(slot.column()).ok()?;
    Some(row * width + column)
}

fn slot_at(columns: u32, index: usize) -> Option<SlotCoord> {
    let width = usize::try_from(columns).ok().filter(|width| *width > 0)?;
    let column = u32::try_from(index % width).ok()?;
    let row = u32::try_from(index / width).ok()?;
    Some(SlotCoord::new(column, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(solid: &[bool], columns: u32, rows: u32) -> ObstacleView<'_> {
        ObstacleView::new(solid, columns, rows)
    }

    #[test]
    fn path_is_ordered_goal_first() {
        let solid = [false; 9];
        let result = astar(view(&solid, 3, 3), SlotCoord::new(0, 0), SlotCoord::new(2, 0));
        assert_eq!(
            result,
            PathResult::Found(vec![SlotCoord::new(2, 0), SlotCoord::new(1, 0)])
        );
        assert_eq!(result.first_step(), Some(SlotCoord::new(1, 0)));
    }

    #[test]
    fn ties_prefer_positive_x_first() {
        let solid = [false; 4];
        let result = astar(view(&solid, 2, 2), SlotCoord::new(0, 0), SlotCoord::new(1, 1));
        assert_eq!(result.first_step(), Some(SlotCoord::new(1, 0)));
    }

    #[test]
    fn start_on_goal_yields_empty_path() {
        let solid = [false; 4];
        let result = astar(view(&solid, 2, 2), SlotCoord::new(1, 1), SlotCoord::new(1, 1));
        assert_eq!(result, PathResult::Found(Vec::new()));
        assert_eq!(result.first_step(), None);
    }

    #[test]
    fn blocked_or_outside_goals_have_no_path() {
        #[rustfmt::skip]
        let solid = [
            false, true,
            false, false,
        ];
        let view = view(&solid, 2, 2);
        assert_eq!(
            astar(view, SlotCoord::new(0, 0), SlotCoord::new(1, 0)),
            PathResult::NoPath
        );
        assert_eq!(
            astar(view, SlotCoord::new(0, 0), SlotCoord::new(5, 0)),
            PathResult::NoPath
        );
        assert_eq!(
            astar(view, SlotCoord::new(9, 9), SlotCoord::new(0, 1)),
            PathResult::NoPath
        );
    }

    #[test]
    fn walls_route_the_path_around() {
        #[rustfmt::skip]
        let solid = [
            false, true, false,
            false, true, false,
            false, false, false,
        ];
        let result = astar(view(&solid, 3, 3), SlotCoord::new(0, 0), SlotCoord::new(2, 0));
        let PathResult::Found(path) = result else {
            panic!("expected a path");
        };
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&SlotCoord::new(2, 0)));
        assert_eq!(path.last(), Some(&SlotCoord::new(0, 1)));
    }

    #[test]
    fn sealed_goal_is_unreachable() {
        #[rustfmt::skip]
        let solid = [
            false, true, false,
            true, true, false,
            false, false, false,
        ];
        assert_eq!(
            astar(view(&solid, 3, 3), SlotCoord::new(0, 0), SlotCoord::new(2, 2)),
            PathResult::NoPath
        );
    }

    #[test]
    fn sight_lines_stop_at_obstacles() {
        #[rustfmt::skip]
        let solid = [
            false, false, false, false,
            false, true, false, false,
            false, false, false, false,
        ];
        let view = view(&solid, 4, 3);
        assert!(line_of_sight(view, SlotCoord::new(0, 0), SlotCoord::new(3, 0)));
        assert!(!line_of_sight(view, SlotCoord::new(0, 1), SlotCoord::new(3, 1)));
        assert!(!line_of_sight(view, SlotCoord::new(0, 0), SlotCoord::new(2, 2)));
        assert!(line_of_sight(view, SlotCoord::new(2, 2), SlotCoord::new(2, 2)));
        assert!(!line_of_sight(view, SlotCoord::new(1, 1), SlotCoord::new(1, 1)));
        assert!(!line_of_sight(view, SlotCoord::new(0, 0), SlotCoord::new(4, 0)));
    }
}
