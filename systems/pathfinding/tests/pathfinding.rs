use std::collections::VecDeque;

use maze_dungeon_core::{ObstacleView, SlotCoord};
use maze_dungeon_system_pathfinding::{astar, PathResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn bfs_distance(solid: &[bool], columns: u32, rows: u32, start: SlotCoord, goal: SlotCoord) -> Option<usize> {
    let view = ObstacleView::new(solid, columns, rows);
    if view.is_blocked(goal) {
        return None;
    }
    let index = |slot: SlotCoord| (slot.row() * columns + slot.column()) as usize;
    let mut distance = vec![None; solid.len()];
    distance[index(start)] = Some(0);
    let mut queue = VecDeque::from([start]);

    while let Some(slot) = queue.pop_front() {
        let current = distance[index(slot)].expect("queued slots have a distance");
        if slot == goal {
            return Some(current);
        }
        let (column, row) = (slot.column() as i64, slot.row() as i64);
        for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
            let (x, y) = (column + dx, row + dy);
            if x < 0 || y < 0 || x >= i64::from(columns) || y >= i64::from(rows) {
                continue;
            }
            let next = SlotCoord::new(x as u32, y as u32);
            if view.is_blocked(next) || distance[index(next)].is_some() {
                continue;
            }
            distance[index(next)] = Some(current + 1);
            queue.push_back(next);
        }
    }

    None
}

fn assert_walkable(path: &[SlotCoord], view: ObstacleView<'_>, start: SlotCoord, goal: SlotCoord) {
    if path.is_empty() {
        assert_eq!(start, goal);
        return;
    }
    assert_eq!(path.first(), Some(&goal));
    let mut previous = start;
    for slot in path.iter().rev() {
        assert!(!view.is_blocked(*slot), "path crosses {slot:?}");
        let step = previous.column().abs_diff(slot.column()) + previous.row().abs_diff(slot.row());
        assert_eq!(step, 1, "non-adjacent step {previous:?} -> {slot:?}");
        previous = *slot;
    }
}

#[test]
fn open_rooms_yield_shortest_paths() {
    for (columns, rows) in [(1, 6), (6, 4), (14, 10)] {
        let solid = vec![false; (columns * rows) as usize];
        let view = ObstacleView::new(&solid, columns, rows);
        for start_index in 0..columns * rows {
            let start = SlotCoord::new(start_index % columns, start_index / columns);
            for goal_index in (0..columns * rows).step_by(3) {
                let goal = SlotCoord::new(goal_index % columns, goal_index / columns);
                let PathResult::Found(path) = astar(view, start, goal) else {
                    panic!("open room must connect {start:?} and {goal:?}");
                };
                assert_walkable(&path, view, start, goal);
                let manhattan = start.column().abs_diff(goal.column()) + start.row().abs_diff(goal.row());
                assert_eq!(path.len(), manhattan as usize);
            }
        }
    }
}

#[test]
fn cluttered_rooms_agree_with_breadth_first_reachability() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    for _ in 0..300 {
        let columns = rng.gen_range(2..=14);
        let rows = rng.gen_range(2..=14);
        let mut solid: Vec<bool> = (0..columns * rows).map(|_| rng.gen_bool(0.25)).collect();
        let start = SlotCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
        let goal = SlotCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
        solid[(start.row() * columns + start.column()) as usize] = false;
        let view = ObstacleView::new(&solid, columns, rows);

        match (astar(view, start, goal), bfs_distance(&solid, columns, rows, start, goal)) {
            (PathResult::Found(path), Some(shortest)) => {
                assert_walkable(&path, view, start, goal);
                assert!(path.len() >= shortest);
            }
            (PathResult::NoPath, None) => {}
            (result, shortest) => panic!("search disagreed: {result:?} vs {shortest:?}"),
        }
    }
}

#[test]
fn single_corridor_matches_breadth_first_distance() {
    // Serpentine corridor: the only route is the shortest one.
    #[rustfmt::skip]
    let solid = [
        false, false, false, false, false,
        true,  true,  true,  true,  false,
        false, false, false, false, false,
        false, true,  true,  true,  true,
        false, false, false, false, false,
    ];
    let start = SlotCoord::new(0, 0);
    let goal = SlotCoord::new(4, 4);
    let view = ObstacleView::new(&solid, 5, 5);

    let PathResult::Found(path) = astar(view, start, goal) else {
        panic!("corridor is connected");
    };
    assert_walkable(&path, view, start, goal);
    assert_eq!(Some(path.len()), bfs_distance(&solid, 5, 5, start, goal));
    assert_eq!(path.len(), 16);
}
