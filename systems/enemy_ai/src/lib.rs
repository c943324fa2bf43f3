#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns enemy snapshots into steering and firing commands.

use glam::Vec2;
use maze_dungeon_core::{
    Archetype, Command, EnemySnapshot, EnemyView, Event, ObstacleView, PlayerSnapshot, Room,
    SlotCoord, CELL_SIZE,
};
use maze_dungeon_system_pathfinding::{astar, line_of_sight, PathResult};

/// Melee enemies charge directly once the player is this close and visible.
pub const CHASE_RANGE: f32 = 2.0 * CELL_SIZE;
/// Shooters back away when the player comes closer than this.
pub const FLEE_RANGE: f32 = 1.5 * CELL_SIZE;
/// Shooters stand and fire at visible players within this distance.
pub const FIRE_RANGE: f32 = 3.0 * CELL_SIZE;

/// Everything a policy may look at while deciding on one enemy.
struct Situation<'a> {
    room: &'a Room,
    obstacles: ObstacleView<'a>,
    player: Vec2,
    player_slot: Option<SlotCoord>,
}

impl Situation<'_> {
    fn sees_player(&self, enemy: &EnemySnapshot) -> bool {
        let (Some(from), Some(to)) = (self.room.slot_at(enemy.position), self.player_slot) else {
            return false;
        };
        line_of_sight(self.obstacles, from, to)
    }

    /// Steering toward the next slot on the path, or straight at the player
    /// when both share a slot. `None` when the player is unreachable.
    fn path_toward_player(&self, enemy: &EnemySnapshot) -> Option<Vec2> {
        let start = self.room.slot_at(enemy.position)?;
        let goal = self.player_slot?;
        match astar(self.obstacles, start, goal) {
            PathResult::Found(path) => Some(match path.last() {
                Some(step) => self.room.slot_center(*step) - enemy.position,
                None => self.player - enemy.position,
            }),
            PathResult::NoPath => None,
        }
    }
}

type Policy = fn(&Situation<'_>, &EnemySnapshot, &mut Vec<Command>);

/// Behaviour table indexed by archetype.
const POLICIES: [(Archetype, Policy); 3] = [
    (Archetype::Walker, melee),
    (Archetype::Bruiser, melee),
    (Archetype::Shooter, shooter),
];

fn policy_for(archetype: Archetype) -> Option<Policy> {
    POLICIES
        .iter()
        .find(|(candidate, _)| *candidate == archetype)
        .map(|(_, policy)| *policy)
}

fn steer(enemy: &EnemySnapshot, direction: Vec2, out: &mut Vec<Command>) {
    out.push(Command::SteerEnemy {
        enemy: enemy.id,
        direction,
    });
}

fn melee(situation: &Situation<'_>, enemy: &EnemySnapshot, out: &mut Vec<Command>) {
    let offset = situation.player - enemy.position;
    let direction = if offset.length() < CHASE_RANGE && situation.sees_player(enemy) {
        offset
    } else {
        situation.path_toward_player(enemy).unwrap_or(Vec2::ZERO)
    };
    steer(enemy, direction, out);
}

fn shooter(situation: &Situation<'_>, enemy: &EnemySnapshot, out: &mut Vec<Command>) {
    let offset = situation.player - enemy.position;
    let distance = offset.length();

    if distance < FLEE_RANGE {
        steer(enemy, -offset, out);
    } else if distance < FIRE_RANGE && situation.sees_player(enemy) {
        steer(enemy, Vec2::ZERO, out);
        if enemy.ready_to_fire {
            out.push(Command::FireProjectile {
                enemy: enemy.id,
                direction: offset,
            });
        }
    } else {
        let direction = situation.path_toward_player(enemy).unwrap_or(Vec2::ZERO);
        steer(enemy, direction, out);
    }
}

/// Enemy behaviour system dispatching one policy per archetype.
#[derive(Debug, Default)]
pub struct EnemyAi;

impl EnemyAi {
    /// Creates a new enemy behaviour system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits steering and firing commands for every living enemy.
    ///
    /// Commands are only produced on ticks that advanced time, and only while
    /// the player stands in the room the enemies belong to.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        room: Option<&Room>,
        obstacles: Option<ObstacleView<'_>>,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }
        let (Some(room), Some(obstacles)) = (room, obstacles) else {
            return;
        };

        let situation = Situation {
            room,
            obstacles,
            player: player.position,
            player_slot: room.slot_at(player.position),
        };
        if situation.player_slot.is_none() {
            return;
        }

        for enemy in enemies.iter().filter(|enemy| enemy.alive) {
            if let Some(policy) = policy_for(enemy.archetype) {
                policy(&situation, enemy, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_dungeon_core::{
        CellCoord, CellRect, CellRectSize, Direction, EntityId, RoomId,
    };
    use std::time::Duration;

    fn room() -> Room {
        Room::new(
            RoomId::new(1),
            CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(4, 2)),
        )
    }

    fn player_at(position: Vec2) -> PlayerSnapshot {
        PlayerSnapshot {
            position,
            velocity: Vec2::ZERO,
            half_extents: Vec2::new(15.0, 12.5),
            facing: Direction::South,
            health: 6.0,
            max_health: 6.0,
            invulnerable: false,
            hurt: false,
        }
    }

    fn enemy(index: u32, archetype: Archetype, position: Vec2, ready_to_fire: bool) -> EnemySnapshot {
        EnemySnapshot {
            id: EntityId::new(index, 0),
            archetype,
            position,
            velocity: Vec2::ZERO,
            half_extents: Vec2::splat(12.5),
            alive: true,
            ready_to_fire,
        }
    }

    fn tick() -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        }]
    }

    fn run(solid: &[bool], player: Vec2, enemies: Vec<EnemySnapshot>) -> Vec<Command> {
        let room = room();
        let view = ObstacleView::new(solid, room.slot_columns(), room.slot_rows());
        let mut out = Vec::new();
        EnemyAi::new().handle(
            &tick(),
            &player_at(player),
            &EnemyView::from_snapshots(enemies),
            Some(&room),
            Some(view),
            &mut out,
        );
        out
    }

    fn steering(commands: &[Command], index: u32) -> Option<Vec2> {
        commands.iter().find_map(|command| match command {
            Command::SteerEnemy { enemy, direction } if enemy.index() == index => Some(*direction),
            _ => None,
        })
    }

    #[test]
    fn nearby_walkers_charge_straight_at_the_player() {
        let solid = [false; 32];
        let commands = run(
            &solid,
            Vec2::new(75.0, 75.0),
            vec![enemy(0, Archetype::Walker, Vec2::new(175.0, 75.0), false)],
        );
        assert_eq!(steering(&commands, 0), Some(Vec2::new(-100.0, 0.0)));
    }

    #[test]
    fn distant_walkers_follow_the_path() {
        let solid = [false; 32];
        let commands = run(
            &solid,
            Vec2::new(25.0, 25.0),
            vec![enemy(0, Archetype::Bruiser, Vec2::new(375.0, 25.0), false)],
        );
        // First step from slot (7, 0) is slot (6, 0), centred at (325, 25).
        assert_eq!(steering(&commands, 0), Some(Vec2::new(-50.0, 0.0)));
    }

    #[test]
    fn blocked_sight_lines_force_a_detour() {
        let mut solid = [false; 32];
        // Wall of rocks across slot column 2, open only on the bottom row.
        for row in 0..3 {
            solid[row * 8 + 2] = true;
        }
        let commands = run(
            &solid,
            Vec2::new(25.0, 25.0),
            vec![enemy(0, Archetype::Walker, Vec2::new(175.0, 25.0), false)],
        );
        let direction = steering(&commands, 0).expect("walker steers");
        assert!(direction.y > 0.0, "expected a detour downward, got {direction:?}");
    }

    #[test]
    fn unreachable_players_make_melee_enemies_hold() {
        let mut solid = [false; 32];
        for row in 0..4 {
            solid[row * 8 + 2] = true;
        }
        let commands = run(
            &solid,
            Vec2::new(25.0, 25.0),
            vec![enemy(0, Archetype::Walker, Vec2::new(375.0, 25.0), false)],
        );
        assert_eq!(steering(&commands, 0), Some(Vec2::ZERO));
    }

    #[test]
    fn shooters_flee_hold_and_fire() {
        let solid = [false; 32];
        let player = Vec2::new(25.0, 75.0);
        let commands = run(
            &solid,
            player,
            vec![
                enemy(0, Archetype::Shooter, Vec2::new(125.0, 75.0), true),
                enemy(1, Archetype::Shooter, Vec2::new(275.0, 75.0), true),
                enemy(2, Archetype::Shooter, Vec2::new(275.0, 25.0), false),
            ],
        );

        assert_eq!(steering(&commands, 0), Some(Vec2::new(100.0, 0.0)));
        assert_eq!(steering(&commands, 1), Some(Vec2::ZERO));
        assert_eq!(steering(&commands, 2), Some(Vec2::ZERO));
        let fired: Vec<_> = commands
            .iter()
            .filter_map(|command| match command {
                Command::FireProjectile { enemy, direction } => Some((enemy.index(), *direction)),
                _ => None,
            })
            .collect();
        assert_eq!(fired, vec![(1, Vec2::new(-250.0, 0.0))]);
    }

    #[test]
    fn dead_enemies_and_idle_ticks_produce_nothing() {
        let solid = [false; 32];
        let mut dying = enemy(0, Archetype::Walker, Vec2::new(175.0, 75.0), false);
        dying.alive = false;
        assert!(run(&solid, Vec2::new(75.0, 75.0), vec![dying]).is_empty());

        let room = room();
        let mut out = Vec::new();
        EnemyAi::new().handle(
            &[],
            &player_at(Vec2::new(75.0, 75.0)),
            &EnemyView::from_snapshots(vec![enemy(0, Archetype::Walker, Vec2::new(175.0, 75.0), false)]),
            Some(&room),
            Some(ObstacleView::new(&solid, 8, 4)),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn every_archetype_has_a_policy() {
        for archetype in [Archetype::Walker, Archetype::Bruiser, Archetype::Shooter] {
            assert!(policy_for(archetype).is_some());
        }
    }
}
