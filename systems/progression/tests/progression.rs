use std::time::Duration;

use maze_dungeon_core::{
    CellCoord, CellRect, CellRectSize, Command, Direction, Event, GeneratedFloor, MazeGrid,
    ObstacleTemplate, PlayerInput, Room, RoomId, RoomPlan, WallMask,
};
use maze_dungeon_system_generation::{GenerationConfig, MazeGenerator};
use maze_dungeon_system_progression::{DoorRitual, Progression, RitualPhase};
use maze_dungeon_world::{self as world, query, Config, World};

/// A 2x1 room whose exit door sits in the top-left slot.
fn doorway_floor() -> GeneratedFloor {
    let room = RoomId::new(1);
    let mut grid = MazeGrid::solid(2, 1);
    let _ = grid.set(CellCoord::new(0, 0), WallMask::from_bits(0b1011), Some(room));
    let _ = grid.set(CellCoord::new(1, 0), WallMask::from_bits(0b1110), Some(room));

    let mut codes = [0; 8];
    codes[0] = 5;
    GeneratedFloor {
        level: 1,
        grid,
        rooms: vec![Room::new(
            room,
            CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(2, 1)),
        )],
        plans: vec![RoomPlan {
            room,
            template: ObstacleTemplate::from_codes(4, 2, &codes).expect("valid template"),
            needs_exit_door: true,
        }],
        entry_room: Some(room),
        exit_room: Some(room),
    }
}

fn progression() -> Progression {
    let generator = MazeGenerator::new(GenerationConfig {
        width: 17,
        height: 13,
        ..GenerationConfig::default()
    })
    .expect("valid config");
    Progression::new(generator, DoorRitual::default(), 99)
}

#[test]
fn holding_the_unlocked_door_advances_the_floor() {
    let mut world = World::new(doorway_floor(), Config::new(6.0, 5));
    let mut progression = progression();
    let input = PlayerInput {
        movement: Direction::West.unit_vector(),
        shoot: None,
    };

    let mut carried = Vec::new();
    let mut log = Vec::new();
    let mut transition_ticks = 0;
    for _ in 0..600 {
        let mut events = std::mem::take(&mut carried);
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
                input,
            },
            &mut events,
        );
        world::apply(&mut world, Command::ResolveCollisions, &mut events);

        let mut commands = Vec::new();
        progression.handle(&events, &mut commands);
        if progression.snapshot().phase == RitualPhase::Transitioning {
            transition_ticks += 1;
        }
        for command in commands {
            log.push(command.clone());
            world::apply(&mut world, command, &mut carried);
        }
        if carried
            .iter()
            .any(|event| matches!(event, Event::FloorAdvanced { .. }))
        {
            break;
        }
    }

    let transitions = log
        .iter()
        .filter(|command| matches!(command, Command::BeginFloorTransition))
        .count();
    assert_eq!(transitions, 1);
    assert!(carried.contains(&Event::FloorAdvanced { floor: 2 }));
    // The ready state must stay visible for at least the minimum duration.
    assert!(transition_ticks >= 31, "transition lasted {transition_ticks} ticks");

    assert_eq!(query::floor(&world), 2);
    assert_eq!(query::level(&world), 2);
    assert_eq!(query::grid(&world).width(), 17);
    assert!(!query::is_transitioning(&world));

    progression.handle(&carried, &mut Vec::new());
    assert_eq!(progression.floor(), 2);
}

#[test]
fn locked_rooms_never_report_door_contact() {
    let mut floor = doorway_floor();
    let mut codes = [0; 8];
    codes[0] = 5;
    codes[7] = 4;
    floor.plans[0].template = ObstacleTemplate::from_codes(4, 2, &codes).expect("valid template");

    let mut world = World::new(floor, Config::new(6.0, 5));
    let mut progression = progression();
    let input = PlayerInput {
        movement: Direction::West.unit_vector(),
        shoot: None,
    };

    for _ in 0..200 {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
                input,
            },
            &mut events,
        );
        world::apply(&mut world, Command::ResolveCollisions, &mut events);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::DoorContact { .. })));

        let mut commands = Vec::new();
        progression.handle(&events, &mut commands);
        assert!(commands.is_empty());
    }
    assert_eq!(progression.snapshot().phase, RitualPhase::Idle);
}
