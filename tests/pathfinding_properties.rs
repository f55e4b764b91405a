//! Property tests for the A* router, checked against a Dijkstra oracle.

use ::pathfinding::prelude::dijkstra;
use proptest::prelude::*;
use tactica::{
    new_entity_id, AStarPathfinder, AdjacentSearch, ClosestHeuristic, EntityId, GridModel, GridSnapshot,
    Identified, Mover, Position,
};

const SIDE: i32 = 12;

#[derive(Debug)]
struct Scout {
    id: EntityId,
    position: Position,
}

impl Identified for Scout {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Mover for Scout {
    fn position(&self) -> Position {
        self.position
    }

    fn movement(&self) -> u32 {
        0
    }
}

fn snapshot(blocked: &[bool]) -> GridSnapshot {
    let mut grid = GridSnapshot::new(SIDE, SIDE);
    for (index, is_blocked) in blocked.iter().enumerate() {
        if *is_blocked {
            let cell = Position::new(index as i32 % SIDE, index as i32 / SIDE);
            grid.block(cell).unwrap();
        }
    }
    grid
}

fn finder() -> AStarPathfinder {
    AStarPathfinder::with_heuristic(SIDE, SIDE, 10_000, true, Box::new(ClosestHeuristic))
}

/// Least number of moves from `start` to `target`, the start cell exempt from blocking.
fn oracle(grid: &GridSnapshot, start: Position, target: Position) -> Option<usize> {
    if grid.is_blocked(target).unwrap() && start != target {
        return None;
    }
    dijkstra(
        &start,
        |cell| {
            cell.adjacent_positions()
                .into_iter()
                .filter(|next| grid.contains(*next) && !grid.is_blocked(*next).unwrap())
                .map(|next| (next, 1usize))
                .collect::<Vec<_>>()
        },
        |cell| *cell == target,
    )
    .map(|(_, cost)| cost)
}

fn orthogonal(grid: &GridSnapshot, cell: Position) -> Vec<Position> {
    cell.cardinal_adjacent_positions()
        .into_iter()
        .filter(|next| grid.contains(*next))
        .collect()
}

fn cell() -> impl Strategy<Value = Position> {
    (0..SIDE, 0..SIDE).prop_map(|(x, y)| Position::new(x, y))
}

fn walls() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.3), (SIDE * SIDE) as usize)
}

proptest! {
    #[test]
    fn routes_are_shortest(blocked in walls(), start in cell(), target in cell()) {
        let grid = snapshot(&blocked);
        let scout = Scout { id: new_entity_id(), position: start };
        let route = finder().find_path(&grid, &scout, start, target);

        match (route, oracle(&grid, start, target)) {
            (Some(route), Some(moves)) => prop_assert_eq!(route.moves(), moves),
            (None, None) => {}
            (route, moves) => prop_assert!(false, "router {:?} disagrees with oracle {:?}", route, moves),
        }
    }

    #[test]
    fn routes_are_contiguous_and_avoid_blocked_cells(
        blocked in walls(),
        start in cell(),
        target in cell(),
    ) {
        let grid = snapshot(&blocked);
        let scout = Scout { id: new_entity_id(), position: start };
        if let Some(route) = finder().find_path(&grid, &scout, start, target) {
            prop_assert_eq!(route.first(), Some(start));
            prop_assert_eq!(route.destination(), Some(target));
            prop_assert!(route.is_contiguous());
            for step in route.iter().skip(1) {
                prop_assert!(!grid.blocked(&scout, step));
            }
        }
    }

    #[test]
    fn reused_finder_agrees_with_fresh_one(
        blocked in walls(),
        queries in prop::collection::vec((cell(), cell()), 1..8),
    ) {
        let grid = snapshot(&blocked);
        let mut shared = finder();
        for (start, target) in queries {
            let scout = Scout { id: new_entity_id(), position: start };
            let reused = shared.find_path(&grid, &scout, start, target).map(|route| route.moves());
            let fresh = finder().find_path(&grid, &scout, start, target).map(|route| route.moves());
            prop_assert_eq!(reused, fresh);
        }
    }

    #[test]
    fn shade_marks_exactly_the_routable_cells(blocked in walls(), start in cell()) {
        let grid = snapshot(&blocked);
        let scout = Scout { id: new_entity_id(), position: start };
        let mut router = finder();
        let shade = router.movement_shade(&grid, &scout);
        for x in 0..SIDE {
            for y in 0..SIDE {
                let target = Position::new(x, y);
                prop_assert_eq!(
                    shade.is_reachable(target),
                    oracle(&grid, start, target).is_some()
                );
            }
        }
    }

    #[test]
    fn surrounding_fallback_takes_the_nearest_neighbour(
        blocked in walls(),
        start in cell(),
        target in cell(),
    ) {
        let grid = snapshot(&blocked);
        let scout = Scout { id: new_entity_id(), position: start };
        let mut router = finder();
        router.set_adjacent_search(AdjacentSearch::Surrounding);
        let fallback = router.find_path_adjacent(&grid, &scout, start, target);

        if let Some(direct) = router.find_path(&grid, &scout, start, target) {
            prop_assert_eq!(fallback.map(|route| route.moves()), Some(direct.moves()));
            return Ok(());
        }
        for neighbour in orthogonal(&grid, target) {
            if let Some(route) = router.find_path(&grid, &scout, start, neighbour) {
                let fallback_len = fallback.as_ref().map(|route| route.len());
                prop_assert!(fallback_len.is_some_and(|len| len <= route.len()));
            }
        }
        let any_neighbour = target
            .adjacent_positions()
            .into_iter()
            .filter(|neighbour| grid.contains(*neighbour))
            .any(|neighbour| router.find_path(&grid, &scout, start, neighbour).is_some());
        prop_assert_eq!(fallback.is_some(), any_neighbour);
    }
}
