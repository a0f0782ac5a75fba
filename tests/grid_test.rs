//! Grid placement tests

use grid_traffic::simulation::{
    Cell, Direction, Entity, Grid, MapDecodeError, SimError, SimId, VehicleId,
};

const VEHICLE: Entity = Entity::Vehicle(VehicleId(SimId(1)));

#[test]
fn test_insert_outside_grid_is_rejected() {
    let mut grid = Grid::new(3, 2);

    assert_eq!(
        grid.insert(Cell::new(3, 0), Entity::Road(Direction::Right)),
        Err(SimError::OutOfBounds(Cell::new(3, 0)))
    );
    assert_eq!(
        grid.insert(Cell::new(0, -1), VEHICLE),
        Err(SimError::OutOfBounds(Cell::new(0, -1)))
    );
    assert!(grid.contents(Cell::new(3, 0)).is_empty());
    assert_eq!(grid.vehicles().count(), 0);

    assert_eq!(grid.insert(Cell::new(2, 1), VEHICLE), Ok(()));
    assert_eq!(grid.vehicle_at(Cell::new(2, 1)), Some(VehicleId(SimId(1))));
}

#[test]
fn test_move_outside_grid_leaves_entity_in_place() {
    let mut grid = Grid::new(3, 2);
    grid.insert(Cell::new(2, 0), Entity::Road(Direction::Right)).unwrap();
    grid.insert(Cell::new(2, 0), VEHICLE).unwrap();

    assert_eq!(
        grid.move_entity(VEHICLE, Cell::new(2, 0), Cell::new(3, 0)),
        Err(SimError::OutOfBounds(Cell::new(3, 0)))
    );
    assert_eq!(grid.vehicle_at(Cell::new(2, 0)), Some(VehicleId(SimId(1))));

    grid.move_entity(VEHICLE, Cell::new(2, 0), Cell::new(1, 0)).unwrap();
    assert_eq!(grid.vehicle_at(Cell::new(2, 0)), None);
    assert_eq!(grid.vehicle_at(Cell::new(1, 0)), Some(VehicleId(SimId(1))));
    // The road underneath stays put
    assert_eq!(grid.contents(Cell::new(2, 0)), &[Entity::Road(Direction::Right)]);

    assert!(grid.remove(Cell::new(1, 0), VEHICLE));
    assert!(!grid.remove(Cell::new(1, 0), VEHICLE));
}

#[test]
fn test_out_of_grid_placement_is_a_decode_error() {
    let err = MapDecodeError::CellOutsideGrid { cell: Cell::new(7, 2) };
    assert_eq!(err.to_string(), format!("{} lies outside the grid", Cell::new(7, 2)));
}
