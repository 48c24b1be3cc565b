use domus::core::error::DomusError;
use domus::core::store::Store;
use domus::plugins::{directory, occupancy};
use tempfile::tempdir;

struct Campus {
    room_a: i64,
    room_b: i64,
    residents: Vec<i64>,
}

/// One building with a 3-bed and a 2-bed room, six unassigned residents.
fn seed_campus(store: &Store) -> Campus {
    let admin = directory::add_administrator(store, "Margaret", "Holt", "north-key").unwrap();
    let building = occupancy::add_building(store, 1, 2, admin).unwrap();
    let room_a = occupancy::add_room(store, 101, 3, building).unwrap();
    let room_b = occupancy::add_room(store, 102, 2, building).unwrap();

    let names = [
        ("Alice", "Ward"),
        ("Ben", "Carver"),
        ("Clara", "Osei"),
        ("Daniel", "Frost"),
        ("Edith", "Marsh"),
        ("Felix", "Nowak"),
    ];
    let residents = names
        .iter()
        .enumerate()
        .map(|(i, (given, family))| {
            directory::add_resident(store, given, family, 100_000 + i as i64, "pw").unwrap()
        })
        .collect();

    Campus {
        room_a,
        room_b,
        residents,
    }
}

fn assert_invariants(store: &Store, campus: &Campus) {
    // At most one active assignment per resident.
    for &resident in &campus.residents {
        let held = occupancy::resident_room(store, resident).unwrap();
        let occupied_in: usize = [campus.room_a, campus.room_b]
            .iter()
            .filter(|&&room| {
                occupancy::room_occupants(store, room)
                    .unwrap()
                    .iter()
                    .any(|r| r.id == resident)
            })
            .count();
        assert!(occupied_in <= 1, "resident {} in {} rooms", resident, occupied_in);
        assert_eq!(held.is_some(), occupied_in == 1);
    }
    // Never above capacity.
    assert!(occupancy::room_occupants(store, campus.room_a).unwrap().len() <= 3);
    assert!(occupancy::room_occupants(store, campus.room_b).unwrap().len() <= 2);
}

#[test]
fn settle_evict_round_trip() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);
    let alice = campus.residents[0];

    assert!(occupancy::resident_room(&store, alice).unwrap().is_none());

    occupancy::settle(&store, alice, campus.room_a).unwrap();
    let held = occupancy::resident_room(&store, alice).unwrap().unwrap();
    assert_eq!(held.id, campus.room_a);

    occupancy::evict(&store, alice).unwrap();
    assert!(occupancy::resident_room(&store, alice).unwrap().is_none());
    assert_invariants(&store, &campus);
}

#[test]
fn evict_is_idempotent() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);
    let ben = campus.residents[1];

    occupancy::settle(&store, ben, campus.room_b).unwrap();
    occupancy::evict(&store, ben).unwrap();
    // A second eviction of an unassigned resident is a no-op, not an error.
    occupancy::evict(&store, ben).unwrap();
    assert!(occupancy::resident_room(&store, ben).unwrap().is_none());
}

#[test]
fn settle_rejects_full_room() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);

    for &resident in &campus.residents[0..3] {
        occupancy::settle(&store, resident, campus.room_a).unwrap();
    }

    let overflow = campus.residents[3];
    let err = occupancy::settle(&store, overflow, campus.room_a).unwrap_err();
    assert!(matches!(err, DomusError::RoomFull(id) if id == campus.room_a));
    assert!(occupancy::resident_room(&store, overflow).unwrap().is_none());
    assert_eq!(
        occupancy::room_occupants(&store, campus.room_a).unwrap().len(),
        3
    );
    assert_invariants(&store, &campus);
}

#[test]
fn settle_rejects_already_assigned_and_keeps_old_room() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);
    let clara = campus.residents[2];

    occupancy::settle(&store, clara, campus.room_a).unwrap();
    let err = occupancy::settle(&store, clara, campus.room_b).unwrap_err();
    assert!(matches!(err, DomusError::AlreadyAssigned(id) if id == clara));

    let held = occupancy::resident_room(&store, clara).unwrap().unwrap();
    assert_eq!(held.id, campus.room_a);
    assert!(occupancy::room_occupants(&store, campus.room_b).unwrap().is_empty());
}

#[test]
fn settle_rejects_unknown_ids() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);

    let err = occupancy::settle(&store, 9999, campus.room_a).unwrap_err();
    assert!(matches!(err, DomusError::NotFound(_)));

    let err = occupancy::settle(&store, campus.residents[0], 9999).unwrap_err();
    assert!(matches!(err, DomusError::NotFound(_)));

    let err = occupancy::evict(&store, 9999).unwrap_err();
    assert!(matches!(err, DomusError::NotFound(_)));
}

#[test]
fn transfer_moves_resident() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);
    let daniel = campus.residents[3];

    occupancy::settle(&store, daniel, campus.room_a).unwrap();
    occupancy::transfer(&store, daniel, campus.room_b).unwrap();

    let held = occupancy::resident_room(&store, daniel).unwrap().unwrap();
    assert_eq!(held.id, campus.room_b);
    assert!(occupancy::room_occupants(&store, campus.room_a).unwrap().is_empty());
    assert_invariants(&store, &campus);
}

#[test]
fn transfer_rejects_unassigned_resident() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);
    let edith = campus.residents[4];

    let err = occupancy::transfer(&store, edith, campus.room_b).unwrap_err();
    assert!(matches!(err, DomusError::NotAssigned(id) if id == edith));
    assert!(occupancy::resident_room(&store, edith).unwrap().is_none());
}

#[test]
fn failed_transfer_leaves_resident_in_place() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);

    // Fill the 2-bed room, then house Felix elsewhere.
    occupancy::settle(&store, campus.residents[0], campus.room_b).unwrap();
    occupancy::settle(&store, campus.residents[1], campus.room_b).unwrap();
    let felix = campus.residents[5];
    occupancy::settle(&store, felix, campus.room_a).unwrap();

    // Capacity is checked before the old room is vacated: a transfer
    // into a full room fails and the resident keeps the old assignment.
    let err = occupancy::transfer(&store, felix, campus.room_b).unwrap_err();
    assert!(matches!(err, DomusError::RoomFull(id) if id == campus.room_b));

    let held = occupancy::resident_room(&store, felix).unwrap().unwrap();
    assert_eq!(held.id, campus.room_a);
    assert_invariants(&store, &campus);
}

#[test]
fn transfer_within_same_room_is_allowed() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);

    // A full room still admits a transfer from itself to itself; the
    // capacity count excludes the transferring resident.
    occupancy::settle(&store, campus.residents[0], campus.room_b).unwrap();
    occupancy::settle(&store, campus.residents[1], campus.room_b).unwrap();
    occupancy::transfer(&store, campus.residents[0], campus.room_b).unwrap();

    let held = occupancy::resident_room(&store, campus.residents[0])
        .unwrap()
        .unwrap();
    assert_eq!(held.id, campus.room_b);
    assert_eq!(
        occupancy::room_occupants(&store, campus.room_b).unwrap().len(),
        2
    );
}

#[test]
fn free_rooms_recomputes_live() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let campus = seed_campus(&store);

    let free: Vec<i64> = occupancy::free_rooms(&store)
        .unwrap()
        .iter()
        .map(|occ| occ.room.id)
        .collect();
    assert_eq!(free, vec![campus.room_a, campus.room_b]);

    occupancy::settle(&store, campus.residents[0], campus.room_b).unwrap();
    occupancy::settle(&store, campus.residents[1], campus.room_b).unwrap();

    let free: Vec<i64> = occupancy::free_rooms(&store)
        .unwrap()
        .iter()
        .map(|occ| occ.room.id)
        .collect();
    assert_eq!(free, vec![campus.room_a]);

    occupancy::evict(&store, campus.residents[0]).unwrap();
    let free = occupancy::free_rooms(&store).unwrap();
    assert_eq!(free.len(), 2);
    let room_b = free.iter().find(|occ| occ.room.id == campus.room_b).unwrap();
    assert_eq!(room_b.occupied, 1);
}

#[test]
fn building_roster_follows_assignments() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let admin = directory::add_administrator(&store, "Samuel", "Reyes", "south-key").unwrap();
    let north = occupancy::add_building(&store, 1, 1, admin).unwrap();
    let south = occupancy::add_building(&store, 2, 1, admin).unwrap();
    let north_room = occupancy::add_room(&store, 101, 2, north).unwrap();
    let south_room = occupancy::add_room(&store, 201, 2, south).unwrap();

    let alice = directory::add_resident(&store, "Alice", "Ward", 1, "pw").unwrap();
    let ben = directory::add_resident(&store, "Ben", "Carver", 2, "pw").unwrap();
    occupancy::settle(&store, alice, north_room).unwrap();
    occupancy::settle(&store, ben, south_room).unwrap();

    let roster: Vec<i64> = occupancy::building_roster(&store, north)
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(roster, vec![alice]);

    // Unknown building: empty, not an error.
    assert!(occupancy::building_roster(&store, 9999).unwrap().is_empty());
}

#[test]
fn scoped_evict_checks_building_ownership() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let margaret = directory::add_administrator(&store, "Margaret", "Holt", "north-key").unwrap();
    let samuel = directory::add_administrator(&store, "Samuel", "Reyes", "south-key").unwrap();
    let north = occupancy::add_building(&store, 1, 1, margaret).unwrap();
    let _south = occupancy::add_building(&store, 2, 1, samuel).unwrap();
    let north_room = occupancy::add_room(&store, 101, 2, north).unwrap();

    let alice = directory::add_resident(&store, "Alice", "Ward", 1, "pw").unwrap();
    occupancy::settle(&store, alice, north_room).unwrap();

    let margarets = occupancy::building_of_admin(&store, margaret).unwrap().unwrap();
    assert_eq!(margarets.id, north);
    assert!(occupancy::building_of_admin(&store, 9999).unwrap().is_none());

    // Samuel does not run the building Alice lives in.
    let err = occupancy::evict_from_building(&store, samuel, alice).unwrap_err();
    assert!(matches!(err, DomusError::NotFound(_)));
    assert!(occupancy::resident_room(&store, alice).unwrap().is_some());

    occupancy::evict_from_building(&store, margaret, alice).unwrap();
    assert!(occupancy::resident_room(&store, alice).unwrap().is_none());
}
