use domus::core::error::DomusError;
use domus::core::store::Store;
use domus::plugins::directory;
use tempfile::tempdir;

#[test]
fn residents_round_trip() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());

    assert!(directory::list_residents(&store).unwrap().is_empty());

    let alice = directory::add_resident(&store, "Alice", "Ward", 123456, "pw-a").unwrap();
    let ben = directory::add_resident(&store, "Ben", "Carver", 222333, "pw-b").unwrap();

    let listed = directory::list_residents(&store).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, alice);
    assert_eq!(listed[0].full_name(), "Alice Ward");
    assert_eq!(listed[1].ticket, 222333);

    let fetched = directory::get_resident(&store, ben).unwrap();
    assert_eq!(fetched.given_name, "Ben");

    let err = directory::get_resident(&store, 9999).unwrap_err();
    assert!(matches!(err, DomusError::NotFound(_)));
}

#[test]
fn duplicate_ticket_is_rejected() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());

    directory::add_resident(&store, "Alice", "Ward", 123456, "pw").unwrap();
    let err = directory::add_resident(&store, "Ben", "Carver", 123456, "pw").unwrap_err();
    assert!(matches!(err, DomusError::RusqliteError(_)));
    assert_eq!(directory::list_residents(&store).unwrap().len(), 1);
}

#[test]
fn resident_authentication_is_exact_match() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let alice = directory::add_resident(&store, "Alice", "Ward", 123456, "secret").unwrap();

    let authed = directory::authenticate_resident(&store, "Ward", "secret")
        .unwrap()
        .unwrap();
    assert_eq!(authed.id, alice);

    assert!(directory::authenticate_resident(&store, "Ward", "wrong")
        .unwrap()
        .is_none());
    // Case-sensitive on both fields.
    assert!(directory::authenticate_resident(&store, "ward", "secret")
        .unwrap()
        .is_none());
    assert!(directory::authenticate_resident(&store, "Ward", "Secret")
        .unwrap()
        .is_none());
}

#[test]
fn administrator_authentication() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().to_path_buf());
    let margaret = directory::add_administrator(&store, "Margaret", "Holt", "north-key").unwrap();

    let listed = directory::list_administrators(&store).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].family_name, "Holt");

    let authed = directory::authenticate_administrator(&store, "Holt", "north-key")
        .unwrap()
        .unwrap();
    assert_eq!(authed.id, margaret);

    assert!(
        directory::authenticate_administrator(&store, "Holt", "south-key")
            .unwrap()
            .is_none()
    );
}
