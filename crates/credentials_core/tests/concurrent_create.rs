use credentials_core::db::open_db;
use credentials_core::{
    CreateCredentials, CreateCredentialsRequest, ErrorKind, SqliteCredentialRepository, UseCase,
};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

fn create_in_thread(path: PathBuf, barrier: Arc<Barrier>) -> thread::JoinHandle<Option<ErrorKind>> {
    thread::spawn(move || {
        let conn = open_db(&path).unwrap();
        let repo = SqliteCredentialRepository::try_new(&conn).unwrap();
        let request = CreateCredentialsRequest {
            role: "core".to_string(),
            ..CreateCredentialsRequest::new("race@example.com")
        };
        barrier.wait();
        CreateCredentials::new(repo)
            .exec(&request)
            .err()
            .map(|err| err.kind())
    })
}

#[test]
fn racing_creates_for_one_email_yield_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.sqlite3");
    drop(open_db(&path).unwrap());

    let barrier = Arc::new(Barrier::new(2));
    let handles = [
        create_in_thread(path.clone(), Arc::clone(&barrier)),
        create_in_thread(path.clone(), Arc::clone(&barrier)),
    ];
    let mut outcomes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();
    outcomes.sort_by_key(Option::is_some);

    assert_eq!(outcomes, vec![None, Some(ErrorKind::AlreadyExists)]);

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM credentials WHERE email = ?1;",
            ["race@example.com"],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}
