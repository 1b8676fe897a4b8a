use chrono::NaiveDateTime;
use verifix::models::{Role, User, UserId, VerificationStatus};
use verifix::reconcile::{self, BootstrapOutcome, RunError, DEFAULT_FACULTY_EMAIL};
use verifix::store::{MemoryUserStore, StoreError};
use verifix::util::sensitive::Sensitive;

fn record(role: Role, email: &str, is_verified: Option<bool>, status: Option<&str>) -> User {
    User {
        id: UserId(0),
        created_at: NaiveDateTime::default(),
        updated_at: None,
        name: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
        password_hash: Sensitive::new("hash".into()),
        role,
        is_verified,
        verification_status: status.map(String::from),
        verified_by: None,
        verification_date: None,
        verification_notes: None,
    }
}

fn faculty_count(store: &MemoryUserStore) -> usize {
    store
        .users()
        .iter()
        .filter(|v| v.role == Role::Faculty)
        .count()
}

#[tokio::test]
async fn legacy_student_is_repaired_and_faculty_is_bootstrapped() {
    verifix::logging::init_for_tests();

    let mut store = MemoryUserStore::new();
    let id = store.seed(record(Role::Student, "a@x.com", None, None));

    let summary = reconcile::run(&mut store).await.unwrap();

    let student = store.get(id).unwrap();
    assert_eq!(student.is_verified, Some(false));
    assert_eq!(student.verification_status.as_deref(), Some("pending"));
    assert_eq!(
        summary.reconcile.updated[0].fields,
        vec!["is_verified", "verification_status"]
    );

    let BootstrapOutcome::Created(faculty) = &summary.bootstrap else {
        panic!("expected a faculty record to be created");
    };
    assert_eq!(faculty.email, DEFAULT_FACULTY_EMAIL);
    assert_eq!(faculty.is_verified, Some(true));
    assert_eq!(faculty.verification_status(), Some(VerificationStatus::Approved));
    assert_eq!(faculty_count(&store), 1);
    assert_eq!(summary.writes(), 2);
    assert_eq!(summary.snapshot.len(), 2);
}

#[tokio::test]
async fn compliant_store_is_left_alone() {
    let mut store = MemoryUserStore::new();
    store.seed(record(Role::Student, "a@x.com", Some(false), Some("pending")));
    store.seed(record(Role::Faculty, "f@x.com", Some(true), Some("approved")));

    let summary = reconcile::run(&mut store).await.unwrap();

    assert_eq!(summary.reconcile.scanned, 1);
    assert!(summary.reconcile.updated.is_empty());
    assert!(matches!(summary.bootstrap, BootstrapOutcome::Existing(..)));
    assert_eq!(summary.writes(), 0);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn only_the_missing_field_is_staged() {
    let mut store = MemoryUserStore::new();
    let id = store.seed(record(Role::Student, "a@x.com", None, Some("approved")));
    store.seed(record(Role::Faculty, "f@x.com", Some(true), Some("approved")));

    let summary = reconcile::run(&mut store).await.unwrap();

    assert_eq!(summary.reconcile.updated[0].fields, vec!["is_verified"]);
    let student = store.get(id).unwrap();
    assert_eq!(student.is_verified, Some(false));
    assert_eq!(student.verification_status.as_deref(), Some("approved"));
}

#[tokio::test]
async fn empty_status_is_repaired() {
    let mut store = MemoryUserStore::new();
    let id = store.seed(record(Role::Student, "a@x.com", Some(true), Some("")));

    let summary = reconcile::run(&mut store).await.unwrap();

    assert_eq!(summary.reconcile.updated[0].fields, vec!["verification_status"]);
    let student = store.get(id).unwrap();
    assert_eq!(student.is_verified, Some(true));
    assert_eq!(student.verification_status.as_deref(), Some("pending"));
}

#[tokio::test]
async fn unreachable_store_aborts_without_writes() {
    let mut store = MemoryUserStore::unreachable();

    let report = reconcile::run(&mut store).await.unwrap_err();

    assert!(report.contains::<RunError>());
    assert_eq!(
        report.downcast_ref::<StoreError>(),
        Some(&StoreError::Query)
    );
    assert_eq!(store.writes(), 0);
    assert!(store.users().is_empty());
}

#[tokio::test]
async fn second_run_writes_nothing() {
    let mut store = MemoryUserStore::new();
    store.seed(record(Role::Student, "a@x.com", None, None));
    store.seed(record(Role::Student, "b@x.com", Some(true), None));
    store.seed(record(Role::Student, "c@x.com", None, Some("")));

    let first = reconcile::run(&mut store).await.unwrap();
    assert_eq!(first.writes(), 4);

    let second = reconcile::run(&mut store).await.unwrap();
    assert!(second.reconcile.updated.is_empty());
    assert!(!second.bootstrap.is_created());
    assert_eq!(second.writes(), 0);
    assert_eq!(store.writes(), 4);
}

#[tokio::test]
async fn verified_records_are_not_clobbered() {
    let mut store = MemoryUserStore::new();
    let mut approved = record(Role::Student, "a@x.com", Some(true), Some("approved"));
    approved.verified_by = Some(UserId(7));
    approved.verification_notes = Some("checked enrolment letter".into());
    let id = store.seed(approved);
    let before = store.get(id).unwrap().clone();

    reconcile::run(&mut store).await.unwrap();

    let after = store.get(id).unwrap();
    assert_eq!(after, &before);
    assert_eq!(after.updated_at, None);
}

#[tokio::test]
async fn other_roles_are_not_reconciled() {
    let mut store = MemoryUserStore::new();
    let company = store.seed(record(Role::Company, "co@x.com", None, None));
    let admin = store.seed(record(Role::Admin, "root@x.com", None, None));

    let summary = reconcile::run(&mut store).await.unwrap();

    assert_eq!(summary.reconcile.scanned, 0);
    assert_eq!(store.get(company).unwrap().is_verified, None);
    assert_eq!(store.get(admin).unwrap().verification_status, None);
}

#[tokio::test]
async fn existing_faculty_is_never_duplicated() {
    let mut store = MemoryUserStore::new();
    // even an unverified faculty satisfies the existence check
    let existing = store.seed(record(Role::Faculty, "f@x.com", None, None));
    store.seed(record(Role::Faculty, "g@x.com", Some(true), Some("approved")));

    let summary = reconcile::run(&mut store).await.unwrap();

    assert_eq!(summary.bootstrap.user().id, existing);
    assert_eq!(faculty_count(&store), 2);
    assert_eq!(store.get(existing).unwrap().is_verified, None);
}

#[tokio::test]
async fn rerun_after_partial_failure_finishes_the_job() {
    let mut store = MemoryUserStore::new();
    let a = store.seed(record(Role::Student, "a@x.com", None, None));
    let b = store.seed(record(Role::Student, "b@x.com", None, None));
    let c = store.seed(record(Role::Student, "c@x.com", None, None));
    store.fail_update_for(b);

    let report = reconcile::run(&mut store).await.unwrap_err();
    assert_eq!(
        report.downcast_ref::<StoreError>(),
        Some(&StoreError::Persist)
    );
    // no rollback, nothing after the failing record
    assert_eq!(store.get(a).unwrap().is_verified, Some(false));
    assert_eq!(store.get(b).unwrap().is_verified, None);
    assert_eq!(store.get(c).unwrap().is_verified, None);
    assert_eq!(faculty_count(&store), 0);

    store.clear_failures();
    let summary = reconcile::run(&mut store).await.unwrap();

    let ids = summary
        .reconcile
        .updated
        .iter()
        .map(|v| v.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![b, c]);
    assert_eq!(faculty_count(&store), 1);
}

#[tokio::test]
async fn bootstrap_failure_is_fatal() {
    let mut store = MemoryUserStore::new();
    store.seed(record(Role::Student, "a@x.com", None, None));
    store.fail_creates();

    let report = reconcile::run(&mut store).await.unwrap_err();

    assert!(report.contains::<reconcile::BootstrapError>());
    assert_eq!(faculty_count(&store), 0);
}
