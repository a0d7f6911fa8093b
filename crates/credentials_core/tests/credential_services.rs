use credentials_core::db::open_db_in_memory;
use credentials_core::{
    CreateCredentials, CreateCredentialsRequest, Credential, CredentialFields, CredentialId,
    CredentialRepository, CredentialSearchQuery, CredentialSelector, DbError, ErrorKind,
    ExistsCredentials, ExistsCredentialsRequest, GetCredentials, GetCredentialsRequest,
    InvalidRequest, ListCredentials, ListCredentialsRequest, Operation, RepoError, RepoResult,
    Role, SearchCredentials, SearchCredentialsRequest, ServiceError, SortDirection, SortKey,
    SqliteCredentialRepository, UpdateCredentials, UpdateCredentialsRequest, UseCase,
};
use std::cell::RefCell;
use std::error::Error;
use uuid::Uuid;

const FIXED_NOW: i64 = 1_700_000_000_000;
const LATER: i64 = 1_700_000_060_000;
const KNOWN_ID: &str = "11111111-1111-4111-8111-111111111111";

fn fixed_clock() -> i64 {
    FIXED_NOW
}

fn later_clock() -> i64 {
    LATER
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create {
        id: CredentialId,
        now: i64,
        fields: CredentialFields,
    },
    Get(CredentialSelector),
    Exists(CredentialSelector),
    List(Vec<CredentialId>),
    Search(CredentialSearchQuery),
    Update {
        id: CredentialId,
        now: i64,
        fields: CredentialFields,
    },
}

/// Records every call and answers with canned data or an injected failure.
#[derive(Default)]
struct RecordingRepo {
    calls: RefCell<Vec<Call>>,
    failure: Option<fn() -> RepoError>,
}

impl RecordingRepo {
    fn failing(failure: fn() -> RepoError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) -> RepoResult<()> {
        self.calls.borrow_mut().push(call);
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

fn credential_from(id: CredentialId, created_at: i64, fields: &CredentialFields) -> Credential {
    Credential {
        id,
        email: fields.email.clone(),
        role: fields.role,
        email_validation_token_id: fields.email_validation_token_id.clone(),
        pending_email_validation_token_id: fields.pending_email_validation_token_id.clone(),
        password_token_id: fields.password_token_id.clone(),
        reset_password_token_id: fields.reset_password_token_id.clone(),
        created_at,
        updated_at: None,
    }
}

impl CredentialRepository for RecordingRepo {
    fn create_credential(
        &self,
        id: CredentialId,
        now: i64,
        fields: &CredentialFields,
    ) -> RepoResult<Credential> {
        self.record(Call::Create {
            id,
            now,
            fields: fields.clone(),
        })?;
        Ok(credential_from(id, now, fields))
    }

    fn get_credential(&self, selector: &CredentialSelector) -> RepoResult<Credential> {
        self.record(Call::Get(selector.clone()))?;
        Ok(credential_from(
            selector.id.unwrap_or_else(Uuid::new_v4),
            FIXED_NOW,
            &CredentialFields::new(selector.email.clone().unwrap_or_default()),
        ))
    }

    fn credential_exists(&self, selector: &CredentialSelector) -> RepoResult<bool> {
        self.record(Call::Exists(selector.clone()))?;
        Ok(true)
    }

    fn list_credentials(&self, ids: &[CredentialId]) -> RepoResult<Vec<Credential>> {
        self.record(Call::List(ids.to_vec()))?;
        Ok(Vec::new())
    }

    fn search_credentials(&self, query: &CredentialSearchQuery) -> RepoResult<Vec<CredentialId>> {
        self.record(Call::Search(query.clone()))?;
        Ok(Vec::new())
    }

    fn update_credential(
        &self,
        id: CredentialId,
        now: i64,
        fields: &CredentialFields,
    ) -> RepoResult<Credential> {
        self.record(Call::Update {
            id,
            now,
            fields: fields.clone(),
        })?;
        let mut credential = credential_from(id, FIXED_NOW, fields);
        credential.updated_at = Some(now);
        Ok(credential)
    }
}

fn store_failure() -> RepoError {
    RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery))
}

#[test]
fn create_generates_id_and_timestamp() {
    let repo = RecordingRepo::default();
    let request = CreateCredentialsRequest {
        role: "core".to_string(),
        email_validation_token_id: Some("ev-token".to_string()),
        password_token_id: Some(String::new()),
        ..CreateCredentialsRequest::new("a@x.com")
    };

    let created = CreateCredentials::with_clock(&repo, fixed_clock)
        .exec(&request)
        .unwrap();

    assert_eq!(created.id.get_version_num(), 4);
    assert_eq!(created.created_at, FIXED_NOW);
    assert_eq!(created.updated_at, None);
    assert_eq!(
        repo.calls(),
        vec![Call::Create {
            id: created.id,
            now: FIXED_NOW,
            fields: CredentialFields {
                role: Role::Core,
                email_validation_token_id: Some("ev-token".to_string()),
                ..CredentialFields::new("a@x.com")
            },
        }]
    );
}

#[test]
fn invalid_create_never_reaches_repository() {
    let repo = RecordingRepo::default();
    let request = CreateCredentialsRequest {
        role: "owner".to_string(),
        reset_password_token_id: Some("t".repeat(129)),
        ..CreateCredentialsRequest::new("not-an-email")
    };

    let err = CreateCredentials::new(&repo).exec(&request).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.operation(), Operation::Create);
    let violations = err.validation_errors().unwrap();
    assert!(violations.has_field("email"));
    assert!(violations.has_field("role"));
    assert!(violations.has_field("reset_password_token_id"));
    assert!(repo.calls().is_empty());
}

#[test]
fn get_without_selector_is_invalid_request() {
    let repo = RecordingRepo::default();

    let err = GetCredentials::new(&repo)
        .exec(&GetCredentialsRequest::default())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    let violations = err.validation_errors().unwrap();
    assert!(violations.has_field("id"));
    assert!(violations.has_field("email"));
    assert!(repo.calls().is_empty());
}

#[test]
fn malformed_id_of_right_length_is_invalid_request() {
    let repo = RecordingRepo::default();
    let request = GetCredentialsRequest::by_id("zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz");

    let err = GetCredentials::new(&repo).exec(&request).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(err.validation_errors().is_none());
    let source = err
        .source()
        .and_then(|source| source.downcast_ref::<InvalidRequest>())
        .unwrap();
    assert!(matches!(source, InvalidRequest::MalformedId { field, .. } if field == "id"));
    assert!(repo.calls().is_empty());
}

#[test]
fn get_passes_both_selectors_through() {
    let repo = RecordingRepo::default();
    let request = GetCredentialsRequest {
        id: KNOWN_ID.to_string(),
        email: "a@x.com".to_string(),
    };

    GetCredentials::new(&repo).exec(&request).unwrap();

    assert_eq!(
        repo.calls(),
        vec![Call::Get(CredentialSelector {
            id: Some(Uuid::parse_str(KNOWN_ID).unwrap()),
            email: Some("a@x.com".to_string()),
        })]
    );
}

#[test]
fn repository_errors_are_wrapped_with_operation() {
    let repo = RecordingRepo::failing(|| RepoError::NotFound);

    let err = GetCredentials::new(&repo)
        .exec(&GetCredentialsRequest::by_email("a@x.com"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.operation(), Operation::Get);
    assert!(matches!(
        &err,
        ServiceError::Repo {
            source: RepoError::NotFound,
            ..
        }
    ));
    let source = err
        .source()
        .and_then(|source| source.downcast_ref::<RepoError>())
        .unwrap();
    assert!(matches!(source, RepoError::NotFound));
}

#[test]
fn store_failures_are_internal() {
    let repo = RecordingRepo::failing(store_failure);

    let err = SearchCredentials::new(&repo)
        .exec(&SearchCredentialsRequest::new(10))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.operation(), Operation::Search);
    assert_eq!(repo.calls().len(), 1);
}

#[test]
fn exists_wraps_boolean() {
    let repo = RecordingRepo::default();

    let response = ExistsCredentials::new(&repo)
        .exec(&ExistsCredentialsRequest::by_email("a@x.com"))
        .unwrap();

    assert!(response.exists);
    assert_eq!(
        repo.calls(),
        vec![Call::Exists(CredentialSelector::by_email("a@x.com"))]
    );
}

#[test]
fn list_validates_each_id() {
    let repo = RecordingRepo::default();
    let list = ListCredentials::new(&repo);

    let empty = list.exec(&ListCredentialsRequest::default()).unwrap_err();
    assert!(empty.validation_errors().unwrap().has_field("ids"));

    let too_many = ListCredentialsRequest::new(vec![KNOWN_ID; 129]);
    assert_eq!(
        list.exec(&too_many).unwrap_err().kind(),
        ErrorKind::InvalidRequest
    );

    let short = ListCredentialsRequest::new([KNOWN_ID, "abc"]);
    let err = list.exec(&short).unwrap_err();
    assert!(err.validation_errors().unwrap().has_field("ids[1]"));

    assert!(repo.calls().is_empty());

    list.exec(&ListCredentialsRequest::new([KNOWN_ID])).unwrap();
    assert_eq!(
        repo.calls(),
        vec![Call::List(vec![Uuid::parse_str(KNOWN_ID).unwrap()])]
    );
}

#[test]
fn search_validation_reports_every_field() {
    let repo = RecordingRepo::default();
    let request = SearchCredentialsRequest {
        limit: 0,
        offset: -1,
        sort: "name".to_string(),
        sort_direction: "up".to_string(),
        emails: vec!["a@x.com".to_string(), "bad".to_string()],
        roles: vec!["owner".to_string()],
    };

    let err = SearchCredentials::new(&repo).exec(&request).unwrap_err();

    let violations = err.validation_errors().unwrap();
    for field in ["limit", "offset", "sort", "sort_direction", "emails[1]", "roles[0]"] {
        assert!(violations.has_field(field), "missing violation for {field}");
    }
    assert!(!violations.has_field("emails[0]"));
    assert!(repo.calls().is_empty());

    let over_limit = SearchCredentials::new(&repo)
        .exec(&SearchCredentialsRequest::new(129))
        .unwrap_err();
    assert!(over_limit.validation_errors().unwrap().has_field("limit"));
}

#[test]
fn search_translates_request_into_query() {
    let repo = RecordingRepo::default();
    let request = SearchCredentialsRequest {
        limit: 25,
        offset: 50,
        sort: "role".to_string(),
        sort_direction: "DESC".to_string(),
        emails: vec!["a@x.com".to_string()],
        roles: vec!["admin".to_string(), String::new()],
    };

    SearchCredentials::new(&repo).exec(&request).unwrap();

    assert_eq!(
        repo.calls(),
        vec![Call::Search(CredentialSearchQuery {
            limit: 25,
            offset: 50,
            sort: SortKey::Role,
            direction: Some(SortDirection::Desc),
            emails: vec!["a@x.com".to_string()],
            roles: vec![Role::Admin, Role::None],
        })]
    );
}

#[test]
fn update_requires_id_and_email() {
    let repo = RecordingRepo::default();

    let err = UpdateCredentials::new(&repo)
        .exec(&UpdateCredentialsRequest::default())
        .unwrap_err();

    let violations = err.validation_errors().unwrap();
    assert!(violations.has_field("id"));
    assert!(violations.has_field("email"));
    assert!(repo.calls().is_empty());
}

#[test]
fn update_sends_full_field_set_with_clock_time() {
    let repo = RecordingRepo::default();
    let request = UpdateCredentialsRequest {
        role: "early-access-program".to_string(),
        pending_email_validation_token_id: Some("pending".to_string()),
        password_token_id: Some(String::new()),
        ..UpdateCredentialsRequest::new(KNOWN_ID, "b@x.com")
    };

    let updated = UpdateCredentials::with_clock(&repo, later_clock)
        .exec(&request)
        .unwrap();

    assert_eq!(updated.updated_at, Some(LATER));
    assert_eq!(
        repo.calls(),
        vec![Call::Update {
            id: Uuid::parse_str(KNOWN_ID).unwrap(),
            now: LATER,
            fields: CredentialFields {
                role: Role::EarlyAccessProgram,
                pending_email_validation_token_id: Some("pending".to_string()),
                ..CredentialFields::new("b@x.com")
            },
        }]
    );
}

#[test]
fn create_update_get_against_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCredentialRepository::try_new(&conn).unwrap();

    let created = CreateCredentials::with_clock(repo, fixed_clock)
        .exec(&CreateCredentialsRequest {
            role: "core".to_string(),
            password_token_id: Some("pw-token".to_string()),
            ..CreateCredentialsRequest::new("a@x.com")
        })
        .unwrap();
    assert_eq!(created.role, Role::Core);
    assert_eq!(created.created_at, FIXED_NOW);
    assert_eq!(created.updated_at, None);

    let fetched = GetCredentials::new(repo)
        .exec(&GetCredentialsRequest::by_id(created.id.to_string()))
        .unwrap();
    assert_eq!(fetched, created);

    UpdateCredentials::with_clock(repo, later_clock)
        .exec(&UpdateCredentialsRequest {
            role: "admin".to_string(),
            ..UpdateCredentialsRequest::new(created.id.to_string(), "b@x.com")
        })
        .unwrap();

    let after = GetCredentials::new(repo)
        .exec(&GetCredentialsRequest::by_id(created.id.to_string()))
        .unwrap();
    assert_eq!(after.email, "b@x.com");
    assert_eq!(after.role, Role::Admin);
    assert_eq!(after.email_validation_token_id, None);
    assert_eq!(after.pending_email_validation_token_id, None);
    assert_eq!(after.password_token_id, None);
    assert_eq!(after.reset_password_token_id, None);
    assert_eq!(after.created_at, FIXED_NOW);
    assert_eq!(after.updated_at, Some(LATER));

    let exists_old = ExistsCredentials::new(repo)
        .exec(&ExistsCredentialsRequest::by_email("a@x.com"))
        .unwrap();
    assert!(!exists_old.exists);
}

#[test]
fn sequential_duplicate_create_is_already_exists() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCredentialRepository::try_new(&conn).unwrap();
    let create = CreateCredentials::new(repo);

    create.exec(&CreateCredentialsRequest::new("a@x.com")).unwrap();
    let err = create
        .exec(&CreateCredentialsRequest::new("a@x.com"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(err.operation(), Operation::Create);
}

#[test]
fn update_of_missing_record_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCredentialRepository::try_new(&conn).unwrap();

    let err = UpdateCredentials::new(repo)
        .exec(&UpdateCredentialsRequest::new(KNOWN_ID, "a@x.com"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn list_and_search_page_through_records() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCredentialRepository::try_new(&conn).unwrap();
    let create = CreateCredentials::new(repo);
    for email in ["c@x.com", "a@x.com", "b@x.com"] {
        create.exec(&CreateCredentialsRequest::new(email)).unwrap();
    }

    let page = SearchCredentials::new(repo)
        .exec(&SearchCredentialsRequest::new(2))
        .unwrap();
    assert_eq!(page.ids.len(), 2);

    let mut ids = page
        .ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    ids.push(Uuid::new_v4().to_string());
    let listed = ListCredentials::new(repo)
        .exec(&ListCredentialsRequest::new(ids))
        .unwrap();
    let mut emails = listed
        .credentials
        .into_iter()
        .map(|credential| credential.email)
        .collect::<Vec<_>>();
    emails.sort();
    assert_eq!(emails, vec!["a@x.com", "b@x.com"]);

    let beyond = SearchCredentials::new(repo)
        .exec(&SearchCredentialsRequest {
            offset: 10,
            ..SearchCredentialsRequest::new(3)
        })
        .unwrap();
    assert!(beyond.ids.is_empty());
}
