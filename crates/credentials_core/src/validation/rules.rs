//! Reusable field rules shared by the use-case request validators.

use super::{ValidationErrors, Violation};
use crate::model::credential::{Role, SortDirection, SortKey};
use once_cell::sync::Lazy;
use regex::Regex;

/// Textual length of a hyphenated UUID.
pub const ID_LENGTH: usize = 36;
pub const EMAIL_MAX_CHARS: usize = 256;
pub const TOKEN_ID_MAX_CHARS: usize = 128;
pub const BULK_IDS_MAX: usize = 128;
pub const SEARCH_FILTER_MAX: usize = 128;
pub const SEARCH_LIMIT_MAX: i64 = 128;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[\p{L}\p{N}.!#$%&'*+/=?^_`{|}~-]+@[\p{L}\p{N}](?:[\p{L}\p{N}-]*[\p{L}\p{N}])?(?:\.[\p{L}\p{N}](?:[\p{L}\p{N}-]*[\p{L}\p{N}])?)+$",
    )
    .expect("valid email regex")
});

/// Whether `value` is shaped like an email address. Letters and digits may be
/// non-ASCII in both the local part and the domain.
pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn require_email(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.is_empty() {
        errors.push(field, Violation::Required);
        return;
    }
    check_email(errors, field, value);
}

pub fn check_email(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.chars().count() > EMAIL_MAX_CHARS {
        errors.push(
            field,
            Violation::TooLong {
                max: EMAIL_MAX_CHARS,
            },
        );
    } else if !is_email(value) {
        errors.push(field, Violation::InvalidEmail);
    }
}

pub fn require_id(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.is_empty() {
        errors.push(field, Violation::Required);
        return;
    }
    check_id(errors, field, value);
}

pub fn check_id(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.chars().count() != ID_LENGTH {
        errors.push(
            field,
            Violation::WrongLength {
                expected: ID_LENGTH,
            },
        );
    }
}

/// Id and email act as substitutable selectors: at least one is required,
/// each is checked when present.
pub fn check_selector(errors: &mut ValidationErrors, id: &str, email: &str) {
    if id.is_empty() && email.is_empty() {
        errors.push("id", Violation::RequiredWithout("email"));
        errors.push("email", Violation::RequiredWithout("id"));
        return;
    }
    if !id.is_empty() {
        check_id(errors, "id", id);
    }
    if !email.is_empty() {
        check_email(errors, "email", email);
    }
}

pub fn check_token_id(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|text| !text.is_empty()) {
        if value.chars().count() > TOKEN_ID_MAX_CHARS {
            errors.push(
                field,
                Violation::TooLong {
                    max: TOKEN_ID_MAX_CHARS,
                },
            );
        }
    }
}

pub fn check_role(errors: &mut ValidationErrors, field: &str, value: &str) {
    if Role::parse(value).is_err() {
        errors.push(field, Violation::UnknownRole(value.to_string()));
    }
}

pub fn check_id_list(errors: &mut ValidationErrors, field: &str, ids: &[String]) {
    if ids.is_empty() {
        errors.push(field, Violation::TooFew { min: 1 });
        return;
    }
    if ids.len() > BULK_IDS_MAX {
        errors.push(field, Violation::TooMany { max: BULK_IDS_MAX });
        return;
    }
    for (index, id) in ids.iter().enumerate() {
        require_id(errors, &format!("{field}[{index}]"), id);
    }
}

pub fn check_limit(errors: &mut ValidationErrors, limit: i64) {
    if limit == 0 {
        errors.push("limit", Violation::Required);
    } else if !(1..=SEARCH_LIMIT_MAX).contains(&limit) {
        errors.push(
            "limit",
            Violation::OutOfRange {
                min: 1,
                max: Some(SEARCH_LIMIT_MAX),
            },
        );
    }
}

pub fn check_offset(errors: &mut ValidationErrors, offset: i64) {
    if offset < 0 {
        errors.push("offset", Violation::OutOfRange { min: 0, max: None });
    }
}

pub fn check_email_filter(errors: &mut ValidationErrors, field: &str, emails: &[String]) {
    if emails.len() > SEARCH_FILTER_MAX {
        errors.push(
            field,
            Violation::TooMany {
                max: SEARCH_FILTER_MAX,
            },
        );
        return;
    }
    for (index, email) in emails.iter().enumerate() {
        require_email(errors, &format!("{field}[{index}]"), email);
    }
}

pub fn check_role_filter(errors: &mut ValidationErrors, field: &str, roles: &[String]) {
    if roles.len() > SEARCH_FILTER_MAX {
        errors.push(
            field,
            Violation::TooMany {
                max: SEARCH_FILTER_MAX,
            },
        );
        return;
    }
    for (index, role) in roles.iter().enumerate() {
        check_role(errors, &format!("{field}[{index}]"), role);
    }
}

pub fn check_sort_key(errors: &mut ValidationErrors, value: &str) {
    if SortKey::parse(value).is_none() {
        errors.push("sort", Violation::UnknownSortKey(value.to_string()));
    }
}

pub fn check_sort_direction(errors: &mut ValidationErrors, value: &str) {
    if !value.is_empty() && SortDirection::parse(value).is_none() {
        errors.push(
            "sort_direction",
            Violation::UnknownSortDirection(value.to_string()),
        );
    }
}
