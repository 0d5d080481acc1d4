//! Headless model of the combined add/edit form.
//!
//! # Design
//! The mode is a `FormMode` taken from the route, never a flag next to an
//! optional id. The form never talks to the network: it hands out at most one
//! fetch per edited id through `take_fetch`, turns a submit into a
//! `Submission`, and folds the outcome back in with `finish_submit`.

use std::fmt;

use crate::error::{ApiError, FieldErrors};
use crate::route::{FormMode, Route};
use crate::types::{Gender, NewStudent, Student, StudentId};

/// Editable fields, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Gender,
    Country,
    Avatar,
    BtcAddress,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Email,
        Field::Gender,
        Field::Country,
        Field::FirstName,
        Field::LastName,
        Field::Avatar,
        Field::BtcAddress,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Email => "email",
            Field::Gender => "gender",
            Field::Country => "country",
            Field::Avatar => "avatar",
            Field::BtcAddress => "btc_address",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::Email => "Email address",
            Field::Gender => "Gender",
            Field::Country => "Country",
            Field::Avatar => "Avatar Base64",
            Field::BtcAddress => "BTC Address",
        }
    }

    pub fn parse(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("unknown gender {0:?}, expected male, female or other")]
    InvalidGender(String),
}

/// What a submit asks the host to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(NewStudent),
    Update { id: StudentId, student: Student },
}

/// Result of the most recent submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded { message: String },
    Failed(ApiError),
}

#[derive(Debug, Clone)]
pub struct StudentForm {
    mode: FormMode,
    draft: NewStudent,
    field_errors: Option<FieldErrors>,
    outcome: Option<SubmitOutcome>,
    fetched: Option<StudentId>,
}

impl StudentForm {
    pub fn new(mode: FormMode) -> Self {
        Self {
            mode,
            draft: NewStudent::default(),
            field_errors: None,
            outcome: None,
            fetched: None,
        }
    }

    /// `None` when the route is not a form route.
    pub fn for_route(route: &Route) -> Option<Self> {
        route.form_mode().map(Self::new)
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &NewStudent {
        &self.draft
    }

    pub fn title(&self) -> &'static str {
        if self.mode.is_add() {
            "Add Student"
        } else {
            "Edit Student"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.mode.is_add() {
            "Add"
        } else {
            "Update"
        }
    }

    /// Follow a route change. Returns `false` for non-form routes, leaving
    /// the form untouched. Entering add mode starts from empty values; the
    /// last submit's feedback belongs to the old mode and is dropped. Any
    /// mode change re-arms the edit fetch.
    pub fn navigate(&mut self, route: &Route) -> bool {
        let Some(mode) = route.form_mode() else {
            return false;
        };
        if mode == self.mode {
            return true;
        }
        if mode.is_add() {
            self.draft = NewStudent::default();
        }
        self.mode = mode;
        self.fetched = None;
        self.field_errors = None;
        self.outcome = None;
        true
    }

    /// The record to fetch for edit mode, handed out once per id.
    pub fn take_fetch(&mut self) -> Option<StudentId> {
        let id = self.mode.edit_id()?;
        if self.fetched.as_ref() == Some(id) {
            return None;
        }
        self.fetched = Some(id.clone());
        Some(id.clone())
    }

    /// Hand the current edit id out again after its fetch failed.
    pub fn retry_fetch(&mut self) {
        self.fetched = None;
    }

    /// Replace local state with a fetched record. Ignored unless the form is
    /// editing that record.
    pub fn load(&mut self, student: Student) -> bool {
        if self.mode.edit_id() != Some(&student.id) {
            return false;
        }
        self.draft = student.fields;
        true
    }

    /// Shallow-merge one field. In add mode this also clears the last
    /// create's feedback.
    pub fn set_field(&mut self, field: Field, value: &str) -> Result<(), FormError> {
        let target = match field {
            Field::Gender => {
                self.draft.gender =
                    Gender::parse(value).ok_or_else(|| FormError::InvalidGender(value.to_string()))?;
                None
            }
            Field::FirstName => Some(&mut self.draft.first_name),
            Field::LastName => Some(&mut self.draft.last_name),
            Field::Email => Some(&mut self.draft.email),
            Field::Country => Some(&mut self.draft.country),
            Field::Avatar => Some(&mut self.draft.avatar),
            Field::BtcAddress => Some(&mut self.draft.btc_address),
        };
        if let Some(slot) = target {
            *slot = value.to_string();
        }
        if self.mode.is_add() && self.outcome.is_some() {
            self.outcome = None;
            self.field_errors = None;
        }
        Ok(())
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.draft.first_name,
            Field::LastName => &self.draft.last_name,
            Field::Email => &self.draft.email,
            Field::Gender => self.draft.gender.as_str(),
            Field::Country => &self.draft.country,
            Field::Avatar => &self.draft.avatar,
            Field::BtcAddress => &self.draft.btc_address,
        }
    }

    pub fn submit(&self) -> Submission {
        match &self.mode {
            FormMode::Add => Submission::Create(self.draft.clone()),
            FormMode::Edit(id) => Submission::Update {
                id: id.clone(),
                student: self.draft.clone().with_id(id.clone()),
            },
        }
    }

    /// Fold a create/update result back into the form. Only a 422 with an
    /// error map produces inline field errors.
    pub fn finish_submit(&mut self, result: Result<Student, ApiError>) -> &SubmitOutcome {
        let outcome = match result {
            Ok(student) => {
                self.field_errors = None;
                let message = match &self.mode {
                    FormMode::Add => {
                        self.draft = NewStudent::default();
                        format!("Created student {}", student.id)
                    }
                    FormMode::Edit(_) => format!("Updated student {}", student.id),
                };
                SubmitOutcome::Succeeded { message }
            }
            Err(err) => {
                self.field_errors = err.field_errors();
                SubmitOutcome::Failed(err)
            }
        };
        self.outcome.insert(outcome)
    }

    pub fn outcome(&self) -> Option<&SubmitOutcome> {
        self.outcome.as_ref()
    }

    /// The whole error map of the last 422, keys exactly as received.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.field_errors.as_ref()
    }

    pub fn field_error(&self, field: Field) -> Option<&str> {
        self.field_errors
            .as_ref()
            .and_then(|errors| errors.get(field.name()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(body: &str) -> ApiError {
        ApiError::HttpError {
            status: 422,
            body: body.to_string(),
        }
    }

    fn stored(id: &str) -> Student {
        NewStudent {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            gender: Gender::Female,
            country: "US".to_string(),
            avatar: "data:image/png;base64,AAAA".to_string(),
            btc_address: "bc1qexample".to_string(),
        }
        .with_id(StudentId::from(id))
    }

    #[test]
    fn add_route_starts_empty_with_other_gender() {
        let form = StudentForm::for_route(&Route::AddStudent).unwrap();
        assert_eq!(form.mode(), &FormMode::Add);
        assert_eq!(form.draft(), &NewStudent::default());
        assert_eq!(form.value(Field::Gender), "other");
        assert_eq!(form.title(), "Add Student");
        assert_eq!(form.submit_label(), "Add");
        assert!(StudentForm::for_route(&Route::Students { page: 1 }).is_none());
    }

    #[test]
    fn add_mode_never_fetches() {
        let mut form = StudentForm::new(FormMode::Add);
        assert_eq!(form.take_fetch(), None);
    }

    #[test]
    fn switching_to_edit_fetches_exactly_once() {
        let mut form = StudentForm::new(FormMode::Add);
        assert!(form.navigate(&Route::parse("/students/3").unwrap()));
        assert_eq!(form.mode(), &FormMode::Edit(StudentId::from("3")));
        assert_eq!(form.take_fetch(), Some(StudentId::from("3")));
        assert_eq!(form.take_fetch(), None);

        assert!(form.navigate(&Route::parse("/students/3").unwrap()));
        assert_eq!(form.take_fetch(), None);

        form.navigate(&Route::parse("/students/4").unwrap());
        assert_eq!(form.take_fetch(), Some(StudentId::from("4")));
    }

    #[test]
    fn returning_to_edit_after_add_fetches_again() {
        let mut form = StudentForm::new(FormMode::Add);
        form.navigate(&Route::parse("/students/3").unwrap());
        assert_eq!(form.take_fetch(), Some(StudentId::from("3")));
        assert!(form.load(stored("3")));

        form.navigate(&Route::AddStudent);
        assert_eq!(form.value(Field::Email), "");
        form.navigate(&Route::parse("/students/3").unwrap());
        assert_eq!(form.take_fetch(), Some(StudentId::from("3")));
        assert!(form.load(stored("3")));
        assert_eq!(form.value(Field::Email), "grace@example.com");
    }

    #[test]
    fn failed_fetch_can_be_retried() {
        let mut form = StudentForm::new(FormMode::Edit(StudentId::from("9")));
        assert_eq!(form.take_fetch(), Some(StudentId::from("9")));
        assert_eq!(form.take_fetch(), None);
        form.retry_fetch();
        assert_eq!(form.take_fetch(), Some(StudentId::from("9")));
    }

    #[test]
    fn fetched_record_replaces_draft() {
        let mut form = StudentForm::new(FormMode::Edit(StudentId::from("7")));
        form.set_field(Field::Email, "typed@example.com").unwrap();
        assert!(form.load(stored("7")));
        assert_eq!(form.value(Field::Email), "grace@example.com");
        assert_eq!(form.title(), "Edit Student");
        assert!(!form.load(stored("8")));
    }

    #[test]
    fn set_field_merges_one_field() {
        let mut form = StudentForm::new(FormMode::Edit(StudentId::from("7")));
        form.load(stored("7"));
        form.set_field(Field::Country, "JP").unwrap();
        form.set_field(Field::Gender, "Male").unwrap();
        assert_eq!(form.value(Field::Country), "JP");
        assert_eq!(form.draft().gender, Gender::Male);
        assert_eq!(form.value(Field::LastName), "Hopper");

        let err = form.set_field(Field::Gender, "robot").unwrap_err();
        assert_eq!(err, FormError::InvalidGender("robot".to_string()));
        assert_eq!(form.draft().gender, Gender::Male);
    }

    #[test]
    fn submit_dispatches_by_mode() {
        let mut add = StudentForm::new(FormMode::Add);
        add.set_field(Field::Email, "new@example.com").unwrap();
        match add.submit() {
            Submission::Create(input) => assert_eq!(input.email, "new@example.com"),
            other => panic!("expected create, got {other:?}"),
        }

        let mut edit = StudentForm::new(FormMode::Edit(StudentId::from("7")));
        edit.load(stored("7"));
        match edit.submit() {
            Submission::Update { id, student } => {
                assert_eq!(id, StudentId::from("7"));
                assert_eq!(student.id, id);
                assert_eq!(student.fields.last_name, "Hopper");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn create_success_resets_every_field() {
        let mut form = StudentForm::new(FormMode::Add);
        form.set_field(Field::Avatar, "data:image/png;base64,AAAA").unwrap();
        form.set_field(Field::BtcAddress, "bc1q").unwrap();
        let outcome = form.finish_submit(Ok(stored("31"))).clone();
        assert_eq!(
            outcome,
            SubmitOutcome::Succeeded {
                message: "Created student 31".to_string()
            }
        );
        assert_eq!(form.draft(), &NewStudent::default());
    }

    #[test]
    fn update_success_keeps_draft() {
        let mut form = StudentForm::new(FormMode::Edit(StudentId::from("7")));
        form.load(stored("7"));
        form.finish_submit(Ok(stored("7")));
        assert_eq!(form.value(Field::FirstName), "Grace");
        assert!(matches!(form.outcome(), Some(SubmitOutcome::Succeeded { .. })));
    }

    #[test]
    fn create_422_maps_errors_by_exact_key() {
        let mut form = StudentForm::new(FormMode::Add);
        form.finish_submit(Err(validation(
            r#"{"error":{"email":"Email already exists","nickname":"unknown"}}"#,
        )));
        let errors = form.field_errors().unwrap();
        let keys: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["email", "nickname"]);
        assert_eq!(form.field_error(Field::Email), Some("Email already exists"));
        assert_eq!(form.field_error(Field::Country), None);
    }

    #[test]
    fn update_422_shows_message_and_no_success() {
        let mut form = StudentForm::new(FormMode::Edit(StudentId::from("7")));
        form.load(stored("7"));
        let outcome = form
            .finish_submit(Err(validation(r#"{"error":{"email":"is invalid"}}"#)))
            .clone();
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(form.field_error(Field::Email), Some("is invalid"));
    }

    #[test]
    fn other_failures_are_not_shown_inline() {
        let mut form = StudentForm::new(FormMode::Add);
        form.finish_submit(Err(ApiError::HttpError {
            status: 500,
            body: r#"{"error":{"email":"boom"}}"#.to_string(),
        }));
        assert!(form.field_errors().is_none());
        assert!(matches!(form.outcome(), Some(SubmitOutcome::Failed(_))));

        form.finish_submit(Err(ApiError::Timeout));
        assert!(form.field_errors().is_none());
    }

    #[test]
    fn editing_after_add_feedback_clears_it() {
        let mut form = StudentForm::new(FormMode::Add);
        form.finish_submit(Err(validation(r#"{"error":{"email":"is invalid"}}"#)));
        form.set_field(Field::Email, "fixed@example.com").unwrap();
        assert!(form.field_errors().is_none());
        assert!(form.outcome().is_none());
    }

    #[test]
    fn editing_keeps_update_feedback() {
        let mut form = StudentForm::new(FormMode::Edit(StudentId::from("7")));
        form.finish_submit(Err(validation(r#"{"error":{"email":"is invalid"}}"#)));
        form.set_field(Field::Email, "still@bad").unwrap();
        assert_eq!(form.field_error(Field::Email), Some("is invalid"));
    }

    #[test]
    fn leaving_edit_for_add_clears_state() {
        let mut form = StudentForm::new(FormMode::Edit(StudentId::from("7")));
        form.load(stored("7"));
        form.finish_submit(Err(validation(r#"{"error":{"email":"is invalid"}}"#)));
        assert!(form.navigate(&Route::AddStudent));
        assert_eq!(form.draft(), &NewStudent::default());
        assert!(form.field_errors().is_none());
        assert!(!form.navigate(&Route::Students { page: 1 }));
        assert!(form.mode().is_add());
    }

    #[test]
    fn field_names_parse_back() {
        for field in Field::ALL {
            assert_eq!(Field::parse(field.name()), Some(field));
        }
        assert_eq!(Field::parse("id"), None);
    }
}
