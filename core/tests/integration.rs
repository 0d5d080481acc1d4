//! Full CRUD lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP using ureq, feeding results through the query
//! cache, the list view and the form exactly as a host would.

use std::time::Instant;

use student_core::{
    ApiError, Field, FormMode, HttpMethod, HttpRequest, HttpResponse, ListPhase, ListView,
    NewStudent, QueryCache, Route, StudentClient, StudentForm, StudentId, Submission,
    SubmitOutcome,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// ureq's status-as-error behavior is disabled so 4xx/5xx responses come
/// back as data and the core interprets them.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let url = req.url();
    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&url).call(),
        (HttpMethod::Delete, _) => agent.delete(&url).call(),
        (HttpMethod::Post, Some(body)) => agent.post(&url).content_type("application/json").send(body.as_bytes()),
        (HttpMethod::Post, None) => agent.post(&url).send_empty(),
        (HttpMethod::Put, Some(body)) => agent.put(&url).content_type("application/json").send(body.as_bytes()),
        (HttpMethod::Put, None) => agent.put(&url).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse { status, headers, body }
}

fn start_server(seed: usize) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, mock_server::sample_students(seed)).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn crud_lifecycle() {
    let client = StudentClient::new(&start_server(0));

    // Empty list.
    let page = client
        .parse_list_students(execute(client.build_list_students(1, 10)))
        .unwrap();
    assert!(page.students.is_empty());
    assert_eq!(page.total_count, 0);

    // Create.
    let input = NewStudent {
        first_name: "Integration".to_string(),
        last_name: "Test".to_string(),
        email: "integration@example.com".to_string(),
        ..NewStudent::default()
    };
    let req = client.build_create_student(&input).unwrap();
    let created = client.parse_create_student(execute(req)).unwrap();
    assert_eq!(created.fields, input);
    let id = created.id.clone();

    // Get.
    let fetched = client.parse_get_student(execute(client.build_get_student(&id))).unwrap();
    assert_eq!(fetched, created);

    // Update.
    let mut changed = fetched.clone();
    changed.fields.country = "Norway".to_string();
    let req = client.build_update_student(&id, &changed).unwrap();
    let updated = client.parse_update_student(execute(req)).unwrap();
    assert_eq!(updated.fields.country, "Norway");

    // Delete, then the record is gone.
    client.parse_delete_student(execute(client.build_delete_student(&id))).unwrap();
    let err = client.parse_get_student(execute(client.build_get_student(&id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
    let err = client.parse_delete_student(execute(client.build_delete_student(&id))).unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
fn second_page_of_25_drives_pagination() {
    let client = StudentClient::new(&start_server(25));
    let mut cache = QueryCache::new();
    let mut view = ListView::new(10);
    view.set_page(2);

    let begin = cache.begin_fetch(view.key());
    let outcome = client.parse_list_students(execute(client.build_list_students(view.page(), view.limit())));
    assert!(cache.resolve(&begin.ticket, outcome, Instant::now()));

    let snap = view.snapshot(&cache);
    assert_eq!(snap.phase, ListPhase::Ready);
    let ids: Vec<&str> = snap.students.iter().map(|s| s.id.as_str()).collect();
    let expected: Vec<String> = (11..=20).map(|n: u32| n.to_string()).collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(snap.pagination.total_pages, 3);
    assert!(snap.pagination.previous_enabled);
    assert!(snap.pagination.next_enabled);
}

#[test]
fn delete_invalidates_and_refetch_shrinks_total() {
    let client = StudentClient::new(&start_server(11));
    let mut cache = QueryCache::new();
    let view = ListView::new(10);

    let begin = cache.begin_fetch(view.key());
    let outcome = client.parse_list_students(execute(client.build_list_students(1, 10)));
    cache.resolve(&begin.ticket, outcome, Instant::now());
    assert_eq!(view.snapshot(&cache).pagination.total_pages, 2);

    let victim = StudentId::from("3");
    client
        .parse_delete_student(execute(client.build_delete_student(&victim)))
        .unwrap();
    view.delete_succeeded(&mut cache, &victim);
    assert!(cache.get(&view.key()).unwrap().invalidated);

    let begin = cache.begin_fetch(view.key());
    let outcome = client.parse_list_students(execute(client.build_list_students(1, 10)));
    cache.resolve(&begin.ticket, outcome, Instant::now());
    let snap = view.snapshot(&cache);
    assert_eq!(snap.pagination.total_pages, 1);
    assert!(snap.students.iter().all(|s| s.id != victim));
}

#[test]
fn form_shows_server_validation_errors() {
    let client = StudentClient::new(&start_server(2));

    let mut form = StudentForm::for_route(&Route::AddStudent).unwrap();
    form.set_field(Field::Email, "student1@example.com").unwrap();
    let Submission::Create(input) = form.submit() else {
        panic!("add mode must create");
    };
    let result = client.parse_create_student(execute(client.build_create_student(&input).unwrap()));
    form.finish_submit(result);
    assert_eq!(form.field_error(Field::Email), Some("Email already exists"));

    form.navigate(&Route::parse("/students/2").unwrap());
    assert_eq!(form.mode(), &FormMode::Edit(StudentId::from("2")));
    let id = form.take_fetch().unwrap();
    assert!(form.take_fetch().is_none());
    let fetched = client.parse_get_student(execute(client.build_get_student(&id))).unwrap();
    assert!(form.load(fetched));

    form.set_field(Field::Email, "broken").unwrap();
    let Submission::Update { id, student } = form.submit() else {
        panic!("edit mode must update");
    };
    let result = client.parse_update_student(execute(client.build_update_student(&id, &student).unwrap()));
    let outcome = form.finish_submit(result).clone();
    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert_eq!(form.field_error(Field::Email), Some("Invalid email address"));

    form.set_field(Field::Email, "renamed@example.com").unwrap();
    let Submission::Update { id, student } = form.submit() else {
        panic!("edit mode must update");
    };
    let result = client.parse_update_student(execute(client.build_update_student(&id, &student).unwrap()));
    assert_eq!(
        form.finish_submit(result),
        &SubmitOutcome::Succeeded {
            message: "Updated student 2".to_string()
        }
    );
    assert!(form.field_errors().is_none());
}
