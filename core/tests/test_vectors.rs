//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and either the expected parse result or the expected error variant.
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use dida_core::{Credentials, DidaApi, DidaError, HttpMethod, HttpRequest, HttpResponse, Links, NewProject, NewTask, Project, Task};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000/api/v2";

fn api() -> DidaApi {
    DidaApi::new(BASE_URL, Links::default())
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");
    assert!(req.header("x-device").is_some(), "{name}: x-device header");
    match expected.get("body") {
        Some(body) => {
            let actual: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: unexpected body"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

fn variant(err: &DidaError) -> &'static str {
    match err {
        DidaError::AuthRejected { .. } => "AuthRejected",
        DidaError::Unauthorized => "Unauthorized",
        DidaError::HttpError { .. } => "HttpError",
        DidaError::UnexpectedResponse(_) => "UnexpectedResponse",
        DidaError::DeserializationError(_) => "DeserializationError",
        _ => "other",
    }
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().map(|s| s.as_str().unwrap().to_string()).collect())
        .unwrap_or_default()
}

fn expected_task(value: &Value) -> Task {
    Task {
        id: value["id"].as_str().unwrap().to_string(),
        title: value["title"].as_str().unwrap().to_string(),
        content: value["content"].as_str().unwrap().to_string(),
        tags: strings(&value["tags"]),
        project_id: value["projectId"].as_str().unwrap().to_string(),
        link: value["link"].as_str().unwrap().to_string(),
    }
}

fn optional(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

// ---------------------------------------------------------------------------
// Sign-on
// ---------------------------------------------------------------------------

#[test]
fn sign_on_test_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/sign_on.json")) {
        let name = case["name"].as_str().unwrap();
        let input: Credentials = serde_json::from_value(case["input"].clone()).unwrap();

        let req = api.build_sign_on(&input).unwrap();
        check_request(name, &req, &case["expected_request"]);
        assert!(req.header("cookie").is_none(), "{name}: sign-on sends no token");

        let result = api.parse_sign_on(simulated(&case));
        match case.get("expected_error") {
            Some(err) => assert_eq!(variant(&result.unwrap_err()), err.as_str().unwrap(), "{name}: error"),
            None => assert_eq!(result.unwrap(), case["expected_result"].as_str().unwrap(), "{name}: token"),
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[test]
fn create_project_test_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/create_project.json")) {
        let name = case["name"].as_str().unwrap();
        let input = NewProject {
            title: case["input"]["title"].as_str().unwrap().to_string(),
        };

        let req = api.build_create_project("tok", &input).unwrap();
        check_request(name, &req, &case["expected_request"]);
        assert_eq!(req.header("cookie"), Some("t=tok"), "{name}: cookie");

        let result = api.parse_create_project(simulated(&case), &input);
        match case.get("expected_error") {
            Some(err) => assert_eq!(variant(&result.unwrap_err()), err.as_str().unwrap(), "{name}: error"),
            None => {
                let expected = &case["expected_result"];
                let expected = Project {
                    id: expected["id"].as_str().unwrap().to_string(),
                    title: expected["title"].as_str().unwrap().to_string(),
                    link: expected["link"].as_str().unwrap().to_string(),
                };
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[test]
fn create_task_test_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/create_task.json")) {
        let name = case["name"].as_str().unwrap();
        let input = NewTask {
            title: case["input"]["title"].as_str().unwrap().to_string(),
            tags: strings(&case["input"]["tags"]),
            content: optional(&case["input"]["content"]),
            project_id: optional(&case["input"]["projectId"]),
        };

        let req = api.build_create_task("tok", &input).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let task = api.parse_create_task(simulated(&case), &input).unwrap();
        assert_eq!(task, expected_task(&case["expected_result"]), "{name}: parsed result");
    }
}

#[test]
fn search_tasks_test_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/search_tasks.json")) {
        let name = case["name"].as_str().unwrap();
        let keyword = case["keyword"].as_str().unwrap();

        let req = api.build_search_tasks("tok", keyword).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = api.parse_search_tasks(simulated(&case));
        match case.get("expected_error") {
            Some(err) => assert_eq!(variant(&result.unwrap_err()), err.as_str().unwrap(), "{name}: error"),
            None => {
                let expected: Vec<Task> = case["expected_result"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(expected_task)
                    .collect();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}
