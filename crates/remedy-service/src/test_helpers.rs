//! In-process fake of the AR System REST API for tests.
//!
//! Implements just enough of the jwt and entry endpoints for the client
//! layer to run its full request/response cycle: token login, qualified
//! queries, create with Location, JSON and multipart updates, field lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use remedy_core::form::{parse_field_equals, FormValues};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const USERNAME: &str = "svc-cmp";
pub const PASSWORD: &str = "s3cret";
pub const TOKEN: &str = "tok-0123456789";

#[derive(Debug, Clone)]
pub struct Upload {
    pub form: String,
    pub request_id: String,
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct FakeState {
    pub forms: HashMap<String, Vec<FormValues>>,
    pub uploads: Vec<Upload>,
    /// Successful logins and logouts, to check sessions are released.
    pub logins: usize,
    pub logouts: usize,
    next_id: u64,
}

impl FakeState {
    pub fn insert(&mut self, form: &str, mut values: FormValues) -> String {
        let id = match values.get("Request ID").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                self.next_id += 1;
                let id = format!("{:015}", self.next_id);
                values.insert("Request ID".into(), Value::String(id.clone()));
                id
            }
        };
        self.forms.entry(form.to_string()).or_default().push(values);
        id
    }

    /// Sessions opened by login and never logged out.
    pub fn open_sessions(&self) -> usize {
        self.logins.saturating_sub(self.logouts)
    }

    fn find_mut(&mut self, form: &str, id: &str) -> Option<&mut FormValues> {
        self.forms.get_mut(form)?.iter_mut().find(|v| {
            v.get("Request ID").and_then(Value::as_str) == Some(id)
        })
    }

    pub fn count(&self, form: &str) -> usize {
        self.forms.get(form).map(Vec::len).unwrap_or(0)
    }
}

pub type Shared = Arc<Mutex<FakeState>>;

pub struct FakeRemedy {
    pub base_url: String,
    pub state: Shared,
    _handle: tokio::task::JoinHandle<()>,
}

fn ar_error(status: StatusCode, number: i64, text: &str) -> Response {
    (
        status,
        Json(json!([{
            "messageType": "ERROR",
            "messageText": text,
            "messageNumber": number,
        }])),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("AR-JWT {TOKEN}").as_str())
}

async fn login(
    State(state): State<Shared>,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let user = params.get("username").map(String::as_str);
    let pass = params.get("password").map(String::as_str);
    if user == Some(USERNAME) && pass == Some(PASSWORD) {
        state.lock().unwrap().logins += 1;
        (StatusCode::OK, TOKEN).into_response()
    } else {
        ar_error(StatusCode::UNAUTHORIZED, 623, "Authentication failed")
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return ar_error(StatusCode::UNAUTHORIZED, 623, "Authentication failed");
    }
    state.lock().unwrap().logouts += 1;
    StatusCode::NO_CONTENT.into_response()
}

async fn query_entries(
    State(state): State<Shared>,
    Path(form): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return ar_error(StatusCode::UNAUTHORIZED, 623, "Authentication failed");
    }
    let Some((field, value)) = params.get("q").and_then(|q| parse_field_equals(q)) else {
        return ar_error(StatusCode::BAD_REQUEST, 1587, "Bad qualification");
    };
    let state = state.lock().unwrap();
    let entries: Vec<Value> = state
        .forms
        .get(&form)
        .map(|list| {
            list.iter()
                .filter(|v| v.get(&field).and_then(Value::as_str) == Some(value.as_str()))
                .map(|v| json!({ "values": v, "_links": { "self": [] } }))
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "entries": entries, "_links": {} })).into_response()
}

async fn create_entry(
    State(state): State<Shared>,
    Path(form): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return ar_error(StatusCode::UNAUTHORIZED, 623, "Authentication failed");
    }
    let Some(mut values) = body.get("values").and_then(Value::as_object).cloned() else {
        return ar_error(StatusCode::BAD_REQUEST, 8960, "Missing values");
    };
    if !values.contains_key("Summary") && form == "WOI:WorkOrderInterface" {
        return ar_error(StatusCode::BAD_REQUEST, 326, "Required field cannot be blank.");
    }

    let mut state = state.lock().unwrap();
    if form == "WOI:WorkOrderInterface" {
        let n = state.next_id + 1;
        values.insert("Work Order ID".into(), json!(format!("WO{n:013}")));
        values.insert("InstanceId".into(), json!(format!("AGGAA{n:05}")));
        values.insert("Status".into(), json!("Assigned"));
    }
    let id = state.insert(&form, values.clone());
    if form == "WOI:WorkOrderInterface" {
        // the interface form is a view over WOI:WorkOrder
        values.insert("Request ID".into(), json!(id.clone()));
        state.insert("WOI:WorkOrder", values);
    }

    let location = format!("/api/arsys/v1/entry/{}/{id}", form.replace(' ', "%20"));
    (StatusCode::CREATED, [(header::LOCATION, location)]).into_response()
}

async fn get_entry(
    State(state): State<Shared>,
    Path((form, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return ar_error(StatusCode::UNAUTHORIZED, 623, "Authentication failed");
    }
    let mut state = state.lock().unwrap();
    match state.find_mut(&form, &id) {
        Some(values) => Json(json!({ "values": values })).into_response(),
        None => ar_error(StatusCode::NOT_FOUND, 302, "Entry does not exist in database"),
    }
}

async fn update_entry(
    State(state): State<Shared>,
    Path((form, id)): Path<(String, String)>,
    headers: HeaderMap,
    request: Request,
) -> Response {
    if !authorized(&headers) {
        return ar_error(StatusCode::UNAUTHORIZED, 623, "Authentication failed");
    }
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let mut values = FormValues::new();
    let mut uploads = Vec::new();
    if is_multipart {
        let mut multipart = match Multipart::from_request(request, &()).await {
            Ok(m) => m,
            Err(e) => return ar_error(StatusCode::BAD_REQUEST, 8960, &e.to_string()),
        };
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(String::from);
            let content_type = field.content_type().map(String::from);
            let data = field.bytes().await.unwrap_or_default().to_vec();
            if name == "entry" {
                let body: Value = serde_json::from_slice(&data).unwrap_or_default();
                if let Some(v) = body.get("values").and_then(Value::as_object) {
                    values = v.clone();
                }
            } else if let Some(slot) = name.strip_prefix("attach-") {
                uploads.push(Upload {
                    form: form.clone(),
                    request_id: id.clone(),
                    field: slot.to_string(),
                    file_name,
                    content_type,
                    data,
                });
            }
        }
    } else {
        match Json::<Value>::from_request(request, &()).await {
            Ok(Json(body)) => {
                if let Some(v) = body.get("values").and_then(Value::as_object) {
                    values = v.clone();
                }
            }
            Err(e) => return ar_error(StatusCode::BAD_REQUEST, 8960, &e.to_string()),
        }
    }

    let mut state = state.lock().unwrap();
    let Some(stored) = state.find_mut(&form, &id) else {
        return ar_error(StatusCode::NOT_FOUND, 302, "Entry does not exist in database");
    };
    for (k, v) in values {
        stored.insert(k, v);
    }
    state.uploads.extend(uploads);
    StatusCode::NO_CONTENT.into_response()
}

fn field_list(headers: &HeaderMap, form: String, ids: Option<String>) -> Response {
    if !authorized(headers) {
        return ar_error(StatusCode::UNAUTHORIZED, 623, "Authentication failed");
    }
    Json(json!([
        { "name": "Request ID", "id": 1, "data_type": "CHAR", "form": form, "ids": ids },
        { "name": "Status", "id": 7, "data_type": "ENUM", "form": form, "ids": ids },
    ]))
    .into_response()
}

async fn form_fields(Path(form): Path<String>, headers: HeaderMap) -> Response {
    field_list(&headers, form, None)
}

async fn form_fields_by_id(
    Path((form, ids)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    field_list(&headers, form, Some(ids))
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/jwt/login", post(login))
        .route("/api/jwt/logout", post(logout))
        .route(
            "/api/arsys/v1/entry/{form}",
            get(query_entries).post(create_entry),
        )
        .route(
            "/api/arsys/v1/entry/{form}/{id}",
            get(get_entry).put(update_entry),
        )
        .route("/api/arsys/v1.0/fields/{form}", get(form_fields))
        .route("/api/arsys/v1.0/fields/{form}/{ids}", get(form_fields_by_id))
        .with_state(state)
}

/// Spawn the fake on a random port.
pub async fn spawn_fake_remedy() -> FakeRemedy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state: Shared = Arc::default();
    let app = router(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    FakeRemedy {
        base_url: format!("http://{addr}"),
        state,
        _handle: handle,
    }
}

/// Spawn the fake on its own thread and runtime, for blocking clients that
/// bring their own runtime.
pub fn spawn_blocking_fake_remedy() -> (String, Shared) {
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fake = spawn_fake_remedy().await;
            tx.send((fake.base_url.clone(), fake.state.clone())).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}
