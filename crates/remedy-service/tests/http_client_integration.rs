//! Integration tests for HttpFormService, RemedyHelper and BlockingRemedyHelper
//! against an in-process fake AR server.
//!
//! Each test spawns the fake on 127.0.0.1:0 and drives the client layer through
//! the full request/response cycle.

use std::time::Duration;

use remedy_core::attachment::{AttachmentRequest, ATTACHMENT_FIELD};
use remedy_core::form::{field_equals, FormName, FormValues, Visibility};
use remedy_core::order::Order;
use remedy_core::{ErrorKind, RemedyConfig};
use remedy_service::test_helpers::{
    spawn_blocking_fake_remedy, spawn_fake_remedy, PASSWORD, TOKEN, USERNAME,
};
use remedy_service::{
    BlockingRemedyHelper, Credentials, FormService, HttpFormService, RemedyHelper,
};
use serde_json::{json, Value};

const TIMEOUT: Duration = Duration::from_secs(5);

fn config() -> RemedyConfig {
    let mut cfg = RemedyConfig::new("Acme Health", "acme-smartit.onbmc.com");
    cfg.template_build_id = Some("IDGAA5V0F2IWUAPH3YCVPG73D772NR".into());
    cfg.attachment_size_cap_bytes = 1000;
    cfg
}

fn token_service(base_url: &str) -> HttpFormService {
    HttpFormService::with_token(base_url, TIMEOUT, TOKEN.into(), Some(USERNAME.into())).unwrap()
}

fn build_order() -> Order {
    serde_json::from_value(json!({
        "id": "981",
        "name": "Build srv01",
        "owner": "jdoe",
        "group": { "name": "Radiology", "parent": "Clinical" },
        "item": {
            "type": "build",
            "server": {
                "hostname": "srv01", "quantity": 1, "funding_source": "Dept-42",
                "cost_center": "P-1001", "os_build": "RHEL 9",
                "cpu_count": 4, "mem_gb": 16, "disk_gb": 100
            },
            "environment": { "name": "Prod", "cluster": "cl-a", "datastore": "ds-01" },
            "capacity": {
                "cpu_available": 120, "mem_available": 512,
                "disk_available": 8000, "vm_count": 33
            },
            "hardware_cost": { "cpu": 40.0, "mem": 16.5, "disk": 10.0 },
            "quoted_total_cost": "$66.50"
        }
    }))
    .unwrap()
}

fn values(pairs: &[(&str, &str)]) -> FormValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

// ---- HttpFormService ----

#[tokio::test]
async fn login_with_password_and_logout() {
    let fake = spawn_fake_remedy().await;
    let mut svc = HttpFormService::connect(
        &fake.base_url,
        TIMEOUT,
        Credentials::Password {
            username: USERNAME.into(),
            password: PASSWORD.into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(svc.username(), Some(USERNAME));

    svc.create_entry(FormName::People, &values(&[("Remedy Login ID", "jdoe")]))
        .await
        .unwrap();
    svc.logout().await.unwrap();

    let state = fake.state.lock().unwrap();
    assert_eq!((state.logins, state.logouts), (1, 1));
}

#[tokio::test]
async fn bad_password_is_unauthorized() {
    let fake = spawn_fake_remedy().await;
    let err = HttpFormService::connect(
        &fake.base_url,
        TIMEOUT,
        Credentials::Password {
            username: USERNAME.into(),
            password: "wrong".into(),
        },
    )
    .await
    .err()
    .unwrap();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(err.to_string().contains("ARERR 623"));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let fake = spawn_fake_remedy().await;
    let svc = HttpFormService::new(&fake.base_url, TIMEOUT).unwrap();
    let err = svc
        .query_entries(FormName::Task, &field_equals("RootRequestID", "WO1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn create_follows_location_and_query_filters() {
    let fake = spawn_fake_remedy().await;
    let svc = token_service(&fake.base_url);

    let created = svc
        .create_entry(
            FormName::HelpDesk,
            &values(&[("Incident ID", "INC0001"), ("Status", "New")]),
        )
        .await
        .unwrap();
    assert_eq!(created.field_str("Incident ID"), Some("INC0001"));
    let request_id = created.field_str("Request ID").unwrap().to_string();

    svc.create_entry(
        FormName::HelpDesk,
        &values(&[("Incident ID", "INC0002"), ("Status", "New")]),
    )
    .await
    .unwrap();

    let found = svc
        .query_entries(FormName::HelpDesk, &field_equals("Incident ID", "INC0001"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].field_str("Request ID"), Some(request_id.as_str()));

    let fetched = svc.get_entry(FormName::HelpDesk, &request_id).await.unwrap();
    assert_eq!(fetched.field_str("Status"), Some("New"));
}

#[tokio::test]
async fn server_errors_are_classified() {
    let fake = spawn_fake_remedy().await;
    let svc = token_service(&fake.base_url);

    let err = svc
        .get_entry(FormName::Task, "000000000009999")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // the fake requires Summary on work orders
    let err = svc
        .create_entry(FormName::WorkOrderInterface, &values(&[("Notes", "x")]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("Required field cannot be blank."));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let svc = HttpFormService::with_token(
        "http://127.0.0.1:9",
        Duration::from_millis(500),
        TOKEN.into(),
        None,
    )
    .unwrap();
    let err = svc
        .get_entry(FormName::Task, "000000000000001")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn form_fields_via_http() {
    let fake = spawn_fake_remedy().await;
    let svc = token_service(&fake.base_url);

    let all = svc.get_form_fields("HPD:Help Desk", None).await.unwrap();
    assert_eq!(all[0]["form"], "HPD:Help Desk");
    assert!(all[0]["ids"].is_null());

    let some = svc.get_form_fields("TMS:Task", Some("1,7")).await.unwrap();
    assert_eq!(some[1]["ids"], "1,7");
}

// ---- RemedyHelper over HTTP ----

#[tokio::test]
async fn create_work_order_end_to_end() {
    let fake = spawn_fake_remedy().await;
    let helper = RemedyHelper::new(token_service(&fake.base_url), config()).unwrap();

    let created = helper.create_work_order(&build_order()).await.unwrap();
    assert_eq!(created["Subcategory"], "Build");
    assert_eq!(created["Summary"], "Build srv01");
    assert_eq!(created["TemplateID"], "IDGAA5V0F2IWUAPH3YCVPG73D772NR");
    let description = created["Description"].as_str().unwrap();
    assert!(description.contains("Server Name:\t srv01\n"));
    assert!(description.contains("Quantity:\t 1\n"));
    assert!(description.contains("Funding Source:\t Dept-42\n"));

    let wo_id = created["Work Order ID"].as_str().unwrap();
    let fetched = helper.get_work_order(wo_id).await.unwrap();
    assert_eq!(fetched.field_str("Requester"), Some("jdoe"));
}

#[tokio::test]
async fn resubmitting_creates_a_second_work_order() {
    let fake = spawn_fake_remedy().await;
    let helper = RemedyHelper::new(token_service(&fake.base_url), config()).unwrap();
    let payload = helper.build_work_order(&build_order()).unwrap();

    let first = helper.submit_work_order(&payload).await.unwrap();
    let second = helper.submit_work_order(&payload).await.unwrap();
    assert_ne!(first["Work Order ID"], second["Work Order ID"]);
    assert_eq!(
        fake.state.lock().unwrap().count("WOI:WorkOrderInterface"),
        2
    );
}

#[tokio::test]
async fn unknown_work_order_is_not_found() {
    let fake = spawn_fake_remedy().await;
    let helper = RemedyHelper::new(token_service(&fake.base_url), config()).unwrap();
    let err = helper.get_work_order("WO0000000009999").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = helper.get_work_order_tasks("WO0000000009999").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn tasks_people_incidents_and_notes() {
    let fake = spawn_fake_remedy().await;
    {
        let mut state = fake.state.lock().unwrap();
        state.insert(
            "TMS:Task",
            values(&[("RootRequestID", "WO1"), ("Status", "Assigned")]),
        );
        state.insert(
            "CTM:People",
            values(&[("Remedy Login ID", "jdoe"), ("Full Name", "Jane Doe")]),
        );
        state.insert(
            "HPD:Help Desk",
            values(&[("Incident ID", "INC1"), ("Status", "In Progress")]),
        );
        state.insert(
            "HPD:WorkLog",
            values(&[("Incident Number", "INC1"), ("Detailed Description", "a")]),
        );
        state.insert(
            "HPD:WorkLog",
            values(&[("Incident Number", "INC1"), ("Detailed Description", "b")]),
        );
    }
    let helper = RemedyHelper::new(token_service(&fake.base_url), config()).unwrap();

    let tasks = helper.get_work_order_tasks("WO1").await.unwrap();
    assert_eq!(tasks.len(), 1);
    let task_id = tasks[0].field_str("Request ID").unwrap().to_string();

    let updated = helper
        .set_work_order_task(&task_id, &values(&[("Status", "Closed")]))
        .await
        .unwrap();
    assert_eq!(updated["Status"], "Closed");

    let person = helper.get_person_by_username("jdoe").await.unwrap();
    assert_eq!(person.field_str("Full Name"), Some("Jane Doe"));

    let incident = helper.get_incident("INC1").await.unwrap();
    assert_eq!(incident.field_str("Status"), Some("In Progress"));

    let notes = helper.get_incident_notes("INC1").await.unwrap();
    assert_eq!(notes.len(), 2);

    let note = helper
        .create_work_order_note("WO1", "racked and cabled", Visibility::Internal)
        .await
        .unwrap();
    assert_eq!(note["Work Log Submitter"], USERNAME);
    assert_eq!(note["View Access"], "Internal");
}

#[tokio::test]
async fn attach_file_sends_trailing_window() {
    let fake = spawn_fake_remedy().await;
    let helper = RemedyHelper::new(token_service(&fake.base_url), config()).unwrap();
    let created = helper.create_work_order(&build_order()).await.unwrap();
    let wo_id = created["Work Order ID"].as_str().unwrap().to_string();

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("provision.log");
    let data: Vec<u8> = (0..4000u32).map(|i| (i % 253) as u8).collect();
    std::fs::write(&path, &data).unwrap();

    let mut req = AttachmentRequest::new(&wo_id, &path, "provision.log");
    req.details = "build log".into();
    req.visibility = Visibility::Public;
    req.content_type = "text/plain".into();

    let outcome = helper.attach_file_to_work_order(&req).await.unwrap();
    assert_eq!(outcome.status, 204);
    assert_eq!(outcome.values[ATTACHMENT_FIELD], "provision.log");
    assert_eq!(outcome.values["z1D_View_Access"], "Public");

    let state = fake.state.lock().unwrap();
    assert_eq!(state.uploads.len(), 1);
    let upload = &state.uploads[0];
    assert_eq!(upload.form, "WOI:WorkOrder");
    assert_eq!(upload.field, ATTACHMENT_FIELD);
    assert_eq!(upload.file_name.as_deref(), Some("provision.log"));
    assert_eq!(upload.content_type.as_deref(), Some("text/plain"));
    assert_eq!(upload.data, &data[3000..]);
}

#[tokio::test]
async fn attach_small_file_sends_everything() {
    let fake = spawn_fake_remedy().await;
    let helper = RemedyHelper::new(token_service(&fake.base_url), config()).unwrap();
    let created = helper.create_work_order(&build_order()).await.unwrap();
    let wo_id = created["Work Order ID"].as_str().unwrap().to_string();

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("evidence.txt");
    std::fs::write(&path, b"checksum ok\n").unwrap();

    helper
        .attach_file_to_work_order(&AttachmentRequest::new(&wo_id, &path, "evidence.txt"))
        .await
        .unwrap();
    let state = fake.state.lock().unwrap();
    assert_eq!(state.uploads[0].data, b"checksum ok\n");
}

#[tokio::test]
async fn attach_to_unknown_work_order_is_not_found() {
    let fake = spawn_fake_remedy().await;
    let helper = RemedyHelper::new(token_service(&fake.base_url), config()).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("x.log");
    std::fs::write(&path, b"x").unwrap();

    let err = helper
        .attach_file_to_work_order(&AttachmentRequest::new("WO404", &path, "x.log"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(fake.state.lock().unwrap().uploads.is_empty());
}

#[tokio::test]
async fn import_work_order_via_http() {
    let fake = spawn_fake_remedy().await;
    let helper = RemedyHelper::new(token_service(&fake.base_url), config()).unwrap();
    let created = helper.create_work_order(&build_order()).await.unwrap();
    let wo_id = created["Work Order ID"].as_str().unwrap();

    let imported = helper.import_work_order(wo_id, Some("981")).await.unwrap();
    assert_eq!(imported.name, wo_id);
    assert_eq!(imported.status, "Assigned");
    assert!(imported
        .href
        .starts_with("https://acme-smartit.onbmc.com/smartit/app/#/workorder/AGGAA"));
}

// ---- BlockingRemedyHelper ----

// BlockingRemedyHelper creates its own tokio runtime, so the fake must run
// on a separate thread to avoid nested runtime panics.

#[test]
fn blocking_helper_round_trip() {
    let (url, state) = spawn_blocking_fake_remedy();
    let helper = BlockingRemedyHelper::connect(
        &url,
        TIMEOUT,
        Credentials::Password {
            username: USERNAME.into(),
            password: PASSWORD.into(),
        },
        config(),
    )
    .unwrap();

    let created = helper.create_work_order(&build_order()).unwrap();
    let wo_id = created["Work Order ID"].as_str().unwrap().to_string();

    let fetched = helper.get_work_order(&wo_id).unwrap();
    assert_eq!(fetched.field_str("Subcategory"), Some("Build"));

    let note = helper
        .create_work_order_note(&wo_id, "handed to build team", Visibility::Internal)
        .unwrap();
    assert_eq!(note["Work Order ID"], wo_id.as_str());

    let err = helper.get_incident("INC404").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(state.lock().unwrap().count("WOI:WorkInfo"), 1);
    helper.logout().unwrap();
    assert_eq!(state.lock().unwrap().open_sessions(), 0);
}

#[test]
fn blocking_connect_rejects_config_before_login() {
    let (url, state) = spawn_blocking_fake_remedy();
    let result = BlockingRemedyHelper::connect(
        &url,
        TIMEOUT,
        Credentials::Password {
            username: USERNAME.into(),
            password: PASSWORD.into(),
        },
        RemedyConfig::new("", "acme-smartit.onbmc.com"),
    );
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Config));

    let state = state.lock().unwrap();
    assert_eq!(state.logins, 0);
    assert_eq!(state.open_sessions(), 0);
}
