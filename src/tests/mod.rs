use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::client::{ApiClient, ClientError, ClientOptions};
use crate::forms::TreatmentDraft;
use crate::models::{MedicalRecord, Patient, PatientUpdate, Statistics, UserUpdate};
use crate::screen::{TableScreen, ViewScope};

/// Requests seen by the mock backend: `"METHOD /path"` plus the JSON body.
#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<(String, Value)>>>);

impl Seen {
    fn push(&self, what: String, body: Value) {
        self.0.lock().unwrap().push((what, body));
    }

    fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str) -> ApiClient {
    ApiClient::new(ClientOptions {
        base_url: base_url.to_string(),
        timeout_seconds: Some(5),
        ..ClientOptions::default()
    })
    .unwrap()
}

fn patient_json(id: u64, given: &str) -> Value {
    json!({
        "idPaciente": id,
        "nombre": given,
        "apellido": "Gómez",
        "fechaNacimiento": "1985-02-11",
        "telefono": "5550001111",
        "correo": format!("{}@clinic.test", given.to_lowercase()),
    })
}

fn record_json(id: u64, given: &str, day: &str) -> Value {
    json!({
        "idHistoria": id,
        "paciente": patient_json(id + 100, given),
        "notasMedicas": "seguimiento mensual",
        "fechaUltimaActualizacion": day,
    })
}

#[tokio::test]
async fn patients_decode_backend_field_names() {
    let router = Router::new().route(
        "/pacientes",
        get(|| async { Json(json!([patient_json(1, "Ana"), patient_json(2, "Luis")])) }),
    );
    let client = client_for(&serve(router).await);

    let patients = client.list_patients().await.unwrap();
    assert_eq!(patients.len(), 2);
    assert_eq!(patients[0].id, Some(1));
    assert_eq!(patients[1].full_name(), "Luis Gómez");
    assert_eq!(
        patients[0].birth_date,
        NaiveDate::from_ymd_opt(1985, 2, 11).unwrap()
    );
}

#[tokio::test]
async fn create_patient_posts_wire_names_and_returns_saved_entity() {
    let seen = Seen::default();
    let router = Router::new()
        .route(
            "/pacientes",
            post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                seen.push("POST /pacientes".to_string(), body.clone());
                let mut saved = body;
                saved["idPaciente"] = json!(41);
                Json(saved)
            }),
        )
        .with_state(seen.clone());
    let client = client_for(&serve(router).await);

    let draft = Patient {
        id: None,
        given_name: "Marta".to_string(),
        family_name: "Ríos".to_string(),
        birth_date: NaiveDate::from_ymd_opt(2001, 9, 30).unwrap(),
        phone: "5551112222".to_string(),
        email: "marta@clinic.test".to_string(),
    };
    let saved = client.create_patient(&draft).await.unwrap();
    assert_eq!(saved.id, Some(41));
    assert_eq!(saved.given_name, "Marta");

    let requests = seen.take();
    assert_eq!(requests.len(), 1);
    let body = &requests[0].1;
    assert!(body.get("idPaciente").is_none());
    assert_eq!(body["fechaNacimiento"], "2001-09-30");
    assert_eq!(body["correo"], "marta@clinic.test");
}

#[tokio::test]
async fn update_sends_only_supplied_fields_and_delete_reports_status() {
    let seen = Seen::default();
    let router = Router::new()
        .route(
            "/pacientes/:id",
            put(
                |State(seen): State<Seen>, Path(id): Path<u64>, Json(body): Json<Value>| async move {
                    seen.push(format!("PUT /pacientes/{id}"), body);
                    StatusCode::OK
                },
            )
            .delete(|Path(id): Path<u64>| async move {
                if id == 5 {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::NOT_FOUND
                }
            }),
        )
        .with_state(seen.clone());
    let client = client_for(&serve(router).await);

    let update = PatientUpdate {
        phone: Some("5559990000".to_string()),
        ..PatientUpdate::default()
    };
    client.update_patient(5, &update).await.unwrap();
    let requests = seen.take();
    assert_eq!(requests[0].0, "PUT /pacientes/5");
    assert_eq!(requests[0].1, json!({ "telefono": "5559990000" }));

    client.delete_patient(5).await.unwrap();
    let err = client.delete_patient(6).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    assert!(matches!(err, ClientError::Status { .. }));
}

#[tokio::test]
async fn records_without_treatments_page_five_at_a_time() {
    let router = Router::new().route(
        "/historias",
        get(|| async {
            let mut records: Vec<Value> = (1..=7)
                .map(|i| record_json(i, if i % 2 == 0 { "Ana" } else { "Pedro" }, "2024-05-02"))
                .collect();
            records[0]["fechaUltimaActualizacion"] = json!("2024-06-10");
            records[0]["tratamientos"] = json!([{
                "idTratamiento": 9,
                "fechaInicio": "2024-06-10",
                "fechaFin": "2024-07-10",
                "indicaciones": "cada 8 horas",
                "medicamentos": [],
            }]);
            Json(Value::Array(records))
        }),
    );
    let client = client_for(&serve(router).await);
    let scope = ViewScope::new();

    let mut screen = TableScreen::<MedicalRecord>::new(5).unwrap();
    screen
        .refresh(&scope, client.list_records())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(screen.records()[0].treatments.len(), 1);
    assert!(screen.records()[1].treatments.is_empty());

    let view = screen.view().unwrap();
    assert_eq!(view.total_pages, 2);
    assert!(view.shows_pager());

    screen.go_to(2);
    assert_eq!(screen.view().unwrap().items.len(), 2);

    screen.set_filter("date", "2024-05-02").unwrap();
    assert_eq!(screen.page(), 1);
    assert_eq!(screen.view().unwrap().filtered_count, 6);

    screen.set_filter("name", "ana").unwrap();
    let ids: Vec<Option<u64>> = screen.view().unwrap().items.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![Some(2), Some(4), Some(6)]);
}

#[tokio::test]
async fn treatment_medications_are_posted_as_bare_id_list() {
    let seen = Seen::default();
    let router = Router::new()
        .route(
            "/tratamientos/:id/medicamentos",
            post(
                |State(seen): State<Seen>, Path(id): Path<u64>, Json(body): Json<Value>| async move {
                    seen.push(format!("POST /tratamientos/{id}/medicamentos"), body);
                    StatusCode::OK
                },
            ),
        )
        .route(
            "/tratamientos/:id/medicamentos/:med",
            delete(
                |State(seen): State<Seen>, Path((id, med)): Path<(u64, u64)>| async move {
                    seen.push(
                        format!("DELETE /tratamientos/{id}/medicamentos/{med}"),
                        Value::Null,
                    );
                    StatusCode::NO_CONTENT
                },
            ),
        )
        .with_state(seen.clone());
    let client = client_for(&serve(router).await);

    client.add_medications(12, &[3, 8]).await.unwrap();
    client.remove_medication(12, 3).await.unwrap();

    let requests = seen.take();
    assert_eq!(
        requests,
        vec![
            ("POST /tratamientos/12/medicamentos".to_string(), json!([3, 8])),
            (
                "DELETE /tratamientos/12/medicamentos/3".to_string(),
                Value::Null
            ),
        ]
    );
}

#[tokio::test]
async fn new_treatment_embeds_physician_and_medication_snapshots() {
    let seen = Seen::default();
    let router = Router::new()
        .route(
            "/usuarios/medicos",
            get(|| async {
                Json(json!([{
                    "idUsuario": 4,
                    "nombreUsuario": "drlopez",
                    "contraseña": "hunter22",
                    "rolId": 2,
                }]))
            }),
        )
        .route(
            "/medicamentos",
            get(|| async {
                Json(json!([
                    { "idMedicamento": 1, "nombre": "Ibuprofeno", "descripcion": "antiinflamatorio", "dosisRecomendada": "400mg" },
                    { "idMedicamento": 2, "nombre": "Omeprazol", "descripcion": "protector gastrico", "dosisRecomendada": "20mg" },
                ]))
            }),
        )
        .route(
            "/tratamientos",
            post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                seen.push("POST /tratamientos".to_string(), body.clone());
                let mut saved = body;
                saved["idTratamiento"] = json!(77);
                Json(saved)
            }),
        )
        .with_state(seen.clone());
    let client = client_for(&serve(router).await);

    let physicians = client.list_physicians().await.unwrap();
    let catalogue = client.list_medications().await.unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let treatment = TreatmentDraft {
        record_id: 3,
        start_date: None,
        end_date: NaiveDate::from_ymd_opt(2024, 6, 15),
        instructions: "tomar con alimentos".to_string(),
        physician_id: Some(4),
        medication_ids: vec![2, 1, 2],
    }
    .into_treatment(&physicians, &catalogue, today)
    .unwrap();

    let saved = client.create_treatment(&treatment).await.unwrap();
    assert_eq!(saved.id, Some(77));
    assert_eq!(saved.medication_ids(), vec![1, 2]);

    let requests = seen.take();
    let body = &requests[0].1;
    assert_eq!(body["historiaClinica"], json!({ "idHistoria": 3 }));
    assert_eq!(body["fechaInicio"], "2024-06-01");
    assert_eq!(body["medico"]["rolId"], 2);
    assert!(body["medico"].get("contraseña").is_none());
    assert_eq!(body["medicamentos"][0]["nombre"], "Ibuprofeno");
}

#[tokio::test]
async fn user_edit_uses_newpassword_path_and_update_can_skip_password() {
    let seen = Seen::default();
    let router = Router::new()
        .route(
            "/usuarios/newpassword/:id",
            get(|Path(id): Path<u64>| async move {
                Json(json!({ "idUsuario": id, "nombreUsuario": "enfermera1", "rolId": 3 }))
            }),
        )
        .route(
            "/usuarios/:id",
            put(
                |State(seen): State<Seen>, Path(id): Path<u64>, Json(body): Json<Value>| async move {
                    seen.push(format!("PUT /usuarios/{id}"), body);
                    StatusCode::OK
                },
            ),
        )
        .with_state(seen.clone());
    let client = client_for(&serve(router).await);

    let user = client.user_for_edit(7).await.unwrap();
    assert_eq!(user.id, Some(7));
    assert_eq!(user.role_label(), "NURSE");

    let update = crate::forms::validate_user_update(UserUpdate {
        username: Some("enfermera2".to_string()),
        password: Some(String::new()),
        role_id: None,
    })
    .unwrap();
    client.update_user(7, &update).await.unwrap();

    let requests = seen.take();
    assert_eq!(requests[0].0, "PUT /usuarios/7");
    assert_eq!(requests[0].1, json!({ "nombreUsuario": "enfermera2" }));
}

fn statistics_router(fail_appointments: bool) -> Router {
    let router = Router::new()
        .route("/estadisticas/total-usuarios", get(|| async { Json(4u64) }))
        .route("/estadisticas/total-pacientes", get(|| async { Json(120u64) }))
        .route("/estadisticas/total-medicamentos", get(|| async { Json(35u64) }));
    if fail_appointments {
        router.route(
            "/estadisticas/total-citas-programadas",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
    } else {
        router.route(
            "/estadisticas/total-citas-programadas",
            get(|| async { Json(9u64) }),
        )
    }
}

#[tokio::test]
async fn statistics_collects_all_counters() {
    let client = client_for(&serve(statistics_router(false)).await);
    assert_eq!(
        client.statistics().await,
        Statistics {
            total_users: 4,
            total_patients: 120,
            total_scheduled_appointments: 9,
            total_medications: 35,
        }
    );
}

#[tokio::test]
async fn statistics_fall_back_to_zero_when_a_counter_fails() {
    let client = client_for(&serve(statistics_router(true)).await);
    assert_eq!(client.statistics().await, Statistics::default());
}

#[tokio::test]
async fn unexpected_body_is_a_decode_error() {
    let router = Router::new().route(
        "/medicamentos/:id",
        get(|| async { Json(json!({ "unexpected": true })) }),
    );
    let client = client_for(&serve(router).await);
    let err = client.medication(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"));
    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, ClientError::Request { .. }));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn cancelled_view_abandons_slow_request() {
    let router = Router::new().route(
        "/pacientes",
        get(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            Json(json!([]))
        }),
    );
    let client = client_for(&serve(router).await);
    let scope = ViewScope::new();
    let canceller = scope.canceller();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let mut screen = TableScreen::<Patient>::new(10).unwrap();
    let outcome = screen.refresh(&scope, client.list_patients()).await;
    assert!(outcome.is_none());
    assert!(screen.records().is_empty());
}
