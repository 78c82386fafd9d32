//! API integration tests
//!
//! Health endpoint, GraphQL authorization, mutations and exports over HTTP

use anyhow::Result;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use individual::config::RegistryConfig;
use individual::database::connection::setup_database;
use individual::server::app::{create_app, SESSION_HEADER};
use individual::services::AuthorizationService;
use sea_orm::Database;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

const ALL_RIGHTS: &[&str] = &[
    "159001", "159002", "159003", "159004", "180001", "180002", "180003", "180004",
];

struct TestApp {
    server: TestServer,
    session: String,
    _db_file: NamedTempFile,
}

impl TestApp {
    async fn graphql(&self, query: &str, variables: Value) -> Value {
        self.server
            .post("/graphql")
            .add_header(
                HeaderName::from_static(SESSION_HEADER),
                HeaderValue::from_str(&self.session).unwrap(),
            )
            .json(&json!({ "query": query, "variables": variables }))
            .await
            .json()
    }
}

/// Create a test server over a fresh database and a session holding `rights`
async fn setup_test_server(rights: &[&str]) -> Result<TestApp> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    let rights: Vec<String> = rights.iter().map(|r| r.to_string()).collect();
    let (_, session) = AuthorizationService::new(db.clone())
        .create_user_with_session("tester", &rights, chrono::Duration::hours(1))
        .await?;

    let app = create_app(db, RegistryConfig::default()).await?;
    let server = TestServer::new(app)?;

    Ok(TestApp {
        server,
        session,
        _db_file: temp_file,
    })
}

fn error_code(body: &Value) -> Option<&str> {
    body["errors"][0]["extensions"]["code"].as_str()
}

const CREATE_INDIVIDUAL: &str = r#"
    mutation Create($input: CreateIndividualInput!) {
        createIndividual(input: $input) {
            clientMutationId
            internalId
            status
            error
            recordIds
        }
    }
"#;

async fn create_individual(app: &TestApp, first: &str, last: &str, cmid: &str) -> Value {
    app.graphql(
        CREATE_INDIVIDUAL,
        json!({
            "input": {
                "firstName": first,
                "lastName": last,
                "dob": "1990-04-01",
                "jsonExt": { "educated_level": "primary", "number_of_children": 2 },
                "clientMutationId": cmid,
            }
        }),
    )
    .await
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let app = setup_test_server(&[]).await?;

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["service"], "individual-registry");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_graphql_playground_is_served() -> Result<()> {
    let app = setup_test_server(&[]).await?;

    let response = app.server.get("/graphql").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("GraphQL"));

    Ok(())
}

#[tokio::test]
async fn test_query_without_session_is_unauthorized() -> Result<()> {
    let app = setup_test_server(ALL_RIGHTS).await?;

    let body: Value = app
        .server
        .post("/graphql")
        .json(&json!({ "query": "{ individual { totalCount } }" }))
        .await
        .json();

    assert_eq!(error_code(&body), Some("UNAUTHORIZED"));
    assert!(body["data"].is_null());

    Ok(())
}

#[tokio::test]
async fn test_query_without_right_is_unauthorized() -> Result<()> {
    let app = setup_test_server(&["180001"]).await?;

    let body = app.graphql("{ individual { totalCount } }", json!({})).await;
    assert_eq!(error_code(&body), Some("UNAUTHORIZED"));

    let body = app.graphql("{ group { totalCount } }", json!({})).await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    assert_eq!(body["data"]["group"]["totalCount"], 0);

    Ok(())
}

#[tokio::test]
async fn test_create_and_query_individual() -> Result<()> {
    let app = setup_test_server(ALL_RIGHTS).await?;

    let body = create_individual(&app, "Amina", "Diallo", "cmid-1").await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    let result = &body["data"]["createIndividual"];
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["clientMutationId"], "cmid-1");
    assert_eq!(result["recordIds"].as_array().map(Vec::len), Some(1));

    create_individual(&app, "Bakary", "Traore", "cmid-2").await;

    let body = app
        .graphql(
            r#"{
                individual(firstName_Icontains: "ami", orderBy: ["lastName"]) {
                    totalCount
                    edges { node { firstName lastName dob jsonExt version } }
                }
            }"#,
            json!({}),
        )
        .await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    let connection = &body["data"]["individual"];
    assert_eq!(connection["totalCount"], 1);
    let node = &connection["edges"][0]["node"];
    assert_eq!(node["firstName"], "Amina");
    assert_eq!(node["dob"], "1990-04-01");
    assert_eq!(node["jsonExt"]["number_of_children"], 2);
    assert_eq!(node["version"], 1);

    Ok(())
}

#[tokio::test]
async fn test_client_mutation_id_filter_and_logs() -> Result<()> {
    let app = setup_test_server(ALL_RIGHTS).await?;

    create_individual(&app, "Amina", "Diallo", "batch-a").await;
    create_individual(&app, "Bakary", "Traore", "batch-b").await;

    let body = app
        .graphql(
            r#"{ individual(client_mutation_id: "batch-b") { totalCount edges { node { lastName } } } }"#,
            json!({}),
        )
        .await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    assert_eq!(body["data"]["individual"]["totalCount"], 1);
    assert_eq!(
        body["data"]["individual"]["edges"][0]["node"]["lastName"],
        "Traore"
    );

    let body = app
        .graphql(
            r#"{ mutationLogs(clientMutationId: "batch-a") { mutationName status recordIds } }"#,
            json!({}),
        )
        .await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    let logs = body["data"]["mutationLogs"].as_array().cloned().unwrap_or_default();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["mutationName"], "createIndividual");
    assert_eq!(logs[0]["status"], "SUCCESS");

    Ok(())
}

#[tokio::test]
async fn test_failed_mutation_is_logged_as_error() -> Result<()> {
    let app = setup_test_server(ALL_RIGHTS).await?;

    let body = app
        .graphql(
            r#"
            mutation Update($input: UpdateIndividualInput!) {
                updateIndividual(input: $input) { status error recordIds }
            }
            "#,
            json!({
                "input": {
                    "id": "00000000-0000-0000-0000-000000000000",
                    "firstName": "Nobody",
                }
            }),
        )
        .await;

    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    let result = &body["data"]["updateIndividual"];
    assert_eq!(result["status"], "ERROR");
    assert!(result["error"].as_str().is_some());
    assert_eq!(result["recordIds"].as_array().map(Vec::len), Some(0));

    Ok(())
}

#[tokio::test]
async fn test_group_with_members_and_export() -> Result<()> {
    let app = setup_test_server(ALL_RIGHTS).await?;

    let first = create_individual(&app, "Amina", "Diallo", "").await;
    let second = create_individual(&app, "Bakary", "Diallo", "").await;
    let head_id = first["data"]["createIndividual"]["recordIds"][0].clone();
    let spouse_id = second["data"]["createIndividual"]["recordIds"][0].clone();

    let body = app
        .graphql(
            r#"
            mutation Create($input: CreateGroupIndividualsInput!) {
                createGroupIndividuals(input: $input) { status error recordIds }
            }
            "#,
            json!({
                "input": {
                    "code": "HH-001",
                    "individualsData": [
                        { "individualId": head_id, "role": "HEAD" },
                        { "individualId": spouse_id, "role": "SPOUSE" },
                    ],
                }
            }),
        )
        .await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    assert_eq!(body["data"]["createGroupIndividuals"]["status"], "SUCCESS");

    let body = app
        .graphql(
            r#"{
                group(last_name: "diallo") {
                    totalCount
                    edges { node { code head { firstName } members { role } } }
                }
            }"#,
            json!({}),
        )
        .await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    let group = &body["data"]["group"];
    assert_eq!(group["totalCount"], 1);
    assert_eq!(group["edges"][0]["node"]["code"], "HH-001");
    assert_eq!(
        group["edges"][0]["node"]["head"]["firstName"],
        "Amina"
    );
    assert_eq!(
        group["edges"][0]["node"]["members"].as_array().map(Vec::len),
        Some(2)
    );

    let body = app
        .graphql(
            r#"{
                individualExport(
                    fields: ["firstName", "lastName", "number_of_children"],
                    fieldsColumns: "{\"firstName\": \"First name\"}",
                    orderBy: ["firstName"]
                )
            }"#,
            json!({}),
        )
        .await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    let csv = body["data"]["individualExport"].as_str().unwrap_or_default();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "First name,lastName,number_of_children");
    assert_eq!(lines[1], "Amina,Diallo,2");
    assert_eq!(lines[2], "Bakary,Diallo,2");

    Ok(())
}

#[tokio::test]
async fn test_invalid_group_id_is_a_validation_error() -> Result<()> {
    let app = setup_test_server(ALL_RIGHTS).await?;

    let body = app
        .graphql(r#"{ individual(groupId: "not-a-uuid") { totalCount } }"#, json!({}))
        .await;

    assert_eq!(error_code(&body), Some("VALIDATION_FAILED"));
    assert_eq!(body["errors"][0]["extensions"]["field"], "groupId");

    Ok(())
}

#[tokio::test]
async fn test_exports_honour_list_filters() -> Result<()> {
    let app = setup_test_server(ALL_RIGHTS).await?;

    create_individual(&app, "Amina", "Diallo", "").await;
    create_individual(&app, "Bakary", "Traore", "").await;

    let body = app
        .graphql(
            r#"{ individualExport(fields: ["firstName", "lastName"], firstName_Icontains: "MIN") }"#,
            json!({}),
        )
        .await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    let csv = body["data"]["individualExport"].as_str().unwrap_or_default();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["firstName,lastName", "Amina,Diallo"]);

    for (code, size) in [("HH-100", 6), ("HH-200", 2)] {
        let body = app
            .graphql(
                r#"
                mutation Create($input: CreateGroupInput!) {
                    createGroup(input: $input) { status }
                }
                "#,
                json!({ "input": { "code": code, "jsonExt": { "household_size": size } } }),
            )
            .await;
        assert_eq!(body["data"]["createGroup"]["status"], "SUCCESS", "{}", body);
    }

    let body = app
        .graphql(
            r#"{
                groupExport(
                    fields: ["code"],
                    customFilters: ["household_size__gt__integer=4"]
                )
            }"#,
            json!({}),
        )
        .await;
    assert!(body["errors"].is_null(), "unexpected errors: {}", body);
    let csv = body["data"]["groupExport"].as_str().unwrap_or_default();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["code", "HH-100"]);

    let body = app
        .graphql(r#"{ groupExport(fields: ["code"], code_Icontains: "hh-2") }"#, json!({}))
        .await;
    let csv = body["data"]["groupExport"].as_str().unwrap_or_default();
    assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["code", "HH-200"]);

    Ok(())
}
