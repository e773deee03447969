//! Integration tests for the administrator ambassador API.

use axum::http::{Method, StatusCode};
use ranking_integration_tests::TestContext;
use ranking_web::models::Ambassador;
use rust_decimal::Decimal;
use serde_json::json;

async fn admin_context() -> TestContext {
    let mut ctx = TestContext::new().await;
    let response = ctx.login_administrator().await;
    assert_eq!(response.status, StatusCode::OK);
    ctx
}

#[tokio::test]
async fn test_create_ambassador() {
    let mut ctx = admin_context().await;

    let response = ctx
        .send_json(
            Method::POST,
            "/admin/api/user",
            &json!({ "name": "Maria Silva", "cpf": "52998224725", "password": "secret1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let body = response.json();
    assert_eq!(body["success"], true);
    let user = &body["user"];
    assert_eq!(user["name"], "Maria Silva");
    assert_eq!(user["cpf"], "529.982.247-25");
    assert_eq!(user["total_sales"], 0.0);
    assert_eq!(user["total_lists"], 0);
    assert_eq!(user["goal"], 50000.0);

    let coupon = user["coupon"].as_str().unwrap();
    assert!(coupon.starts_with("ODONTOMARIASIL"));
    assert_eq!(coupon.len(), "ODONTOMARIASIL".len() + 2);
}

#[tokio::test]
async fn test_created_ambassador_can_log_in() {
    let mut ctx = admin_context().await;
    ctx.send_json(
        Method::POST,
        "/admin/api/user",
        &json!({ "name": "Maria Silva", "cpf": "529.982.247-25", "password": "secret1" }),
    )
    .await;

    let response = ctx.login_ambassador("52998224725").await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_duplicate_cpf_is_409() {
    let mut ctx = admin_context().await;
    ctx.create_ambassador("Maria Silva", "529.982.247-25").await;

    let response = ctx
        .send_json(
            Method::POST,
            "/admin/api/user",
            &json!({ "name": "Outra Pessoa", "cpf": "52998224725", "password": "secret1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json()["success"], false);
    assert_eq!(response.json()["message"], "Este CPF já está cadastrado!");
}

#[tokio::test]
async fn test_create_validation_errors_are_400() {
    let mut ctx = admin_context().await;

    for body in [
        json!({ "name": "", "cpf": "52998224725", "password": "secret1" }),
        json!({ "name": "Maria Silva", "cpf": "52998224725" }),
        json!({ "name": "Maria Silva", "cpf": "52998224725", "password": "12345" }),
        json!({ "name": "Maria Silva", "cpf": "52998224726", "password": "secret1" }),
    ] {
        let response = ctx
            .send_json(Method::POST, "/admin/api/user", &body)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.json()["success"], false);
    }

    let response = ctx.get_json("/admin/api/users").await;
    assert_eq!(response.json().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let mut ctx = admin_context().await;
    ctx.create_ambassador("Ana Lima", "111.444.777-35").await;
    ctx.create_ambassador("Maria Silva", "529.982.247-25").await;

    let response = ctx.get_json("/admin/api/users").await;
    assert_eq!(response.status, StatusCode::OK);
    let list = response.json();
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Maria Silva", "Ana Lima"]);
}

#[tokio::test]
async fn test_get_ambassador() {
    let mut ctx = admin_context().await;
    let ambassador = ctx.create_ambassador("Maria Silva", "529.982.247-25").await;

    let response = ctx
        .get_json(&format!("/admin/api/user/{}", ambassador.id))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["coupon"], ambassador.coupon.to_string());

    let response = ctx.get_json("/admin/api/user/9999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_ambassador() {
    let mut ctx = admin_context().await;
    let ambassador = ctx.create_ambassador("Maria Silva", "529.982.247-25").await;
    let uri = format!("/admin/api/user/{}", ambassador.id);

    let response = ctx
        .send_json(
            Method::PUT,
            &uri,
            &json!({ "total_sales": "15000.50", "total_lists": 4, "goal": 60000 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let user = &response.json()["user"];
    assert_eq!(user["total_sales"], 15000.5);
    assert_eq!(user["total_lists"], 4);
    assert_eq!(user["goal"], 60000.0);

    // Fields left out keep their values
    let response = ctx
        .send_json(Method::PUT, &uri, &json!({ "total_lists": 5 }))
        .await;
    let user = &response.json()["user"];
    assert_eq!(user["total_sales"], 15000.5);
    assert_eq!(user["total_lists"], 5);
}

#[tokio::test]
async fn test_update_rejects_invalid_values() {
    let mut ctx = admin_context().await;
    let ambassador = ctx.create_ambassador("Maria Silva", "529.982.247-25").await;
    let uri = format!("/admin/api/user/{}", ambassador.id);

    for body in [
        json!({ "total_sales": -1 }),
        json!({ "total_lists": -2 }),
        json!({ "goal": 0 }),
    ] {
        let response = ctx.send_json(Method::PUT, &uri, &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
    }

    let response = ctx.get_json(&uri).await;
    let user = response.json();
    assert_eq!(user["total_sales"], 0.0);
    assert_eq!(user["goal"], 50000.0);
}

#[tokio::test]
async fn test_update_missing_is_404() {
    let mut ctx = admin_context().await;

    let response = ctx
        .send_json(
            Method::PUT,
            "/admin/api/user/9999",
            &json!({ "total_sales": 10 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_ambassador() {
    let mut ctx = admin_context().await;
    let ambassador = ctx.create_ambassador("Maria Silva", "529.982.247-25").await;
    let uri = format!("/admin/api/user/{}", ambassador.id);

    let response = ctx.send_json(Method::DELETE, &uri, &json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["success"], true);
    assert_eq!(response.json()["message"], "Usuário excluído com sucesso!");

    let response = ctx.send_json(Method::DELETE, &uri, &json!({})).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_shows_stats() {
    let mut ctx = admin_context().await;
    let maria = ctx.create_ambassador("Maria Silva", "529.982.247-25").await;
    let ana = ctx.create_ambassador("Ana Lima", "111.444.777-35").await;
    ctx.set_sales(maria.id, "1000").await;
    ctx.set_sales(ana.id, "234.5").await;

    let response = ctx.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("1.234,50"));
    assert!(response.body.contains("Maria Silva"));
    assert!(response.body.contains("Ana Lima"));
}

#[tokio::test]
async fn test_update_rejects_out_of_range_values() {
    let mut ctx = admin_context().await;
    let ambassador = ctx.create_ambassador("Maria Silva", "529.982.247-25").await;
    let uri = format!("/admin/api/user/{}", ambassador.id);

    for (body, message) in [
        (
            json!({ "total_sales": "1000000000000000000000000000" }),
            "O total de vendas é grande demais!",
        ),
        (
            json!({ "total_lists": 9_223_372_036_854_775_807_i64 }),
            "O total de listas é grande demais!",
        ),
        (json!({ "goal": "10000000000000" }), "A meta é grande demais!"),
    ] {
        let response = ctx.send_json(Method::PUT, &uri, &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.json()["message"], message);
    }

    let user = ctx.get_json(&uri).await.json();
    assert_eq!(user["total_sales"], 0.0);
    assert_eq!(user["total_lists"], 0);
}

#[tokio::test]
async fn test_largest_accepted_values_render_everywhere() {
    let mut ctx = admin_context().await;
    let maria = ctx.create_ambassador("Maria Silva", "529.982.247-25").await;
    let ana = ctx.create_ambassador("Ana Lima", "111.444.777-35").await;

    for ambassador in [&maria, &ana] {
        let response = ctx
            .send_json(
                Method::PUT,
                &format!("/admin/api/user/{}", ambassador.id),
                &json!({
                    "total_sales": "1000000000000",
                    "total_lists": 1_000_000_000,
                    "goal": "1000000000000",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let response = ctx.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("2.000.000.000.000,00"));
    assert!(response.body.contains("2000000000"));

    ctx.login_ambassador("52998224725").await;
    let response = ctx.get("/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("100,0%"));
}

async fn corrupt_totals(ctx: &TestContext, ambassador: &Ambassador) {
    sqlx::query("UPDATE ambassador SET total_sales = ?1, total_lists = ?2 WHERE id = ?3")
        .bind(Decimal::MAX.to_string())
        .bind(i64::MAX)
        .bind(ambassador.id.as_i64())
        .execute(&ctx.pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_dashboards_survive_extreme_stored_totals() {
    let mut ctx = admin_context().await;
    let maria = ctx.create_ambassador("Maria Silva", "529.982.247-25").await;
    corrupt_totals(&ctx, &maria).await;

    // One extreme row still fits every total.
    let response = ctx.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Maria Silva"));

    ctx.login_ambassador("52998224725").await;
    let response = ctx.get("/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("100,0%"));

    let response = ctx.get_json("/api/ranking/top3").await;
    assert_eq!(response.status, StatusCode::OK);

    // Two of them overflow the roster totals: an error page, not a crash.
    let ana = ctx.create_ambassador("Ana Lima", "111.444.777-35").await;
    corrupt_totals(&ctx, &ana).await;
    let response = ctx.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["message"], "Erro interno do servidor!");

    let response = ctx.get("/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
}
