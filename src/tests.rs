#[cfg(test)]
mod integration_tests {
    use crate::schemas::{ApiResponse, ErrorResponse};
    use crate::test_utils::test_utils::{init_test_tracing, setup_test_app};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Datelike, NaiveDate, Utc};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::str::FromStr;

    async fn test_server() -> (TestServer, crate::schemas::AppState) {
        let (app, state) = setup_test_app().await;
        (TestServer::new(app).unwrap(), state)
    }

    /// Reads a decimal field whether it was serialized as a string or a number.
    fn dec(value: &Value) -> Decimal {
        match value {
            Value::String(s) => Decimal::from_str(s).unwrap(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
            other => panic!("not a decimal: {}", other),
        }
    }

    async fn create_user(server: &TestServer, email: &str) -> i64 {
        let response = server
            .post("/api/v1/users")
            .json(&json!({ "name": "Test User", "email": email }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap()
    }

    async fn category_id(server: &TestServer, user_id: i64, name: &str) -> i64 {
        let response = server
            .get(&format!("/api/v1/users/{}/categories", user_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<Value>> = response.json();
        body.data
            .iter()
            .find(|c| c["name"] == name)
            .and_then(|c| c["id"].as_i64())
            .unwrap()
    }

    async fn create_transaction(
        server: &TestServer,
        user_id: i64,
        category_id: i64,
        amount: &str,
        kind: &str,
        date: NaiveDate,
    ) -> Value {
        let response = server
            .post(&format!("/api/v1/users/{}/transactions", user_id))
            .json(&json!({
                "category_id": category_id,
                "amount": amount,
                "description": null,
                "date": date,
                "type": kind,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data
    }

    #[tokio::test]
    async fn test_health_check() {
        let _guard = init_test_tracing();
        let (server, _) = test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
        assert_eq!(body["currency"], "USD");
    }

    #[tokio::test]
    async fn test_create_user_seeds_default_categories() {
        let (server, _) = test_server().await;

        let response = server
            .post("/api/v1/users")
            .json(&json!({ "name": "Alice", "email": "  Alice@Example.com " }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "User created successfully");
        assert_eq!(body.data["email"], "alice@example.com");
        let user_id = body.data["id"].as_i64().unwrap();

        let response = server.get(&format!("/api/v1/users/{}", user_id)).await;
        response.assert_status(StatusCode::OK);

        let response = server
            .get(&format!("/api/v1/users/{}/categories", user_id))
            .await;
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 12);
        assert!(body.data.iter().any(|c| c["name"] == "Food & Dining"));
        assert!(body.data.iter().any(|c| c["name"] == "Salary"));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflict() {
        let (server, _) = test_server().await;
        create_user(&server, "bob@example.com").await;

        let response = server
            .post("/api/v1/users")
            .json(&json!({ "name": "Bob again", "email": "BOB@example.com" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "CONFLICT");
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_unknown_user_not_found() {
        let (server, _) = test_server().await;

        let response = server.get("/api/v1/users/9999").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_category_crud_and_delete_guard() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "carol@example.com").await;

        let response = server
            .post(&format!("/api/v1/users/{}/categories", user_id))
            .json(&json!({ "name": "Pets", "color": "#12AB34" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["icon"], "📌");
        let pets_id = body.data["id"].as_i64().unwrap();

        let response = server
            .post(&format!("/api/v1/users/{}/categories", user_id))
            .json(&json!({ "name": "Bad", "color": "blue" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put(&format!("/api/v1/users/{}/categories/{}", user_id, pets_id))
            .json(&json!({ "name": "Animals" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["name"], "Animals");
        assert_eq!(body.data["color"], "#12AB34");

        // Referenced by a transaction: cannot be deleted
        create_transaction(
            &server,
            user_id,
            pets_id,
            "25.00",
            "expense",
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        )
        .await;
        let response = server
            .delete(&format!("/api/v1/users/{}/categories/{}", user_id, pets_id))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let unused = category_id(&server, user_id, "Miscellaneous").await;
        let response = server
            .delete(&format!("/api/v1/users/{}/categories/{}", user_id, unused))
            .await;
        response.assert_status(StatusCode::OK);
        let response = server
            .get(&format!("/api/v1/users/{}/categories/{}", user_id, unused))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transactions_crud_and_filters() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "dave@example.com").await;
        let food = category_id(&server, user_id, "Food & Dining").await;
        let salary = category_id(&server, user_id, "Salary").await;

        let lunch = create_transaction(
            &server,
            user_id,
            food,
            "12.50",
            "expense",
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        )
        .await;
        assert_eq!(lunch["type"], "expense");
        assert_eq!(dec(&lunch["amount"]), Decimal::new(1250, 2));
        create_transaction(
            &server,
            user_id,
            salary,
            "3000",
            "income",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
        .await;

        let response = server
            .get(&format!("/api/v1/users/{}/transactions", user_id))
            .await;
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 2);
        // Newest first
        assert_eq!(body.data[0]["date"], "2024-05-02");

        let response = server
            .get(&format!("/api/v1/users/{}/transactions?type=income", user_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["type"], "income");

        let response = server
            .get(&format!("/api/v1/users/{}/transactions?limit=5000", user_id))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let lunch_id = lunch["id"].as_i64().unwrap();
        let response = server
            .put(&format!("/api/v1/users/{}/transactions/{}", user_id, lunch_id))
            .json(&json!({ "amount": "15.00", "description": "Team lunch" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(dec(&body.data["amount"]), Decimal::new(1500, 2));
        assert_eq!(body.data["description"], "Team lunch");

        let response = server
            .delete(&format!("/api/v1/users/{}/transactions/{}", user_id, lunch_id))
            .await;
        response.assert_status(StatusCode::OK);
        let response = server
            .get(&format!("/api/v1/users/{}/transactions/{}", user_id, lunch_id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transaction_validation() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "erin@example.com").await;
        let other_id = create_user(&server, "frank@example.com").await;
        let food = category_id(&server, user_id, "Food & Dining").await;
        let foreign = category_id(&server, other_id, "Food & Dining").await;
        let path = format!("/api/v1/users/{}/transactions", user_id);

        let response = server
            .post(&path)
            .json(&json!({ "category_id": food, "amount": "10", "date": "2024-05-01", "type": "refund" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_ERROR");

        let response = server
            .post(&path)
            .json(&json!({ "category_id": food, "amount": "0", "date": "2024-05-01", "type": "expense" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Amounts must fit the money column
        for amount in ["0.00001", "1000000000000", "0.0000000000000000000000001"] {
            let response = server
                .post(&path)
                .json(&json!({ "category_id": food, "amount": amount, "date": "2024-05-01", "type": "expense" }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: ErrorResponse = response.json();
            assert_eq!(body.code, "VALIDATION_ERROR", "amount {}", amount);
        }

        let response = server
            .post(&path)
            .json(&json!({ "category_id": foreign, "amount": "10", "date": "2024-05-01", "type": "expense" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_budget_overlap_rejected() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "grace@example.com").await;
        let food = category_id(&server, user_id, "Food & Dining").await;
        let path = format!("/api/v1/users/{}/budgets", user_id);

        let response = server
            .post(&path)
            .json(&json!({
                "category_id": food,
                "amount": "500.00",
                "start_date": "2024-05-01",
                "end_date": "2024-05-31",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(dec(&body.data["alert_threshold"]), Decimal::new(8, 1));
        assert_eq!(body.data["alert_enabled"], true);

        let response = server
            .post(&path)
            .json(&json!({
                "category_id": food,
                "amount": "300.00",
                "start_date": "2024-05-15",
                "end_date": "2024-06-15",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "CONFLICT");

        // Adjacent period is fine
        let response = server
            .post(&path)
            .json(&json!({
                "category_id": food,
                "amount": "300.00",
                "start_date": "2024-06-01",
                "end_date": "2024-06-30",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server.get(&path).await;
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 2);
        let may = body
            .data
            .iter()
            .find(|b| b["start_date"] == "2024-05-01")
            .unwrap();
        assert_eq!(dec(&may["amount"]), Decimal::new(50000, 2));
    }

    #[tokio::test]
    async fn test_budget_validation() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "heidi@example.com").await;
        let food = category_id(&server, user_id, "Food & Dining").await;
        let path = format!("/api/v1/users/{}/budgets", user_id);

        let response = server
            .post(&path)
            .json(&json!({
                "category_id": food,
                "amount": "100",
                "start_date": "2024-05-31",
                "end_date": "2024-05-01",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post(&path)
            .json(&json!({
                "category_id": food,
                "amount": "100",
                "start_date": "2024-05-01",
                "end_date": "2024-05-31",
                "alert_threshold": "1.5",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // A vanishing amount would make every percentage overflow
        let response = server
            .post(&path)
            .json(&json!({
                "category_id": food,
                "amount": "0.0000000000000000000000001",
                "start_date": "2024-05-01",
                "end_date": "2024-05-31",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_ERROR");

        let response = server
            .post(&path)
            .json(&json!({
                "category_id": food,
                "amount": "1000000000000",
                "start_date": "2024-05-01",
                "end_date": "2024-05-31",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_budget_reports_current_spending() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "ivan@example.com").await;
        let food = category_id(&server, user_id, "Food & Dining").await;

        let response = server
            .post(&format!("/api/v1/users/{}/budgets", user_id))
            .json(&json!({
                "category_id": food,
                "amount": "500.00",
                "start_date": "2024-05-01",
                "end_date": "2024-05-31",
            }))
            .await;
        let body: ApiResponse<Value> = response.json();
        let budget_id = body.data["id"].as_i64().unwrap();

        create_transaction(
            &server,
            user_id,
            food,
            "120.00",
            "expense",
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        )
        .await;
        // Outside the period
        create_transaction(
            &server,
            user_id,
            food,
            "80.00",
            "expense",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
        .await;

        let response = server
            .get(&format!("/api/v1/users/{}/budgets/{}", user_id, budget_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["category_name"], "Food & Dining");
        assert_eq!(dec(&body.data["current_spending"]), Decimal::new(120, 0));
        assert_eq!(dec(&body.data["remaining"]), Decimal::new(380, 0));
        assert_eq!(dec(&body.data["percentage_used"]), Decimal::new(24, 0));

        let response = server
            .put(&format!("/api/v1/users/{}/budgets/{}", user_id, budget_id))
            .json(&json!({ "end_date": "2024-06-30" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(dec(&body.data["current_spending"]), Decimal::new(200, 0));

        let response = server
            .delete(&format!("/api/v1/users/{}/budgets/{}", user_id, budget_id))
            .await;
        response.assert_status(StatusCode::OK);
        let response = server
            .get(&format!("/api/v1/users/{}/budgets/{}", user_id, budget_id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_budget_alert_notification_flow() {
        let (server, state) = test_server().await;
        let user_id = create_user(&server, "judy@example.com").await;
        let food = category_id(&server, user_id, "Food & Dining").await;

        let now = Utc::now();
        let today = now.date_naive();
        let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap();
        let response = server
            .post(&format!("/api/v1/users/{}/budgets", user_id))
            .json(&json!({
                "category_id": food,
                "amount": "500.00",
                "start_date": start,
                "end_date": today,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        create_transaction(&server, user_id, food, "450.00", "expense", today).await;

        let report = compute::jobs::check_budget_alerts(&state.db, today, &state.currency, now)
            .await
            .unwrap();
        assert_eq!(report.emitted, 1);
        // A second sweep does not repeat the alert
        let report = compute::jobs::check_budget_alerts(&state.db, today, &state.currency, now)
            .await
            .unwrap();
        assert_eq!(report.emitted, 0);

        let path = format!("/api/v1/users/{}/notifications", user_id);
        let response = server.get(&path).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["unread_count"], 1);
        let notifications = body.data["notifications"].as_array().unwrap();
        assert_eq!(notifications.len(), 1);
        let alert = &notifications[0];
        assert_eq!(alert["type"], "budget_alert");
        assert_eq!(alert["title"], "Budget Alert");
        assert_eq!(alert["is_read"], false);
        assert_eq!(alert["payload"]["kind"], "budget_alert");
        assert_eq!(dec(&alert["payload"]["amount_remaining"]), Decimal::new(50, 0));
        assert_eq!(dec(&alert["payload"]["percentage"]), Decimal::new(90, 0));
        let notification_id = alert["id"].as_i64().unwrap();

        let response = server
            .put(&format!("{}/{}/read", path, notification_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["is_read"], true);

        let response = server.get(&format!("{}?unread_only=true", path)).await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["unread_count"], 0);
        assert!(body.data["notifications"].as_array().unwrap().is_empty());

        let response = server.put(&format!("{}/read-all", path)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["updated"], 0);

        let response = server
            .delete(&format!("{}/{}", path, notification_id))
            .await;
        response.assert_status(StatusCode::OK);
        let response = server
            .delete(&format!("{}/{}", path, notification_id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notifications_are_scoped_to_user() {
        let (server, state) = test_server().await;
        let owner = create_user(&server, "kim@example.com").await;
        let stranger = create_user(&server, "leo@example.com").await;
        let food = category_id(&server, owner, "Food & Dining").await;

        let now = Utc::now();
        let today = now.date_naive();
        server
            .post(&format!("/api/v1/users/{}/budgets", owner))
            .json(&json!({
                "category_id": food,
                "amount": "100.00",
                "start_date": today,
                "end_date": today,
            }))
            .await
            .assert_status(StatusCode::CREATED);
        create_transaction(&server, owner, food, "150.00", "expense", today).await;
        compute::jobs::check_budget_alerts(&state.db, today, &state.currency, now)
            .await
            .unwrap();

        let response = server
            .get(&format!("/api/v1/users/{}/notifications", owner))
            .await;
        let body: ApiResponse<Value> = response.json();
        let id = body.data["notifications"][0]["id"].as_i64().unwrap();
        assert!(body.data["notifications"][0]["message"]
            .as_str()
            .unwrap()
            .contains("over budget"));

        let response = server
            .put(&format!("/api/v1/users/{}/notifications/{}/read", stranger, id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_breakdown_with_no_expenses() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "mia@example.com").await;

        let response = server
            .get(&format!(
                "/api/v1/users/{}/reports/category-breakdown?start_date=2024-05-01&end_date=2024-05-31",
                user_id
            ))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(dec(&body.data["total_expense"]), Decimal::ZERO);
        let items = body.data["items"].as_array().unwrap();
        assert_eq!(items.len(), 12);
        assert!(items.iter().all(|item| dec(&item["percentage"]).is_zero()));
    }

    #[tokio::test]
    async fn test_reports_endpoints() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "nina@example.com").await;
        let food = category_id(&server, user_id, "Food & Dining").await;
        let salary = category_id(&server, user_id, "Salary").await;

        create_transaction(
            &server,
            user_id,
            salary,
            "1000.00",
            "income",
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
        .await;
        create_transaction(
            &server,
            user_id,
            food,
            "250.00",
            "expense",
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        )
        .await;

        let response = server
            .get(&format!(
                "/api/v1/users/{}/reports/totals?start_date=2024-02-01&end_date=2024-02-29",
                user_id
            ))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(dec(&body.data["total_income"]), Decimal::new(1000, 0));
        assert_eq!(dec(&body.data["total_expense"]), Decimal::new(250, 0));
        assert_eq!(dec(&body.data["net"]), Decimal::new(750, 0));
        assert_eq!(body.data["transaction_count"], 2);

        let response = server
            .get(&format!(
                "/api/v1/users/{}/reports/totals?start_date=2024-03-01&end_date=2024-02-01",
                user_id
            ))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .get(&format!("/api/v1/users/{}/reports/daily?year=2024&month=2", user_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 29);
        assert_eq!(dec(&body.data[28]["expense"]), Decimal::new(250, 0));

        let response = server
            .get(&format!("/api/v1/users/{}/reports/daily?year=2024&month=13", user_id))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .get(&format!("/api/v1/users/{}/reports/monthly", user_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 6);
        let this_month = Utc::now().date_naive();
        assert_eq!(
            body.data[5]["month"],
            format!("{:04}-{:02}", this_month.year(), this_month.month())
        );

        let response = server
            .get(&format!("/api/v1/users/{}/reports/monthly?months=0", user_id))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard() {
        let (server, _) = test_server().await;
        let user_id = create_user(&server, "otto@example.com").await;
        let food = category_id(&server, user_id, "Food & Dining").await;
        let today = Utc::now().date_naive();

        for _ in 0..7 {
            create_transaction(&server, user_id, food, "10.00", "expense", today).await;
        }

        let response = server
            .get(&format!("/api/v1/users/{}/dashboard", user_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(
            body.data["month"],
            format!("{:04}-{:02}", today.year(), today.month())
        );
        assert_eq!(dec(&body.data["current"]["total_expense"]), Decimal::new(70, 0));
        assert_eq!(dec(&body.data["balance"]), Decimal::new(-70, 0));
        assert_eq!(body.data["expense_trend"]["status"], "no_previous_data");
        assert_eq!(body.data["recent_transactions"].as_array().unwrap().len(), 5);

        let response = server
            .get(&format!("/api/v1/users/{}/dashboard?recent=2", user_id))
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["recent_transactions"].as_array().unwrap().len(), 2);
    }
}
