use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn admin_creates_and_public_lists_categories() {
    let app = TestApp::spawn().await;

    let science = app.create_category("Science").await;
    let arts = app.create_category("Arts").await;
    assert_ne!(science, arts);

    let res = app.get_without_token(routes::CATEGORIES).await;
    assert_eq!(res.status, 200);
    let names: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Arts", "Science"]);
}

#[tokio::test]
async fn duplicate_and_blank_names_are_rejected() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    app.create_category("Science").await;

    let res = app
        .post_with_token(routes::ADMIN_CATEGORIES, &json!({ "name": " Science " }), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .post_with_token(routes::ADMIN_CATEGORIES, &json!({ "name": "   " }), &token)
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::spawn().await;

    let res = app
        .post_with_token(
            routes::ADMIN_CATEGORIES,
            &json!({ "title": "wrong field" }),
            &app.admin_token(),
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}
