use common::pdf::fixtures::minimal_pdf;
use magazine_server::entity::file_upload;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::common::{TestApp, Upload, routes};

#[tokio::test]
async fn preview_reports_page_count_without_storing() {
    let app = TestApp::spawn().await;

    let res = app
        .post_multipart(
            routes::PREVIEW,
            &[],
            Some(Upload::pdf("draft.pdf", minimal_pdf(7, 128))),
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pageCount"], 7);
    assert_eq!(res.body["detectedType"], "application/pdf");
    assert_eq!(res.body["filename"], "draft.pdf");

    assert!(app.stored_blobs().is_empty());
    assert_eq!(file_upload::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn preview_applies_upload_checks() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .post_multipart(routes::PREVIEW, &[], None, Some(&token))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error"], "file required");

    let res = app
        .post_multipart(
            routes::PREVIEW,
            &[],
            Some(Upload::pdf("notes.txt", b"plain text".to_vec()).with_mime("text/plain")),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error"], "unsupported type");

    let res = app
        .post_multipart(
            routes::PREVIEW,
            &[],
            Some(Upload::pdf("broken.pdf", b"%PDF-1.5\ngarbage".to_vec())),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, 422);
    assert_eq!(res.body["code"], "PDF_PARSE_ERROR");
}

#[tokio::test]
async fn preview_requires_admin() {
    let app = TestApp::spawn().await;

    let res = app
        .post_multipart(
            routes::PREVIEW,
            &[],
            Some(Upload::pdf("draft.pdf", minimal_pdf(1, 0))),
            None,
        )
        .await;

    assert_eq!(res.status, 401);
}
