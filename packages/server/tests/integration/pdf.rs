use chrono::Utc;
use common::pdf::fixtures::minimal_pdf;
use magazine_server::entity::{file_upload, magazine};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbBackend, EntityTrait, Set, Statement};
use uuid::Uuid;

use crate::common::{TestApp, Upload, pdf_of_size, routes};

mod full_reads {
    use super::*;

    #[tokio::test]
    async fn whole_file_without_range() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(2, 4096);
        let id = app.seed_magazine("Whole", pdf.clone()).await;

        let res = app.fetch_pdf(&id, None).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, pdf);
        assert_eq!(res.header("content-type"), Some("application/pdf"));
        assert_eq!(
            res.header("content-length"),
            Some(pdf.len().to_string().as_str())
        );
        assert_eq!(res.header("accept-ranges"), Some("bytes"));
        assert_eq!(
            res.header("content-disposition"),
            Some("inline; filename=\"report.pdf\"; filename*=UTF-8''report.pdf")
        );
        assert_eq!(res.header("cache-control"), Some("private, max-age=3600"));
        assert_eq!(res.header("access-control-allow-origin"), Some("*"));
        assert!(
            res.header("access-control-expose-headers")
                .unwrap()
                .contains("Content-Range")
        );
        assert!(res.header("content-range").is_none());
    }

    #[tokio::test]
    async fn other_range_units_are_ignored() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(1, 100);
        let id = app.seed_magazine("Units", pdf.clone()).await;

        let res = app.fetch_pdf(&id, Some("items=0-3")).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, pdf);
    }

    #[tokio::test]
    async fn content_type_does_not_follow_the_stored_name() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(1, 0);
        let id = app.seed_magazine("Relabelled", pdf.clone()).await;

        file_upload::Entity::update_many()
            .col_expr(file_upload::Column::FileName, Expr::value("evil.html"))
            .exec(&app.db)
            .await
            .unwrap();

        let res = app.fetch_pdf(&id, None).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.header("content-type"), Some("application/pdf"));
        assert_eq!(res.bytes, pdf);
    }

    #[tokio::test]
    async fn display_name_is_percent_encoded() {
        let app = TestApp::spawn().await;
        let category_id = app.create_category("Science").await;
        let res = app
            .create_magazine(
                "Encoded",
                category_id,
                "PUBLISHED",
                Upload::pdf("my report (v2).pdf", minimal_pdf(1, 0)),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let served = app.fetch_pdf(&res.uuid(), None).await;

        assert_eq!(
            served.header("content-disposition"),
            Some(
                "inline; filename=\"my%20report%20(v2).pdf\"; \
                 filename*=UTF-8''my%20report%20(v2).pdf"
            )
        );
    }
}

mod ranges {
    use super::*;

    #[tokio::test]
    async fn first_kilobyte_of_uploaded_report() {
        let app = TestApp::spawn().await;
        let pdf = pdf_of_size(3, 20 * 1024);
        let size = pdf.len();
        let id = app.seed_magazine("Report", pdf.clone()).await;

        let res = app.fetch_pdf(&id, Some("bytes=0-1023")).await;

        assert_eq!(res.status, 206);
        assert_eq!(res.header("content-length"), Some("1024"));
        assert_eq!(
            res.header("content-range"),
            Some(format!("bytes 0-1023/{size}").as_str())
        );
        assert_eq!(res.header("accept-ranges"), Some("bytes"));
        assert_eq!(res.bytes, &pdf[..1024]);
    }

    #[tokio::test]
    async fn middle_slice_is_exact() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(1, 2048);
        let id = app.seed_magazine("Slice", pdf.clone()).await;

        let res = app.fetch_pdf(&id, Some("bytes=100-199")).await;

        assert_eq!(res.status, 206);
        assert_eq!(res.bytes, &pdf[100..200]);
    }

    #[tokio::test]
    async fn open_range_from_zero_is_a_partial_full_read() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(1, 512);
        let size = pdf.len();
        let id = app.seed_magazine("Open", pdf.clone()).await;

        let res = app.fetch_pdf(&id, Some("bytes=0-")).await;

        assert_eq!(res.status, 206);
        assert_eq!(res.bytes, pdf);
        assert_eq!(
            res.header("content-range"),
            Some(format!("bytes 0-{}/{size}", size - 1).as_str())
        );
    }

    #[tokio::test]
    async fn end_past_the_file_is_clamped() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(1, 64);
        let size = pdf.len();
        let id = app.seed_magazine("Clamp", pdf.clone()).await;

        let res = app
            .fetch_pdf(&id, Some(&format!("bytes={}-{}", size - 10, size + 500)))
            .await;

        assert_eq!(res.status, 206);
        assert_eq!(res.bytes, &pdf[size - 10..]);
        assert_eq!(res.header("content-length"), Some("10"));
    }

    #[tokio::test]
    async fn last_byte_is_served() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(1, 0);
        let size = pdf.len();
        let id = app.seed_magazine("Last", pdf.clone()).await;

        let res = app
            .fetch_pdf(&id, Some(&format!("bytes={}-", size - 1)))
            .await;

        assert_eq!(res.status, 206);
        assert_eq!(res.bytes, vec![pdf[size - 1]]);
    }

    #[tokio::test]
    async fn start_at_size_is_not_satisfiable() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(1, 0);
        let size = pdf.len();
        let id = app.seed_magazine("Past end", pdf).await;

        let res = app.fetch_pdf(&id, Some(&format!("bytes={size}-"))).await;

        assert_eq!(res.status, 416);
        assert_eq!(
            res.header("content-range"),
            Some(format!("bytes */{size}").as_str())
        );
        assert!(res.bytes.is_empty());
    }

    #[tokio::test]
    async fn unsupported_range_forms_are_not_satisfiable() {
        let app = TestApp::spawn().await;
        let pdf = minimal_pdf(1, 0);
        let size = pdf.len();
        let id = app.seed_magazine("Forms", pdf).await;

        for range in ["bytes=-500", "bytes=0-10,20-30", "bytes=abc-", "bytes=50-10"] {
            let res = app.fetch_pdf(&id, Some(range)).await;
            assert_eq!(res.status, 416, "{range}");
            assert_eq!(
                res.header("content-range"),
                Some(format!("bytes */{size}").as_str()),
                "{range}"
            );
        }
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn unknown_magazine_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .fetch_pdf("0193a1b2-0000-7000-8000-000000000000", None)
            .await;
        assert_eq!(res.status, 404);

        let res = app.fetch_pdf("../../etc/passwd", None).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn magazine_without_file() {
        let app = TestApp::spawn().await;
        let id = Uuid::now_v7();
        magazine::ActiveModel {
            id: Set(id),
            title: Set("Bare".into()),
            author: Set("Editorial Board".into()),
            description: Set(None),
            cover_image_url: Set(None),
            status: Set(magazine::STATUS_PUBLISHED.into()),
            published_at: Set(None),
            read_count: Set(0),
            file_upload_id: Set(None),
            uploaded_by: Set(1),
            created_at: Set(Utc::now()),
        }
        .insert(&app.db)
        .await
        .unwrap();

        let res = app
            .get_without_token(&routes::magazine_pdf(&id.to_string()))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["error"], "no file for this entity");
    }

    #[tokio::test]
    async fn missing_blob_is_a_storage_inconsistency() {
        let app = TestApp::spawn().await;
        let id = app.seed_magazine("Vanished", minimal_pdf(1, 0)).await;

        for blob in app.stored_blobs() {
            std::fs::remove_file(blob).unwrap();
        }

        let res = app
            .get_without_token(&routes::magazine_pdf(&id))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["error"], "file unavailable");
        assert_eq!(res.body["code"], "STORAGE_INCONSISTENCY");
        assert!(!res.text.contains(app.storage_root.to_str().unwrap()));
    }
}

#[tokio::test]
async fn preflight_allows_range_requests() {
    let app = TestApp::spawn().await;
    let id = app.seed_magazine("Preflight", minimal_pdf(1, 0)).await;

    let res = app
        .client
        .request(reqwest::Method::OPTIONS, app.url(&routes::magazine_pdf(&id)))
        .header("Origin", "https://reader.example.com")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "range")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let header = |name: &str| {
        res.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    assert_eq!(header("access-control-allow-origin").as_deref(), Some("*"));
    assert_eq!(
        header("access-control-allow-methods").as_deref(),
        Some("GET, OPTIONS")
    );
    assert_eq!(
        header("access-control-allow-headers").as_deref(),
        Some("Content-Type, Range")
    );
    assert!(res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn every_read_bumps_the_counter() {
    let app = TestApp::spawn().await;
    let id = app.seed_magazine("Counted", minimal_pdf(1, 0)).await;

    assert_eq!(app.fetch_pdf(&id, None).await.status, 200);
    assert_eq!(app.fetch_pdf(&id, Some("bytes=0-9")).await.status, 206);

    let res = app.get_without_token(&routes::magazine(&id)).await;
    assert_eq!(res.body["readCount"], 2);
}

#[tokio::test]
async fn failed_counter_update_still_serves_the_file() {
    let app = TestApp::spawn().await;
    let pdf = minimal_pdf(2, 128);
    let id = app.seed_magazine("Frozen", pdf.clone()).await;

    app.db
        .execute_raw(Statement::from_string(
            DbBackend::Sqlite,
            "CREATE TRIGGER freeze_read_count BEFORE UPDATE OF read_count ON magazine \
             BEGIN SELECT RAISE(ABORT, 'read count is frozen'); END"
                .to_string(),
        ))
        .await
        .unwrap();

    let res = app.fetch_pdf(&id, None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, pdf);

    let res = app.fetch_pdf(&id, Some("bytes=0-9")).await;
    assert_eq!(res.status, 206);
    assert_eq!(res.bytes, &pdf[..10]);

    let res = app.get_without_token(&routes::magazine(&id)).await;
    assert_eq!(res.body["readCount"], 0);
}
