use common::pdf::fixtures::minimal_pdf;
use magazine_server::entity::{file_upload, magazine};
use sea_orm::{
    ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, Statement, TransactionTrait,
};
use serde_json::json;

use crate::common::{TestApp, Upload, routes};

mod orphans {
    use super::*;

    #[tokio::test]
    async fn failed_metadata_write_leaves_no_blob() {
        let app = TestApp::spawn().await;
        let category_id = app.create_category("Science").await;

        // Any insert into the metadata table now fails inside the transaction.
        app.db
            .execute_raw(Statement::from_string(
                DbBackend::Sqlite,
                "DROP TABLE file_upload".to_string(),
            ))
            .await
            .unwrap();

        let res = app
            .create_magazine(
                "Doomed",
                category_id,
                "PUBLISHED",
                Upload::pdf("report.pdf", minimal_pdf(2, 256)),
            )
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["error"], "internal error");
        assert!(app.stored_blobs().is_empty());
        assert_eq!(magazine::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stalled_metadata_write_times_out_and_leaves_no_blob() {
        let app =
            TestApp::spawn_with(|config| config.storage.transaction_timeout_secs = 1).await;
        let category_id = app.create_category("Science").await;

        // Hold the SQLite write lock so the upload transaction cannot finish.
        let lock = app.db.begin().await.unwrap();
        lock.execute_raw(Statement::from_string(
            DbBackend::Sqlite,
            "UPDATE category SET name = name".to_string(),
        ))
        .await
        .unwrap();

        let res = app
            .create_magazine(
                "Stalled",
                category_id,
                "PUBLISHED",
                Upload::pdf("report.pdf", minimal_pdf(1, 0)),
            )
            .await;
        lock.rollback().await.unwrap();

        assert_eq!(res.status, 500);
        assert_eq!(res.body["error"], "internal error");
        assert!(app.stored_blobs().is_empty());
        assert_eq!(file_upload::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(magazine::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn temp_dir_is_empty_after_uploads() {
        let app = TestApp::spawn().await;
        app.seed_magazine("Clean", minimal_pdf(1, 0)).await;

        let leftovers = std::fs::read_dir(app.storage_root.join(".tmp"))
            .unwrap()
            .count();
        assert_eq!(leftovers, 0);
    }
}

mod sweep {
    use super::*;

    #[tokio::test]
    async fn sweep_removes_unlinked_files_and_stray_blobs() {
        let app = TestApp::spawn_with(|config| config.storage.orphan_grace_secs = 0).await;
        let token = app.admin_token();
        let id = app.seed_magazine("Swept", minimal_pdf(1, 0)).await;

        let current = minimal_pdf(2, 64);
        let res = app
            .post_multipart(
                &routes::attach_file(&id),
                &[],
                Some(Upload::pdf("current.pdf", current.clone())),
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let stray = app
            .storage_root
            .join("0b7c2f9e-5d41-4e2a-9f3b-6c8d1e0a4b57.pdf");
        std::fs::write(&stray, b"%PDF-stray").unwrap();
        assert_eq!(app.stored_blobs().len(), 3);

        let res = app.post_with_token(routes::SWEEP, &json!({}), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["scanned"], 3);
        assert_eq!(res.body["removedBlobs"], 2);
        assert_eq!(res.body["removedRecords"], 1);

        assert_eq!(app.stored_blobs().len(), 1);
        assert!(!stray.exists());
        assert_eq!(file_upload::Entity::find().count(&app.db).await.unwrap(), 1);

        let served = app.fetch_pdf(&id, None).await;
        assert_eq!(served.status, 200);
        assert_eq!(served.bytes, current);
    }

    #[tokio::test]
    async fn sweep_respects_the_grace_period() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let id = app.seed_magazine("Young", minimal_pdf(1, 0)).await;
        app.post_multipart(
            &routes::attach_file(&id),
            &[],
            Some(Upload::pdf("again.pdf", minimal_pdf(1, 32))),
            Some(&token),
        )
        .await;

        let res = app.post_with_token(routes::SWEEP, &json!({}), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["scanned"], 2);
        assert_eq!(res.body["removedBlobs"], 0);
        assert_eq!(res.body["removedRecords"], 0);
        assert_eq!(app.stored_blobs().len(), 2);
    }

    #[tokio::test]
    async fn sweep_requires_admin() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(routes::SWEEP, &json!({}), &app.user_token())
            .await;

        assert_eq!(res.status, 401);
    }
}

#[tokio::test]
async fn concurrent_attaches_leave_one_linked_file() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    let id = app.seed_magazine("Contested", minimal_pdf(1, 0)).await;

    let first = minimal_pdf(2, 1000);
    let second = minimal_pdf(3, 2000);
    let path = routes::attach_file(&id);

    let (a, b) = tokio::join!(
        app.post_multipart(
            &path,
            &[],
            Some(Upload::pdf("a.pdf", first.clone())),
            Some(&token),
        ),
        app.post_multipart(
            &path,
            &[],
            Some(Upload::pdf("b.pdf", second.clone())),
            Some(&token),
        ),
    );

    // SQLite may refuse one writer outright; that loser must clean up after itself.
    for res in [&a, &b] {
        assert!(res.status == 200 || res.status == 500, "{}", res.text);
    }
    let successes = [&a, &b].iter().filter(|r| r.status == 200).count();
    assert!(successes >= 1);

    // Seeded blob plus one per committed attach.
    assert_eq!(app.stored_blobs().len(), 1 + successes);

    let served = app.fetch_pdf(&id, None).await;
    assert_eq!(served.status, 200);
    let candidates: Vec<&Vec<u8>> = [(&a, &first), (&b, &second)]
        .into_iter()
        .filter(|(res, _)| res.status == 200)
        .map(|(_, bytes)| bytes)
        .collect();
    assert!(candidates.contains(&&served.bytes));

    let linked: Vec<_> = magazine::Entity::find()
        .all(&app.db)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|m| m.file_upload_id)
        .collect();
    assert_eq!(linked.len(), 1);
}
