//! End-to-end flows over HTTP against the in-memory store.

mod common;

use common::{StubJobs, TestApp, ADMIN_EMAIL, PASSWORD};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_and_missing_token() {
    let app = TestApp::spawn().await;
    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);

    let res = app.get("/api/auth/me", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["success"], false);

    let res = app.get("/api/auth/me", Some("not-a-jwt")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_api_routes_answer_with_json() {
    let app = TestApp::spawn().await;
    let res = app.get("/api/nope", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["message"], "Route not found");

    let dist = std::env::temp_dir().join(format!("job-board-client-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dist).unwrap();
    std::fs::write(dist.join("index.html"), "<html>client</html>").unwrap();
    let app = TestApp::spawn_with_client(dist).await;

    let res = app.get("/api/jobs/recruiter/nope/extra", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["success"], false);

    let page = app.get("/dashboard/jobs", None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body, "<html>client</html>");
}

#[tokio::test]
async fn registration_and_login() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_seeker("Sam").await;

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["role"], "JOB_SEEKER");
    assert_eq!(me.body["user"]["isApproved"], true);
    assert!(me.body["user"].get("password").is_none());

    let dup = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Sam", "email": "SAM@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let wrong = app.login("sam@example.com", "nope-nope").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["message"], "Invalid credentials");

    let ok = app.login("Sam@Example.com", PASSWORD).await;
    assert_eq!(ok.status, StatusCode::OK, "{}", ok.body);

    let no_company = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Rae", "email": "rae@example.com", "password": PASSWORD, "role": "RECRUITER" }),
        )
        .await;
    assert_eq!(no_company.status, StatusCode::BAD_REQUEST);

    let admin = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Eve", "email": "eve@example.com", "password": PASSWORD, "role": "ADMIN" }),
        )
        .await;
    assert_eq!(admin.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recruiters_post_only_after_approval() {
    let app = TestApp::spawn().await;
    let (token, id) = app.register_recruiter("Riley", "Acme").await;

    let pending = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(pending.body["user"]["isApproved"], false);

    let blocked = app
        .post("/api/jobs", Some(&token), json!({ "title": "Engineer" }))
        .await;
    assert_eq!(blocked.status, StatusCode::FORBIDDEN);
    assert_eq!(
        blocked.body["message"],
        "Your account is pending approval by an admin"
    );

    let admin = app.admin_token().await;
    let queue = app.get("/api/admin/pending-recruiters", Some(&admin)).await;
    assert_eq!(queue.body["count"], 1);
    assert_eq!(queue.body["recruiters"][0]["_id"], id.as_str());

    let approved = app
        .put(
            &format!("/api/admin/approve-recruiter/{id}"),
            Some(&admin),
            json!({ "isApproved": true }),
        )
        .await;
    assert_eq!(approved.status, StatusCode::OK);
    assert_eq!(approved.body["recruiter"]["isApproved"], true);

    let job_id = app.post_job(&token, "Backend Engineer").await;
    let detail = app.get(&format!("/api/jobs/{job_id}"), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["job"]["companyName"], "Acme");
    assert_eq!(detail.body["job"]["applicationCount"], 0);
    assert_eq!(detail.body["job"]["recruiter"]["name"], "Riley");
    assert_eq!(detail.body["job"]["salaryRange"]["currency"], "USD");
}

#[tokio::test]
async fn non_admins_are_kept_out_of_admin_routes() {
    let app = TestApp::spawn().await;
    let (seeker, _) = app.register_seeker("Sam").await;
    let res = app.get("/api/admin/users", Some(&seeker)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let (recruiter, _) = app.approved_recruiter("Riley", "Acme").await;
    let res = app.get("/api/admin/analytics", Some(&recruiter)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn seeker_applies_with_a_resume() {
    let app = TestApp::spawn().await;
    let (recruiter, _) = app.approved_recruiter("Riley", "Acme").await;
    let job_id = app.post_job(&recruiter, "Backend Engineer").await;
    let (seeker, _) = app.register_seeker("Sam").await;

    let without_resume = app
        .post("/api/applications", Some(&seeker), json!({ "jobId": job_id }))
        .await;
    assert_eq!(without_resume.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        without_resume.body["message"],
        "Please upload your resume before applying"
    );

    let not_pdf = app.upload_resume(&seeker, "cv.docx", "application/msword").await;
    assert_eq!(not_pdf.status, StatusCode::BAD_REQUEST);

    let uploaded = app.upload_resume(&seeker, "cv.pdf", "application/pdf").await;
    assert_eq!(uploaded.status, StatusCode::OK, "{}", uploaded.body);
    let resume_url = uploaded.body["resumeUrl"].as_str().unwrap().to_string();
    let file = app.client.get(&resume_url).send().await.unwrap();
    assert_eq!(file.status(), StatusCode::OK);

    let applied = app
        .post(
            "/api/applications",
            Some(&seeker),
            json!({ "jobId": job_id, "coverLetter": "Hello" }),
        )
        .await;
    assert_eq!(applied.status, StatusCode::CREATED, "{}", applied.body);
    assert_eq!(applied.body["application"]["status"], "Applied");
    assert_eq!(applied.body["application"]["resumeUrl"], resume_url.as_str());

    let again = app
        .post("/api/applications", Some(&seeker), json!({ "jobId": job_id }))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let mine = app
        .get("/api/applications/my-applications", Some(&seeker))
        .await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["count"], 1);
    assert_eq!(mine.body["applications"][0]["status"], "Applied");
    assert_eq!(
        mine.body["applications"][0]["jobId"]["title"],
        "Backend Engineer"
    );

    let job = app.get(&format!("/api/jobs/{job_id}"), None).await;
    assert_eq!(job.body["job"]["applicationCount"], 1);

    let recruiter_cannot_apply = app
        .post("/api/applications", Some(&recruiter), json!({ "jobId": job_id }))
        .await;
    assert_eq!(recruiter_cannot_apply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_the_owner_or_an_admin_moves_applications() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.approved_recruiter("Riley", "Acme").await;
    let (other, _) = app.approved_recruiter("Morgan", "Globex").await;
    let job_id = app.post_job(&owner, "Backend Engineer").await;

    let (seeker, _) = app.register_seeker("Sam").await;
    app.upload_resume(&seeker, "cv.pdf", "application/pdf").await;
    let applied = app
        .post("/api/applications", Some(&seeker), json!({ "jobId": job_id }))
        .await;
    let application_id = applied.body["application"]["_id"].as_str().unwrap().to_string();
    let status_path = format!("/api/applications/{application_id}/status");

    let forbidden = app
        .put(&status_path, Some(&other), json!({ "status": "Shortlisted" }))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let listing = app
        .get(&format!("/api/applications/job/{job_id}"), Some(&other))
        .await;
    assert_eq!(listing.status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let moved = app
        .put(
            &status_path,
            Some(&admin),
            json!({ "status": "Interview", "recruiterNotes": "Call on Monday" }),
        )
        .await;
    assert_eq!(moved.status, StatusCode::OK, "{}", moved.body);
    assert_eq!(moved.body["application"]["status"], "Interview");

    let bogus = app
        .put(&status_path, Some(&owner), json!({ "status": "Ghosted" }))
        .await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);

    let applicants = app
        .get(&format!("/api/applications/job/{job_id}"), Some(&owner))
        .await;
    assert_eq!(applicants.status, StatusCode::OK);
    assert_eq!(applicants.body["applications"][0]["jobSeekerId"]["name"], "Sam");
    assert_eq!(
        applicants.body["applications"][0]["recruiterNotes"],
        "Call on Monday"
    );

    let detail = app
        .get(&format!("/api/applications/{application_id}"), Some(&seeker))
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    let (stranger, _) = app.register_seeker("Kim").await;
    let hidden = app
        .get(&format!("/api/applications/{application_id}"), Some(&stranger))
        .await;
    assert_eq!(hidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn inactive_jobs_leave_the_public_listing() {
    let app = TestApp::spawn().await;
    let (recruiter, _) = app.approved_recruiter("Riley", "Acme").await;
    let open = app.post_job(&recruiter, "Open Role").await;
    let closed = app.post_job(&recruiter, "Closed Role").await;

    let res = app
        .put(
            &format!("/api/jobs/{closed}"),
            Some(&recruiter),
            json!({ "isActive": false }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["job"]["isActive"], false);
    assert_eq!(res.body["job"]["title"], "Closed Role");

    let listing = app.get("/api/jobs?includeExternal=false", None).await;
    assert_eq!(listing.body["total"], 1);
    assert_eq!(listing.body["jobs"][0]["_id"], open.as_str());

    let mine = app.get("/api/jobs/recruiter/my-jobs", Some(&recruiter)).await;
    assert_eq!(mine.body["count"], 2);

    let (other, _) = app.approved_recruiter("Morgan", "Globex").await;
    let denied = app.delete(&format!("/api/jobs/{open}"), Some(&other)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    let deleted = app.delete(&format!("/api/jobs/{open}"), Some(&recruiter)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    let gone = app.get(&format!("/api/jobs/{open}"), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_merge_provider_results() {
    let app = TestApp::spawn_with(StubJobs::with_listings(&["a1", "b2", "c3", "d4", "e5", "f6"])).await;
    let (recruiter, _) = app.approved_recruiter("Riley", "Acme").await;
    app.post_job(&recruiter, "Backend Engineer").await;

    let merged = app.get("/api/jobs", None).await;
    assert_eq!(merged.status, StatusCode::OK);
    assert_eq!(merged.body["internalCount"], 1);
    assert_eq!(merged.body["externalCount"], 5);
    assert_eq!(merged.body["count"], 6);
    assert_eq!(merged.body["total"], 1);
    assert_eq!(merged.body["jobs"][1]["isExternal"], true);

    let internal_only = app.get("/api/jobs?includeExternal=false", None).await;
    assert_eq!(internal_only.body["externalCount"], 0);

    let external = app.get("/api/jobs/external_c3", None).await;
    assert_eq!(external.status, StatusCode::OK);
    assert_eq!(external.body["job"]["externalData"]["jobId"], "c3");

    let missing = app.get("/api/jobs/external_12345", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let malformed = app.get("/api/jobs/not-a-uuid", None).await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);

    let bad_type = app.get("/api/jobs?jobType=Gig", None).await;
    assert_eq!(bad_type.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_updates_merge_fields() {
    let app = TestApp::spawn().await;
    let (seeker, id) = app.register_seeker("Sam").await;

    let res = app
        .put(
            "/api/users/profile",
            Some(&seeker),
            json!({ "bio": "Rustacean", "skills": ["Rust"] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .put("/api/users/profile", Some(&seeker), json!({ "phone": "555-0100" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["phone"], "555-0100");
    assert_eq!(res.body["user"]["name"], "Sam");
    assert_eq!(res.body["user"]["profile"]["bio"], "Rustacean");

    let public = app.get(&format!("/api/users/profile/{id}"), None).await;
    assert_eq!(public.status, StatusCode::OK);
    assert_eq!(public.body["user"]["profile"]["skills"][0], "Rust");
}

#[tokio::test]
async fn admin_manages_users() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let (recruiter, recruiter_id) = app.approved_recruiter("Riley", "Acme").await;
    let job_id = app.post_job(&recruiter, "Backend Engineer").await;
    let (seeker, seeker_id) = app.register_seeker("Sam").await;
    app.upload_resume(&seeker, "cv.pdf", "application/pdf").await;
    app.post("/api/applications", Some(&seeker), json!({ "jobId": job_id }))
        .await;

    let me = app.get("/api/auth/me", Some(&admin)).await;
    let admin_id = me.body["user"]["_id"].as_str().unwrap().to_string();
    let refused = app
        .delete(&format!("/api/admin/users/{admin_id}"), Some(&admin))
        .await;
    assert_eq!(refused.status, StatusCode::BAD_REQUEST);
    assert_eq!(refused.body["message"], "Cannot delete admin user");

    let not_recruiter = app
        .put(
            &format!("/api/admin/approve-recruiter/{seeker_id}"),
            Some(&admin),
            json!({ "isApproved": true }),
        )
        .await;
    assert_eq!(not_recruiter.status, StatusCode::BAD_REQUEST);

    let stats = app.get("/api/admin/analytics", Some(&admin)).await;
    assert_eq!(stats.status, StatusCode::OK);
    let analytics = &stats.body["analytics"];
    assert_eq!(analytics["users"]["total"], 3);
    assert_eq!(analytics["users"]["approvedRecruiters"], 1);
    assert_eq!(analytics["jobs"]["active"], 1);
    assert_eq!(analytics["applications"]["total"], 1);

    let recruiters = app
        .get("/api/admin/users?role=RECRUITER", Some(&admin))
        .await;
    assert_eq!(recruiters.body["total"], 1);

    let removed = app
        .delete(&format!("/api/admin/users/{seeker_id}"), Some(&admin))
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    let job = app.get(&format!("/api/jobs/{job_id}"), None).await;
    assert_eq!(job.body["job"]["applicationCount"], 0);

    let stale = app.get("/api/auth/me", Some(&seeker)).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    let removed = app
        .delete(&format!("/api/admin/users/{recruiter_id}"), Some(&admin))
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    let gone = app.get(&format!("/api/jobs/{job_id}"), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let admin_login = app.login(ADMIN_EMAIL, "wrong").await;
    assert_eq!(admin_login.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn simultaneous_duplicate_applies_succeed_once() {
    let app = TestApp::spawn().await;
    let (recruiter, _) = app.approved_recruiter("Riley", "Acme").await;
    let job_id = app.post_job(&recruiter, "Backend Engineer").await;
    let (seeker, _) = app.register_seeker("Sam").await;
    app.upload_resume(&seeker, "cv.pdf", "application/pdf").await;

    let attempts = (0..8).map(|_| {
        app.post("/api/applications", Some(&seeker), json!({ "jobId": job_id }))
    });
    let results = futures::future::join_all(attempts).await;

    let created = results
        .iter()
        .filter(|r| r.status == StatusCode::CREATED)
        .count();
    let conflicts = results
        .iter()
        .filter(|r| r.status == StatusCode::CONFLICT)
        .count();
    assert_eq!((created, conflicts), (1, 7));

    let job = app.get(&format!("/api/jobs/{job_id}"), None).await;
    assert_eq!(job.body["job"]["applicationCount"], 1);
}
