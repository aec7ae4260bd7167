use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use society_auth::{JwtOptions, JwtVerifier};
use society_core::models::FlatDetails;
use society_core::Role;
use society_server::{BillingScheduler, SocietyState};
use tower::ServiceExt;

const SECRET: &str = "test-secret-0123456789abcdef0123456789";
const SOCIETY: &str = "soc-1";

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

struct Harness {
    router: Router,
    state: Arc<SocietyState>,
    scheduler: BillingScheduler,
    jwt: JwtVerifier,
}

impl Harness {
    fn new() -> Self {
        let mut cfg = society_server::config::defaults();
        cfg.set("auth.jwt.secret", SECRET);
        cfg.set("billing.scheduler_interval_secs", "0");
        let server = society_server::build_with(cfg).unwrap();

        Self {
            router: server.ax.router(),
            state: Arc::clone(&server.services.residents.state),
            scheduler: server.scheduler,
            jwt: JwtVerifier::new(JwtOptions::new(SECRET)).unwrap(),
        }
    }

    fn token(&self, sub: &str, role: Role, society: &str) -> String {
        self.jwt.issue(sub, role, society).unwrap()
    }

    fn admin(&self) -> String {
        self.token(SOCIETY, Role::Admin, SOCIETY)
    }

    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Reply { status, headers, body }
    }

    /// Society `soc-1` with block A (`101`, `102` on floor 1, `201` on
    /// floor 2) and an approved resident `res-asha` in A-101.
    async fn seeded() -> Self {
        let h = Self::new();
        let admin = h.admin();

        let r = h
            .send("POST", "/societies", Some(&admin), Some(json!({"id": SOCIETY, "name": "Green Acres"})))
            .await;
        assert_eq!(r.status, StatusCode::OK, "{}", r.body);

        let r = h
            .send(
                "POST",
                "/societies/soc-1/blocks",
                Some(&admin),
                Some(json!({"blockName": "A", "floors": [["101", "102"], ["201"]]})),
            )
            .await;
        assert_eq!(r.status, StatusCode::OK, "{}", r.body);

        h.register("res-asha", "asha@example.com", 1, "101").await;
        let r = h.send("POST", "/residents/res-asha/approve", Some(&admin), None).await;
        assert_eq!(r.status, StatusCode::OK, "{}", r.body);
        h
    }

    async fn register(&self, id: &str, email: &str, floor: u32, flat: &str) -> Reply {
        let token = self.token(id, Role::Resident, SOCIETY);
        let r = self
            .send(
                "POST",
                "/residents",
                Some(&token),
                Some(json!({
                    "name": "Resident",
                    "email": email,
                    "flatDetails": {"blockName": "A", "floorIndex": floor, "flatNumber": flat}
                })),
            )
            .await;
        assert_eq!(r.status, StatusCode::OK, "{}", r.body);
        r
    }

    async fn society(&self) -> Value {
        let r = self.send("GET", "/societies/soc-1", Some(&self.admin()), None).await;
        assert_eq!(r.status, StatusCode::OK);
        r.body
    }
}

fn flat_residents(society: &Value, block: &str, floor: usize, flat: &str) -> Vec<String> {
    let blocks = society["apartmentStructure"]["structures"].as_array().unwrap();
    let block = blocks.iter().find(|b| b["blockName"] == block).unwrap();
    let flats = block["floors"][floor - 1]["flats"].as_array().unwrap();
    let flat = flats.iter().find(|f| f["flatNumber"] == flat).unwrap();
    serde_json::from_value(flat["residents"].clone()).unwrap()
}

fn occurrences(list: &Value, id: &str) -> usize {
    list.as_array().unwrap().iter().filter(|v| *v == id).count()
}

#[tokio::test]
async fn health_is_public_and_carries_a_request_id() {
    let h = Harness::new();
    let r = h.send("GET", "/health", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body, json!("ok"));
    assert!(r.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let h = Harness::new();
    let r = h.send("GET", "/residents", None, None).await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
    assert_eq!(r.body["name"], "NotAuthenticated");
    assert!(r.headers.contains_key("x-request-id"));

    let r = h.send("GET", "/residents", Some("not-a-jwt"), None).await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn approval_lists_the_resident_exactly_once() {
    let h = Harness::seeded().await;

    // approving again changes nothing
    let r = h.send("POST", "/residents/res-asha/approve", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["status"], "approved");

    let soc = h.society().await;
    assert_eq!(flat_residents(&soc, "A", 1, "101"), vec!["res-asha".to_string()]);
    assert_eq!(occurrences(&soc["residents"], "res-asha"), 1);

    let r = h
        .send("GET", "/societies/soc-1/placements/res-asha", Some(&h.admin()), None)
        .await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body.as_array().unwrap().len(), 1);
    assert_eq!(r.body[0]["flatNumber"], "101");
}

#[tokio::test]
async fn only_admins_approve() {
    let h = Harness::seeded().await;
    h.register("res-ravi", "ravi@example.com", 1, "102").await;

    let ravi = h.token("res-ravi", Role::Resident, SOCIETY);
    let r = h.send("POST", "/residents/res-ravi/approve", Some(&ravi), None).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
    assert_eq!(r.body["className"], "forbidden");

    let soc = h.society().await;
    assert!(flat_residents(&soc, "A", 1, "102").is_empty());
}

#[tokio::test]
async fn approved_residents_move_between_flats() {
    let h = Harness::seeded().await;
    let r = h
        .send(
            "PATCH",
            "/residents/res-asha",
            Some(&h.admin()),
            Some(json!({"flatDetails": {"blockName": "A", "floorIndex": 2, "flatNumber": "201"}})),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    assert_eq!(r.body["flatDetails"]["flatNumber"], "201");

    let soc = h.society().await;
    assert!(flat_residents(&soc, "A", 1, "101").is_empty());
    assert_eq!(flat_residents(&soc, "A", 2, "201"), vec!["res-asha".to_string()]);
    assert_eq!(occurrences(&soc["residents"], "res-asha"), 1);
}

#[tokio::test]
async fn move_from_a_missing_placement_conflicts_and_writes_nothing() {
    let h = Harness::seeded().await;
    h.state
        .store
        .transaction(|tx| {
            let mut soc = tx.societies.require(SOCIETY, SOCIETY, "Society")?;
            soc.apartment_structure
                .unassign(&FlatDetails::new("A", 1, "101"), "res-asha")
                .unwrap();
            tx.societies.put(soc);
            Ok(())
        })
        .await
        .unwrap();

    let r = h
        .send(
            "PATCH",
            "/residents/res-asha",
            Some(&h.admin()),
            Some(json!({"flatDetails": {"blockName": "A", "floorIndex": 2, "flatNumber": "201"}})),
        )
        .await;
    assert_eq!(r.status, StatusCode::CONFLICT, "{}", r.body);

    let resident = h.send("GET", "/residents/res-asha", Some(&h.admin()), None).await;
    assert_eq!(resident.body["flatDetails"]["flatNumber"], "101");
    let soc = h.society().await;
    assert!(flat_residents(&soc, "A", 2, "201").is_empty());
}

#[tokio::test]
async fn removal_sweeps_stale_placements() {
    let h = Harness::seeded().await;
    // the tree lists Asha in 102 while her record still says 101
    h.state
        .store
        .transaction(|tx| {
            let mut soc = tx.societies.require(SOCIETY, SOCIETY, "Society")?;
            soc.apartment_structure
                .unassign(&FlatDetails::new("A", 1, "101"), "res-asha")
                .unwrap();
            soc.apartment_structure
                .assign(&FlatDetails::new("A", 1, "102"), "res-asha")
                .unwrap();
            tx.societies.put(soc);
            Ok(())
        })
        .await
        .unwrap();

    let r = h.send("DELETE", "/residents/res-asha", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);

    let soc = h.society().await;
    assert!(flat_residents(&soc, "A", 1, "101").is_empty());
    assert!(flat_residents(&soc, "A", 1, "102").is_empty());
    assert_eq!(occurrences(&soc["residents"], "res-asha"), 0);

    let r = h.send("GET", "/residents/res-asha", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reconcile_repairs_drift() {
    let h = Harness::seeded().await;
    h.state
        .store
        .transaction(|tx| {
            let mut soc = tx.societies.require(SOCIETY, SOCIETY, "Society")?;
            soc.apartment_structure
                .assign(&FlatDetails::new("A", 2, "201"), "res-ghost")
                .unwrap();
            tx.societies.put(soc);
            Ok(())
        })
        .await
        .unwrap();

    let r = h.send("POST", "/societies/soc-1/reconcile", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    assert_eq!(r.body["removed"].as_array().unwrap().len(), 1);

    let soc = h.society().await;
    assert!(flat_residents(&soc, "A", 2, "201").is_empty());
    assert_eq!(flat_residents(&soc, "A", 1, "101"), vec!["res-asha".to_string()]);

    let r = h.send("POST", "/societies/soc-1/reconcile", Some(&h.admin()), None).await;
    assert!(r.body["removed"].as_array().unwrap().is_empty());
    assert!(r.body["added"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn occupied_blocks_cannot_be_removed() {
    let h = Harness::seeded().await;
    let r = h.send("DELETE", "/societies/soc-1/blocks/A", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::CONFLICT);

    let r = h
        .send(
            "POST",
            "/societies/soc-1/blocks",
            Some(&h.admin()),
            Some(json!({"blockName": "B", "floors": [["B1"]]})),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK);
    let r = h.send("DELETE", "/societies/soc-1/blocks/B", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::OK);
}

#[tokio::test]
async fn tenants_are_isolated() {
    let h = Harness::seeded().await;
    let other = h.token("soc-2", Role::Admin, "soc-2");

    let r = h.send("GET", "/residents/res-asha", Some(&other), None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    let r = h.send("GET", "/societies/soc-1", Some(&other), None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    let r = h.send("GET", "/residents", Some(&other), None).await;
    assert_eq!(r.body, json!([]));

    // a society is only created by its own admin
    let r = h
        .send("POST", "/societies", Some(&other), Some(json!({"id": "soc-3", "name": "Elsewhere"})))
        .await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn feed_counters_follow_likes_and_comments() {
    let h = Harness::seeded().await;
    let asha = h.token("res-asha", Role::Resident, SOCIETY);

    let post = h
        .send("POST", "/posts", Some(&asha), Some(json!({"content": "Potluck on Sunday"})))
        .await;
    assert_eq!(post.status, StatusCode::OK, "{}", post.body);
    assert_eq!(post.body["authorModel"], "Resident");
    let post_id = post.body["id"].as_str().unwrap().to_string();

    let r = h.send("POST", &format!("/posts/{post_id}/like"), Some(&asha), None).await;
    assert_eq!(r.body["likesCount"], 1);
    let r = h.send("POST", &format!("/posts/{post_id}/like"), Some(&h.admin()), None).await;
    assert_eq!(r.body["likesCount"], 2);
    let r = h.send("POST", &format!("/posts/{post_id}/like"), Some(&asha), None).await;
    assert_eq!(r.body["likesCount"], 1);
    assert_eq!(r.body["likes"], json!([SOCIETY]));

    let comment = h
        .send(
            "POST",
            "/comments",
            Some(&h.admin()),
            Some(json!({"postId": post_id, "content": "Count us in"})),
        )
        .await;
    assert_eq!(comment.status, StatusCode::OK, "{}", comment.body);
    let comment_id = comment.body["id"].as_str().unwrap().to_string();

    let r = h.send("GET", &format!("/posts/{post_id}"), Some(&asha), None).await;
    assert_eq!(r.body["commentsCount"], 1);
    let r = h
        .send("GET", &format!("/comments?postId={post_id}"), Some(&asha), None)
        .await;
    assert_eq!(r.body.as_array().unwrap().len(), 1);

    // only the author or the society removes a comment
    let r = h.send("DELETE", &format!("/comments/{comment_id}"), Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
    let r = h.send("DELETE", &format!("/comments/{comment_id}"), Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::OK);
    let r = h.send("GET", &format!("/posts/{post_id}"), Some(&asha), None).await;
    assert_eq!(r.body["commentsCount"], 0);

    let r = h.send("DELETE", &format!("/posts/{post_id}"), Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["status"], "deactivated");
    let r = h.send("POST", &format!("/posts/{post_id}/like"), Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::GONE);
    let r = h
        .send(
            "POST",
            "/comments",
            Some(&asha),
            Some(json!({"postId": post_id, "content": "Too late"})),
        )
        .await;
    assert_eq!(r.status, StatusCode::GONE);
    let r = h.send("DELETE", &format!("/posts/{post_id}"), Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::GONE);
}

#[tokio::test]
async fn feed_is_closed_to_pending_residents_and_guards() {
    let h = Harness::seeded().await;
    h.register("res-ravi", "ravi@example.com", 1, "102").await;
    let ravi = h.token("res-ravi", Role::Resident, SOCIETY);
    let guard = h.token("guard-1", Role::Guard, SOCIETY);

    let r = h.send("POST", "/posts", Some(&ravi), Some(json!({"content": "Hello"}))).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
    let r = h.send("GET", "/posts", Some(&guard), None).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);

    let r = h.send("POST", "/comments", Some(&ravi), Some(json!({"postId": "post:x", "content": "Hi"}))).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn blocked_authors_disappear_from_the_feed() {
    let h = Harness::seeded().await;
    h.register("res-ravi", "ravi@example.com", 1, "102").await;
    h.send("POST", "/residents/res-ravi/approve", Some(&h.admin()), None).await;
    let asha = h.token("res-asha", Role::Resident, SOCIETY);
    let ravi = h.token("res-ravi", Role::Resident, SOCIETY);

    h.send("POST", "/posts", Some(&ravi), Some(json!({"content": "Selling a bicycle"}))).await;
    h.send("POST", "/posts", Some(&h.admin()), Some(json!({"content": "Lift maintenance today"}))).await;

    let r = h.send("GET", "/posts", Some(&asha), None).await;
    assert_eq!(r.body.as_array().unwrap().len(), 2);

    let r = h.send("POST", "/blocks", Some(&asha), Some(json!({"userId": "res-ravi"}))).await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    let r = h.send("POST", "/blocks", Some(&asha), Some(json!({"userId": "res-asha"}))).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);

    let r = h.send("GET", "/posts", Some(&asha), None).await;
    let posts = r.body.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["authorModel"], "Society");

    let r = h.send("GET", "/posts?limit=1&skip=1", Some(&ravi), None).await;
    assert_eq!(r.body.as_array().unwrap().len(), 1);

    let r = h.send("DELETE", "/blocks/res-ravi", Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::OK);
    let r = h.send("GET", "/posts", Some(&asha), None).await;
    assert_eq!(r.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn bills_add_gst_and_are_paid_once() {
    let h = Harness::seeded().await;
    let asha = h.token("res-asha", Role::Resident, SOCIETY);

    let r = h
        .send(
            "POST",
            "/bills",
            Some(&h.admin()),
            Some(json!({
                "title": "Maintenance",
                "blockName": "A",
                "flatNumber": "101",
                "baseAmount": 100025,
                "gstRateBp": 1800,
                "additionalCharges": [{"label": "Parking", "amount": 50000}]
            })),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    assert_eq!(r.body["gstAmount"], 18005);
    assert_eq!(r.body["total"], 168030);
    assert_eq!(r.body["residentIds"], json!(["res-asha"]));
    let bill_id = r.body["id"].as_str().unwrap().to_string();

    let soc = h.society().await;
    assert_eq!(occurrences(&soc["bills"], &bill_id), 1);

    let r = h.send("GET", "/bills", Some(&asha), None).await;
    assert_eq!(r.body.as_array().unwrap().len(), 1);

    let r = h.send("POST", &format!("/bills/{bill_id}/pay"), Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["status"], "paid");
    assert_eq!(r.body["paidBy"], "res-asha");

    let r = h.send("POST", &format!("/bills/{bill_id}/pay"), Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::CONFLICT);
    let r = h.send("DELETE", &format!("/bills/{bill_id}"), Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn bills_need_an_existing_flat_and_a_sane_rate() {
    let h = Harness::seeded().await;
    let r = h
        .send(
            "POST",
            "/bills",
            Some(&h.admin()),
            Some(json!({"title": "Maintenance", "blockName": "Z", "flatNumber": "1", "baseAmount": 1000})),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY);

    let r = h
        .send(
            "POST",
            "/bills",
            Some(&h.admin()),
            Some(json!({
                "title": "Maintenance",
                "blockName": "A",
                "flatNumber": "101",
                "baseAmount": 1000,
                "gstRateBp": 10001
            })),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(h.society().await["bills"].as_array().unwrap().is_empty());

    let guard = h.token("guard-1", Role::Guard, SOCIETY);
    let r = h.send("GET", "/bills", Some(&guard), None).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn due_schedules_issue_one_bill_per_occupied_flat() {
    let h = Harness::seeded().await;
    let r = h
        .send(
            "POST",
            "/scheduled-bills",
            Some(&h.admin()),
            Some(json!({
                "title": "Monthly maintenance",
                "baseAmount": 200000,
                "gstRateBp": 1800,
                "frequency": "monthly"
            })),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    let first_run = r.body["nextRun"].clone();

    let r = h.send("POST", "/scheduled-bills/run-due", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    let reports = r.body.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["billIds"].as_array().unwrap().len(), 1);
    assert_ne!(reports[0]["nextRun"], first_run);

    // nothing is due until next month
    let r = h.send("POST", "/scheduled-bills/run-due", Some(&h.admin()), None).await;
    assert_eq!(r.body, json!([]));
    assert_eq!(h.scheduler.tick().await, 0);

    let r = h.send("GET", "/bills", Some(&h.admin()), None).await;
    assert_eq!(r.body.as_array().unwrap().len(), 1);
    assert_eq!(r.body[0]["total"], 236000);

    let asha = h.token("res-asha", Role::Resident, SOCIETY);
    let r = h.send("GET", "/scheduled-bills", Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn background_tick_runs_every_society() {
    let h = Harness::seeded().await;
    h.send(
        "POST",
        "/scheduled-bills",
        Some(&h.admin()),
        Some(json!({"title": "Water", "baseAmount": 5000, "frequency": "quarterly"})),
    )
    .await;

    assert_eq!(h.scheduler.tick().await, 1);
    assert_eq!(h.scheduler.tick().await, 0);
}

#[tokio::test]
async fn visitors_check_out_once() {
    let h = Harness::seeded().await;
    let guard = h.token("guard-1", Role::Guard, SOCIETY);
    let asha = h.token("res-asha", Role::Resident, SOCIETY);

    let r = h
        .send(
            "POST",
            "/visitors",
            Some(&guard),
            Some(json!({"visitorName": "Courier", "purpose": "Delivery", "blockName": "A", "flatNumber": "101"})),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    assert_eq!(r.body["status"], "checkedIn");
    let id = r.body["id"].as_str().unwrap().to_string();

    let r = h
        .send(
            "POST",
            "/visitors",
            Some(&guard),
            Some(json!({"visitorName": "Plumber", "purpose": "Repair", "blockName": "A", "flatNumber": "999"})),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY);

    let r = h
        .send(
            "POST",
            "/visitors",
            Some(&asha),
            Some(json!({"visitorName": "Friend", "purpose": "Visit", "blockName": "A", "flatNumber": "101"})),
        )
        .await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);

    let r = h.send("GET", "/visitors", Some(&asha), None).await;
    assert_eq!(r.body.as_array().unwrap().len(), 1);
    let r = h.send("GET", "/visitors?status=checkedOut", Some(&guard), None).await;
    assert_eq!(r.body, json!([]));
    let r = h.send("GET", "/visitors?status=gone", Some(&guard), None).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);

    let r = h.send("POST", &format!("/visitors/{id}/checkout"), Some(&guard), None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["status"], "checkedOut");
    let r = h.send("POST", &format!("/visitors/{id}/checkout"), Some(&guard), None).await;
    assert_eq!(r.status, StatusCode::CONFLICT);

    let soc = h.society().await;
    assert_eq!(occurrences(&soc["visitorLogs"], &id), 1);
}

/// Block A gets a second `101`, on floor 2, with `res-bo` living there.
async fn twin_flats(h: &Harness) {
    let r = h
        .send(
            "POST",
            "/societies/soc-1/blocks",
            Some(&h.admin()),
            Some(json!({"blockName": "A", "floors": [["101", "102"], ["201", "101"]]})),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);

    h.register("res-bo", "bo@example.com", 2, "101").await;
    let r = h.send("POST", "/residents/res-bo/approve", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);

    let soc = h.society().await;
    assert_eq!(flat_residents(&soc, "A", 1, "101"), vec!["res-asha".to_string()]);
    assert_eq!(flat_residents(&soc, "A", 2, "101"), vec!["res-bo".to_string()]);
}

#[tokio::test]
async fn bills_tell_repeated_flat_numbers_apart_by_floor() {
    let h = Harness::seeded().await;
    twin_flats(&h).await;
    let asha = h.token("res-asha", Role::Resident, SOCIETY);
    let bo = h.token("res-bo", Role::Resident, SOCIETY);

    let r = h
        .send(
            "POST",
            "/bills",
            Some(&h.admin()),
            Some(json!({"title": "Maintenance", "blockName": "A", "flatNumber": "101", "baseAmount": 1000})),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY, "{}", r.body);
    assert!(h.society().await["bills"].as_array().unwrap().is_empty());

    let r = h
        .send(
            "POST",
            "/bills",
            Some(&h.admin()),
            Some(json!({
                "title": "Maintenance",
                "blockName": "A",
                "floorIndex": 1,
                "flatNumber": "101",
                "baseAmount": 1000
            })),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    assert_eq!(r.body["flat"]["floorIndex"], 1);
    assert_eq!(r.body["residentIds"], json!(["res-asha"]));
    let bill_id = r.body["id"].as_str().unwrap().to_string();

    let r = h.send("GET", "/bills", Some(&bo), None).await;
    assert_eq!(r.body, json!([]));
    let r = h.send("GET", &format!("/bills/{bill_id}"), Some(&bo), None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    let r = h.send("POST", &format!("/bills/{bill_id}/pay"), Some(&bo), None).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);

    let r = h.send("GET", "/bills", Some(&asha), None).await;
    assert_eq!(r.body.as_array().unwrap().len(), 1);
    let r = h.send("POST", &format!("/bills/{bill_id}/pay"), Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::OK);
}

#[tokio::test]
async fn visitors_are_logged_against_the_right_floor() {
    let h = Harness::seeded().await;
    twin_flats(&h).await;
    let guard = h.token("guard-1", Role::Guard, SOCIETY);
    let asha = h.token("res-asha", Role::Resident, SOCIETY);
    let bo = h.token("res-bo", Role::Resident, SOCIETY);

    let r = h
        .send(
            "POST",
            "/visitors",
            Some(&guard),
            Some(json!({"visitorName": "Courier", "purpose": "Delivery", "blockName": "A", "flatNumber": "101"})),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY);

    let r = h
        .send(
            "POST",
            "/visitors",
            Some(&guard),
            Some(json!({
                "visitorName": "Courier",
                "purpose": "Delivery",
                "blockName": "A",
                "floorIndex": 2,
                "flatNumber": "101"
            })),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    assert_eq!(r.body["floorIndex"], 2);

    let r = h.send("GET", "/visitors", Some(&bo), None).await;
    assert_eq!(r.body.as_array().unwrap().len(), 1);
    let r = h.send("GET", "/visitors", Some(&asha), None).await;
    assert_eq!(r.body, json!([]));
}

#[tokio::test]
async fn blank_flat_and_block_names_are_rejected() {
    let h = Harness::seeded().await;
    let cy = h.token("res-cy", Role::Resident, SOCIETY);

    for flat in [
        json!({"blockName": "A", "floorIndex": 1, "flatNumber": "   "}),
        json!({"blockName": "  ", "floorIndex": 1, "flatNumber": "102"}),
    ] {
        let r = h
            .send(
                "POST",
                "/residents",
                Some(&cy),
                Some(json!({"name": "Cy", "email": "cy@example.com", "flatDetails": flat})),
            )
            .await;
        assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY, "{}", r.body);
    }
    let r = h.send("GET", "/residents/res-cy", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);

    let r = h
        .send(
            "PATCH",
            "/residents/res-asha",
            Some(&h.admin()),
            Some(json!({"flatDetails": {"blockName": "A", "floorIndex": 1, "flatNumber": " "}})),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY);

    let r = h
        .send(
            "POST",
            "/societies/soc-1/blocks",
            Some(&h.admin()),
            Some(json!({"blockName": "B", "floors": [["B1", " "]]})),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY);

    let soc = h.society().await;
    assert_eq!(flat_residents(&soc, "A", 1, "101"), vec!["res-asha".to_string()]);
    assert_eq!(soc["apartmentStructure"]["structures"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn members_read_the_structure_and_placements() {
    let h = Harness::seeded().await;
    let asha = h.token("res-asha", Role::Resident, SOCIETY);

    let r = h.send("GET", "/societies/soc-1/structure", Some(&asha), None).await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    let blocks = r.body["structures"].as_array().unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["blockName"], "A");
    assert_eq!(blocks[0]["floors"].as_array().unwrap().len(), 2);

    let r = h
        .send("GET", "/societies/soc-1/placements/res-asha", Some(&h.admin()), None)
        .await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    let placements = r.body.as_array().unwrap();
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0]["blockName"], "A");
    assert_eq!(placements[0]["floorIndex"], 1);
    assert_eq!(placements[0]["flatNumber"], "101");

    let r = h
        .send("GET", "/societies/soc-1/placements/res-nobody", Some(&h.admin()), None)
        .await;
    assert_eq!(r.body, json!([]));

    let r = h.send("GET", "/societies/soc-1/structure", None, None).await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
    let other = h.token("soc-2", Role::Admin, "soc-2");
    let r = h.send("GET", "/societies/soc-1/structure", Some(&other), None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pending_residents_can_be_deleted() {
    let h = Harness::seeded().await;
    h.register("res-cy", "cy@example.com", 2, "201").await;
    let before = h.society().await;

    let r = h.send("DELETE", "/residents/res-cy", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    assert_eq!(r.body["status"], "pending");

    let r = h.send("GET", "/residents/res-cy", Some(&h.admin()), None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);

    let after = h.society().await;
    assert_eq!(after["apartmentStructure"], before["apartmentStructure"]);
    assert_eq!(after["residents"], json!(["res-asha"]));
}
