use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use serde_json::{json, Value};

use infra::memory::MemoryConnectionManager;
use rustaurant::catalog::{Critique, Customer, Menu, Register};
use rustaurant::restaurants::CustomerMatch;
use rustaurant::services::Commandable;
use rustaurant::users::Auth;
use rustaurant::Rustaurant;

fn rustaurant() -> Rustaurant<MemoryConnectionManager> {
    env_logger::try_init().unwrap_or_default();
    let pool = r2d2::Pool::builder()
        .max_size(2)
        .build(MemoryConnectionManager::new())
        .expect("pool");
    let app = Rustaurant::new(pool, Auth::new("sekrit", 4), CustomerMatch::Exact);
    app.setup().expect("setup");

    let catalog = app.catalog();
    catalog
        .execute(Register::<Menu>::named("Chicken Rice"))
        .expect("menu");
    for name in &["Alice", "Bob"] {
        catalog
            .execute(Register::<Customer>::named(name))
            .expect("customer");
    }
    catalog
        .execute(Register::<Critique>::named("Seth"))
        .expect("critique");
    app
}

macro_rules! service {
    ($app:expr) => {{
        let app = $app.clone();
        test::init_service(
            App::new()
                .wrap(rustaurant::cors())
                .configure(move |cfg| app.configure(cfg)),
        )
        .await
    }};
}

async fn body<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    let bytes = test::read_body(resp).await;
    serde_json::from_slice(&bytes).expect("json body")
}

fn ah_hock() -> Value {
    json!({
        "name": "Ah Hock",
        "menu": "Chicken Rice",
        "customers": ["Alice"],
        "remarks": "Good food",
        "critiques": ["Seth"],
    })
}

#[actix_web::test]
async fn create_restaurant_is_created() {
    let app = rustaurant();
    let srv = service!(app);

    let req = test::TestRequest::post()
        .uri("/restaurant")
        .set_json(ah_hock())
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json = body(resp).await;
    assert_eq!(json["message"], "Restaurant created successfully");
    let id = json["restaurantId"].as_str().expect("restaurantId");
    assert!(id.starts_with("restaurant-"), "{}", id);
}

#[actix_web::test]
async fn create_without_menu_is_bad_request() {
    let app = rustaurant();
    let srv = service!(app);

    let mut form = ah_hock();
    form.as_object_mut().expect("object").remove("menu");
    let req = test::TestRequest::post()
        .uri("/restaurant")
        .set_json(form)
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await["error"], "Missing required field: menu");
}

#[actix_web::test]
async fn create_without_customers_is_bad_request() {
    let app = rustaurant();
    let srv = service!(app);

    let mut form = ah_hock();
    form["customers"] = json!([]);
    let req = test::TestRequest::post()
        .uri("/restaurant")
        .set_json(form)
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await["error"], "Invalid customer");
}

#[actix_web::test]
async fn malformed_json_is_bad_request() {
    let app = rustaurant();
    let srv = service!(app);

    let req = test::TestRequest::post()
        .uri("/restaurant")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn delete_of_unknown_restaurant_is_not_found() {
    let app = rustaurant();
    let srv = service!(app);

    for id in &["restaurant-AAAAAAAAAAAAAAAAAAAAAA", "not-an-id"] {
        let req = test::TestRequest::delete()
            .uri(&format!("/restaurant/{}", id))
            .to_request();
        let resp = test::call_service(&srv, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", id);
    }
}

#[actix_web::test]
async fn overview_append_and_replace() {
    let app = rustaurant();
    let srv = service!(app);

    let req = test::TestRequest::post()
        .uri("/restaurant")
        .set_json(ah_hock())
        .to_request();
    let created = body(test::call_service(&srv, req).await).await;
    let restaurant = created["restaurantId"].as_str().expect("id").to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/restaurant/{}/overview", restaurant))
        .set_json(json!({"cost": "8.50", "time": "lunch", "date": "2024-01-01"}))
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let overview = body(resp).await["overviewId"]
        .as_str()
        .expect("overviewId")
        .to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/restaurant/{}/overview/{}", restaurant, overview))
        .set_json(json!({"cost": 9, "time": "dinner", "date": "2024-01-02"}))
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri(&format!("/restaurant/{}/overview/{}", restaurant, overview))
        .set_json(json!({"cost": "lots", "time": "dinner", "date": "2024-01-02"}))
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn listing_requires_a_token() {
    let app = rustaurant();
    let srv = service!(app);

    let req = test::TestRequest::get().uri("/restaurant").to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/restaurant")
        .insert_header((header::AUTHORIZATION, "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn signup_login_and_list() {
    let app = rustaurant();
    let srv = service!(app);
    let credentials = json!({"email": "a@example.com", "password": "hunter2"});

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(credentials.clone())
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(credentials.clone())
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({"email": "a@example.com", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body(resp).await.get("token").is_none());

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(credentials)
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body(resp).await["token"]
        .as_str()
        .expect("token")
        .to_string();

    let req = test::TestRequest::post()
        .uri("/restaurant")
        .set_json(ah_hock())
        .to_request();
    test::call_service(&srv, req).await;

    let req = test::TestRequest::get()
        .uri("/restaurant")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let list = body(resp).await;
    assert_eq!(list.as_array().expect("array").len(), 1);
    assert_eq!(list[0]["menu"]["name"], "Chicken Rice");
}

#[actix_web::test]
async fn search_is_public_and_projected() {
    let app = rustaurant();
    let srv = service!(app);

    let req = test::TestRequest::post()
        .uri("/restaurant")
        .set_json(ah_hock())
        .to_request();
    test::call_service(&srv, req).await;

    let req = test::TestRequest::get()
        .uri("/search?menu=chicken&critiques=Seth,Nobody")
        .to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body(resp).await,
        json!({
            "result": [{
                "name": "Ah Hock",
                "menu": { "name": "Chicken Rice" },
                "critiques": [{ "name": "Seth" }],
            }]
        })
    );
}
