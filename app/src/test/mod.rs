//! Guarded with `#[cfg(test)]` from `lib.rs`

use std::collections::BTreeSet;

use maplit::btreeset;
use serde_json::json;

use infra::documents::HasMeta;
use infra::ids::IdGen;
use infra::persistence::Storage;

use crate::catalog::{Canonical, Menu};
use crate::error::AppError;
use crate::restaurants::*;
use crate::services::{Commandable, Queryable};


fn form(json: serde_json::Value) -> RestaurantForm {
    serde_json::from_value(json).expect("form")
}

fn ah_hock() -> RestaurantForm {
    form(json!({
        "name": "Ah Hock",
        "block_no": "12",
        "address": "Bedok North",
        "zipcode": "460012",
        "menu": "Chicken Rice",
        "customers": ["Alice", "Bob"],
        "overall": 4,
        "remarks": ["Good food", "Cheap"],
        "critiques": ["Seth"],
    }))
}

#[test]
fn created_restaurant_embeds_snapshots() {
    let pool = junk_drawer::seeded_pool();
    let restaurants = Restaurants::new(pool.clone(), CustomerMatch::Exact);

    let id = restaurants
        .execute(CreateRestaurant(ah_hock()))
        .expect("create");

    let stored: Restaurant = pool
        .get()
        .expect("connection")
        .load(&id)
        .expect("load")
        .expect("present");
    assert_eq!(stored.menu.id, Menu::id_for("Chicken Rice"));
    let customers: BTreeSet<&str> = stored.customers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(customers, btreeset! {"Alice", "Bob"});
    assert_eq!(stored.critiques[0].name, "Seth");
    assert_eq!(stored.overall, Some(4.0));
    assert!(stored.overview.is_empty());
}

#[test]
fn snapshots_are_not_refreshed_when_the_canonical_record_changes() {
    let pool = junk_drawer::seeded_pool();
    let restaurants = Restaurants::new(pool.clone(), CustomerMatch::Exact);
    let id = restaurants
        .execute(CreateRestaurant(ah_hock()))
        .expect("create");

    let mut docs = pool.get().expect("connection");
    let mut menu: Menu = docs
        .load(&Menu::id_for("Chicken Rice"))
        .expect("load")
        .expect("menu");
    menu.name = "Hainanese Chicken Rice".to_string();
    docs.save(&mut menu).expect("rename menu");

    let stored: Restaurant = docs.load(&id).expect("load").expect("present");
    assert_eq!(stored.menu.id, menu.meta().id);
    assert_eq!(stored.menu.name, "Chicken Rice");
}

#[test]
fn critique_mismatch_writes_nothing() {
    let pool = junk_drawer::seeded_pool();
    let restaurants = Restaurants::new(pool.clone(), CustomerMatch::Exact);

    let mut json = json!({
        "name": "Ah Hock",
        "menu": "Chicken Rice",
        "customers": "Alice",
        "remarks": "Good",
        "critiques": ["Seth", "Nobody"],
    });
    let err = restaurants
        .execute(CreateRestaurant(form(json.clone())))
        .expect_err("unknown critique");
    assert!(matches!(err, AppError::InvalidReference("critique")), "{:?}", err);

    json["menu"] = json!("Laksa");
    let err = restaurants
        .execute(CreateRestaurant(form(json)))
        .expect_err("unknown menu");
    assert!(matches!(err, AppError::InvalidReference("menu")), "{:?}", err);

    let all = restaurants.query(ListRestaurants).expect("list");
    assert!(all.is_empty(), "{:?}", all);
}

#[test]
fn empty_customer_list_writes_nothing() {
    let restaurants = Restaurants::new(junk_drawer::seeded_pool(), CustomerMatch::Exact);

    let err = restaurants
        .execute(CreateRestaurant(form(json!({
            "name": "Ghost Town",
            "menu": "Chicken Rice",
            "customers": [],
            "remarks": ["x"],
            "critiques": [],
        }))))
        .expect_err("no customers");
    assert!(matches!(err, AppError::InvalidReference("customer")), "{:?}", err);

    let all = restaurants.query(ListRestaurants).expect("list");
    assert!(all.is_empty(), "{:?}", all);
}

#[test]
fn missing_fields_never_reach_the_store() {
    let pool = junk_drawer::pool();
    let restaurants = Restaurants::new(pool, CustomerMatch::Exact);

    let err = restaurants
        .execute(CreateRestaurant(form(json!({ "name": "Ah Hock" }))))
        .expect_err("missing menu");
    assert!(matches!(err, AppError::MissingField("menu")), "{:?}", err);
}

#[test]
fn overview_lifecycle() {
    let pool = junk_drawer::seeded_pool();
    let restaurants = Restaurants::new(pool, CustomerMatch::Exact);
    let restaurant = restaurants
        .execute(CreateRestaurant(ah_hock()))
        .expect("create");

    let overview_form = |cost: serde_json::Value, time: &str| -> OverviewForm {
        serde_json::from_value(json!({"cost": cost, "time": time, "date": "2020-01-01"}))
            .expect("overview form")
    };

    let first = restaurants
        .execute(AppendOverview {
            restaurant,
            form: overview_form(json!(10), "lunch"),
        })
        .expect("append");
    let second = restaurants
        .execute(AppendOverview {
            restaurant,
            form: overview_form(json!("12.5"), "dinner"),
        })
        .expect("append");
    assert_ne!(first, second);

    restaurants
        .execute(UpdateOverview {
            restaurant,
            overview: first,
            form: overview_form(json!(11), "brunch"),
        })
        .expect("update");

    let all = restaurants.query(ListRestaurants).expect("list");
    let overview = &all[0].overview;
    assert_eq!(overview.len(), 2);
    assert_eq!(overview[0].overview_id, first);
    assert_eq!(overview[0].time, "brunch");
    assert_eq!(overview[0].cost, 11.0);
    assert_eq!(overview[1].overview_id, second);
    assert_eq!(overview[1].cost, 12.5);
}

#[test]
fn append_to_missing_restaurant_is_not_found() {
    let restaurants = Restaurants::new(junk_drawer::seeded_pool(), CustomerMatch::Exact);
    let err = restaurants
        .execute(AppendOverview {
            restaurant: IdGen::new().generate(),
            form: serde_json::from_value(json!({"cost": 1, "time": "now", "date": "today"}))
                .expect("form"),
        })
        .expect_err("missing");
    assert!(matches!(err, AppError::NotFound("restaurant")), "{:?}", err);
}

#[test]
fn search_projects_names_only() {
    let restaurants = Restaurants::new(junk_drawer::seeded_pool(), CustomerMatch::Exact);
    restaurants
        .execute(CreateRestaurant(ah_hock()))
        .expect("create");

    let found = restaurants
        .query(SearchRestaurants(SearchParams {
            remarks: Some("good,cheap".to_string()),
            customers: Some("Bob".to_string()),
            ..Default::default()
        }))
        .expect("search");
    assert_eq!(
        found,
        vec![json!({
            "name": "Ah Hock",
            "menu": { "name": "Chicken Rice" },
            "critiques": [{ "name": "Seth" }],
        })]
    );

    let none = restaurants
        .query(SearchRestaurants(SearchParams {
            name: Some("zzz".to_string()),
            ..Default::default()
        }))
        .expect("search");
    assert!(none.is_empty());
}

#[test]
fn delete_twice_is_not_found() {
    let restaurants = Restaurants::new(junk_drawer::seeded_pool(), CustomerMatch::Exact);
    let id = restaurants
        .execute(CreateRestaurant(ah_hock()))
        .expect("create");

    restaurants.execute(DeleteRestaurant(id)).expect("delete");
    let err = restaurants
        .execute(DeleteRestaurant(id))
        .expect_err("already gone");
    assert!(matches!(err, AppError::NotFound("restaurant")), "{:?}", err);
}
