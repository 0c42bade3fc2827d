use infra::documents::DocMeta;
use infra::ids::Id;

use super::models::{NewRestaurant, Restaurant};
use super::resolver::Resolved;

/// Builds the document to insert for a checked form. The overview list always
/// starts out empty.
pub fn compose(id: Id<Restaurant>, form: NewRestaurant, resolved: Resolved) -> Restaurant {
    let Resolved {
        menu,
        customers,
        critiques,
    } = resolved;

    Restaurant {
        meta: DocMeta::new_with_id(id),
        name: form.name,
        block_no: form.block_no,
        address: form.address,
        zipcode: form.zipcode,
        customers,
        menu,
        overall: form.overall,
        recommendation: form.recommendation,
        remarks: form.remarks,
        critiques,
        overview: Vec::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::{Canonical, Critique, Customer, Menu, Reference};
    use infra::ids::IdGen;
    use serde_json::json;

    #[test]
    fn embeds_only_id_and_name_snapshots() {
        let menu = Menu::new(Menu::id_for("Chicken Rice"), "Chicken Rice");
        let alice = Customer::new(Customer::id_for("Alice"), "Alice");
        let seth = Critique::new(Critique::id_for("Seth"), "Seth");
        let id = IdGen::new().generate();

        let form = NewRestaurant {
            name: "Ah Hock".to_string(),
            block_no: Some("12".to_string()),
            address: None,
            zipcode: None,
            customers: vec!["Alice".to_string()],
            menu: "Chicken Rice".to_string(),
            overall: Some(4.0),
            recommendation: None,
            remarks: vec!["Good".to_string()],
            critiques: vec!["Seth".to_string()],
        };
        let resolved = Resolved {
            menu: Reference::of(&menu),
            customers: vec![Reference::of(&alice)],
            critiques: vec![Reference::of(&seth)],
        };

        let restaurant = compose(id, form, resolved);
        let json = serde_json::to_value(&restaurant).expect("to_value");

        assert_eq!(
            json,
            json!({
                "_id": id.to_string(),
                "_version": "",
                "name": "Ah Hock",
                "block_no": "12",
                "customers": [{ "_id": alice.meta.id.to_string(), "name": "Alice" }],
                "menu": { "_id": menu.meta.id.to_string(), "name": "Chicken Rice" },
                "overall": 4.0,
                "remarks": ["Good"],
                "critiques": [{ "_id": seth.meta.id.to_string(), "name": "Seth" }],
                "overview": [],
            })
        );
    }
}
