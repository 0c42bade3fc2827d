use serde::Deserialize;

use infra::filter::Filter;

/// Fields kept in search results.
pub const SEARCH_PROJECTION: &[&str] = &["name", "menu.name", "critiques.name"];

/// Optional search terms from the query string. The list-valued ones are
/// comma separated.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub name: Option<String>,
    pub menu: Option<String>,
    pub customers: Option<String>,
    pub remarks: Option<String>,
    pub critiques: Option<String>,
}

impl SearchParams {
    pub fn to_filter(&self) -> Filter {
        let mut fragments = Vec::new();

        if let Some(name) = term(&self.name) {
            fragments.push(Filter::contains("name", name));
        }
        if let Some(menu) = term(&self.menu) {
            fragments.push(Filter::contains("menu.name", menu));
        }
        let customers = list(&self.customers);
        if !customers.is_empty() {
            fragments.push(Filter::one_of("customers.name", &customers));
        }
        let remarks = list(&self.remarks);
        if !remarks.is_empty() {
            fragments.push(Filter::contains_all("remarks", &remarks));
        }
        let critiques = list(&self.critiques);
        if !critiques.is_empty() {
            fragments.push(Filter::one_of("critiques.name", &critiques));
        }

        Filter::all_of(fragments)
    }
}

fn term(param: &Option<String>) -> Option<&str> {
    param.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn list(param: &Option<String>) -> Vec<&str> {
    param
        .as_deref()
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn params(name: Option<&str>, customers: Option<&str>, remarks: Option<&str>) -> SearchParams {
        SearchParams {
            name: name.map(str::to_string),
            customers: customers.map(str::to_string),
            remarks: remarks.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn no_parameters_match_everything() {
        assert_eq!(SearchParams::default().to_filter(), Filter::All);
        assert_eq!(params(Some(" "), Some(",,"), Some("")).to_filter(), Filter::All);
    }

    #[test]
    fn single_parameter_is_not_wrapped() {
        assert_eq!(
            params(Some("hock"), None, None).to_filter(),
            Filter::contains("name", "hock")
        );
    }

    #[test]
    fn ands_every_given_parameter() {
        let filter = params(Some("hock"), Some("Alice, Bob"), Some("good,cheap")).to_filter();
        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::contains("name", "hock"),
                Filter::one_of("customers.name", &["Alice", "Bob"]),
                Filter::contains_all("remarks", &["good", "cheap"]),
            ])
        );
    }

    #[test]
    fn remarks_must_all_match() {
        let doc = json!({"name": "Ah Hock", "remarks": ["Good food", "Cheap"]});
        assert!(params(None, None, Some("good,CHEAP")).to_filter().matches(&doc));
        assert!(!params(None, None, Some("good,slow")).to_filter().matches(&doc));
    }

    #[test]
    fn menu_matches_case_insensitively() {
        let search = SearchParams {
            menu: Some("rice".to_string()),
            ..Default::default()
        };
        let doc = json!({"menu": {"_id": "menu-x", "name": "Chicken Rice"}});
        assert!(search.to_filter().matches(&doc));
    }

    #[test]
    fn critiques_match_any_listed_name() {
        let search = SearchParams {
            critiques: Some("Seth,Nobody".to_string()),
            ..Default::default()
        };
        let doc = json!({"critiques": [{"_id": "critique-x", "name": "Seth"}]});
        assert!(search.to_filter().matches(&doc));
    }
}
