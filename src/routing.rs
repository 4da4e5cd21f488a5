use serde::{Deserialize, Serialize};
use validator::Validate;

/// Sends rows for URLs containing `pattern` to the sheet range `range`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Route {
    #[validate(length(min = 1))]
    pub pattern: String,

    #[validate(length(min = 1))]
    pub range: String,
}

impl Route {
    pub fn new(pattern: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            range: range.into(),
        }
    }

    /// Case-sensitive substring containment.
    pub fn matches(&self, url: &str) -> bool {
        url.contains(&self.pattern)
    }
}

pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new("i-travel.com.ua", "Results_NEO!A1:I"),
        Route::new("goit.global", "Results_Goit!A1:I"),
    ]
}

/// Ordered route table; the first matching route wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn resolve(&self, url: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(url))
    }
}
