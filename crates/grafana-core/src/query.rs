//! Convenience builder for HTTP query parameters.
//!
//! Pairs keep their insertion order and a key may appear more than once, which is how
//! Grafana expects multi-valued filters such as `tags=a&tags=b`.

use std::fmt::Display;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: ToString,
    {
        if let Some(value) = value {
            self.pairs.push((key, value.to_string()));
        }
    }

    /// Append using a mapping function when the value is present.
    pub fn push_opt_with<T, F>(&mut self, key: &'static str, value: Option<T>, mut map: F)
    where
        F: FnMut(T) -> String,
    {
        if let Some(value) = value {
            self.pairs.push((key, map(value)));
        }
    }

    /// Append one pair per value, repeating the key.
    pub fn push_all<I, T>(&mut self, key: &'static str, values: I)
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        self.pairs
            .extend(values.into_iter().map(|value| (key, value.to_string())));
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key, value.to_string()));
    }

    /// Append every pair of `other`, after the pairs already present.
    pub fn append(&mut self, other: Self) {
        self.pairs.extend(other.pairs);
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::QueryParams;

    #[test]
    fn push_opt_skips_none() {
        let mut params = QueryParams::new();
        params.push_opt("dashboardId", Option::<i64>::None);
        assert!(params.is_empty());
    }

    #[test]
    fn push_opt_with_applies_mapper() {
        let mut params = QueryParams::new();
        params.push_opt_with("limit", Some(5u32), |v| format!("{v:02}"));
        assert_eq!(params.into_pairs(), vec![("limit", "05".to_string())]);
    }

    #[test]
    fn push_all_repeats_key() {
        let mut params = QueryParams::new();
        params.push("type", "annotation");
        params.push_all("tags", ["deploy", "prod"]);
        assert_eq!(
            params.into_pairs(),
            vec![
                ("type", "annotation".to_string()),
                ("tags", "deploy".to_string()),
                ("tags", "prod".to_string()),
            ]
        );
    }

    #[test]
    fn append_keeps_order_and_duplicates() {
        let mut params = QueryParams::new();
        params.push("tags", "deploy");

        let mut extra = QueryParams::new();
        extra.push("matchAny", true);
        extra.push("tags", "prod");
        params.append(extra);

        assert_eq!(
            params.into_pairs(),
            vec![
                ("tags", "deploy".to_string()),
                ("matchAny", "true".to_string()),
                ("tags", "prod".to_string()),
            ]
        );
    }
}
