use std::collections::HashMap;

use crate::config::Config;
use crate::core::CategoryDefault;

/// Looks up default duration and display order by category name.
///
/// Names are matched case-insensitively after trimming. Unknown categories
/// get the configured fallbacks.
#[derive(Debug, Clone)]
pub struct DurationResolver {
    defaults: HashMap<String, CategoryDefault>,
    fallback_duration_days: u32,
    fallback_display_order: i32,
}

impl DurationResolver {
    pub fn new(defaults: Vec<CategoryDefault>, config: &Config) -> Self {
        let defaults = defaults
            .into_iter()
            .map(|d| (normalize(&d.name), d))
            .collect();
        Self {
            defaults,
            fallback_duration_days: config.fallback_duration_days.max(1),
            fallback_display_order: config.fallback_display_order,
        }
    }

    /// Default for `category`, or the fallback entry.
    pub fn resolve(&self, category: &str) -> CategoryDefault {
        match self.defaults.get(&normalize(category)) {
            Some(found) => CategoryDefault {
                duration_days: found.duration_days.max(1),
                ..found.clone()
            },
            None => CategoryDefault {
                name: category.to_string(),
                duration_days: self.fallback_duration_days,
                display_order: self.fallback_display_order,
            },
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
