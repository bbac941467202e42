//! Built-in seed list used when durable state is absent or unreadable.

use crate::model::record::{NewTechnology, TechnologyRecord};

const SEED: &[(&str, &str, &str)] = &[
    ("React Components", "Basic components, props and lifecycle", "frontend"),
    ("Node.js Basics", "Server-side JavaScript fundamentals", "backend"),
    ("React Hooks", "All core hooks: useEffect, useContext, useMemo", "frontend"),
    ("Express.js", "Building REST APIs", "backend"),
    ("React Router", "Navigation in React applications", "frontend"),
    ("MongoDB", "Working with a NoSQL database", "database"),
    ("Redux Toolkit", "Application state management", "frontend"),
    ("Docker", "Containerizing applications", "devops"),
];

/// Returns the seed records, ids `1..=n`, all `planned`, created `today`.
pub fn default_records(today: &str) -> Vec<TechnologyRecord> {
    SEED.iter()
        .zip(1..)
        .map(|(&(title, description, category), id)| {
            TechnologyRecord::from_new(id, NewTechnology::new(title, description, category), today)
        })
        .collect()
}
