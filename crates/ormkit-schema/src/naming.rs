//! Naming conventions: inflection and case conversion.
//!
//! Relationship defaults are derived from names (`todos` targets `Todo`,
//! `manager` is keyed by `managerId`), so these helpers must be stable.

use convert_case::{Case, Casing};

/// Words whose singular and plural forms are the same.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

/// (singular, plural) pairs that do not follow the suffix rules.
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("status", "statuses"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

/// Convert to PascalCase (`todo_item` -> `TodoItem`).
pub fn pascal(word: &str) -> String {
    word.to_case(Case::Pascal)
}

/// Convert to camelCase (`TodoUser` -> `todoUser`).
pub fn camel(word: &str) -> String {
    word.to_case(Case::Camel)
}

/// Convert to snake_case (`TodoUser` -> `todo_user`).
pub fn snake(word: &str) -> String {
    word.to_case(Case::Snake)
}

/// Convert to a human-readable title (`createdAt` -> `Created At`).
pub fn title(word: &str) -> String {
    word.to_case(Case::Title)
}

/// Singular form of the last word of `word`, preserving the leading text.
pub fn singular(word: &str) -> String {
    let lower = word.to_lowercase();

    if UNCOUNTABLE.iter().any(|u| lower.ends_with(u)) {
        return word.to_string();
    }
    for (single, many) in IRREGULAR {
        if lower.ends_with(many) {
            return splice(word, many.len(), single);
        }
    }

    if lower.len() > 3 && lower.ends_with("ies") {
        return splice(word, 3, "y");
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    if lower.ends_with('s') && lower.len() > 1 {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Plural form of the last word of `word`, preserving the leading text.
pub fn plural(word: &str) -> String {
    let lower = word.to_lowercase();

    if UNCOUNTABLE.iter().any(|u| lower.ends_with(u)) {
        return word.to_string();
    }
    for (single, many) in IRREGULAR {
        if lower.ends_with(single) {
            return splice(word, single.len(), many);
        }
    }

    let mut chars = lower.chars().rev();
    let last = chars.next();
    let before = chars.next();
    match (before, last) {
        (Some(b), Some('y')) if !"aeiou".contains(b) => splice(word, 1, "ies"),
        (_, Some('s' | 'x' | 'z')) => format!("{word}es"),
        (Some('c' | 's'), Some('h')) => format!("{word}es"),
        _ => format!("{word}s"),
    }
}

/// Default target entity for a relationship name (`todos` -> `Todo`).
pub fn target_entity_name(relationship: &str) -> String {
    pascal(&singular(relationship))
}

/// Default foreign key name for an entity or relationship name
/// (`User` -> `userId`, `manager` -> `managerId`).
pub fn foreign_key_name(stem: &str, suffix: &str) -> String {
    format!("{}{suffix}", camel(stem))
}

/// Default join entity name: both endpoint names sorted and concatenated.
///
/// Renaming either endpoint renames the join entity.
pub fn join_entity_name(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{first}{second}")
}

/// Storage collection name for an entity (`TodoUser` -> `todo_users`).
pub fn collection_name(namespace: Option<&str>, entity: &str) -> String {
    let base = snake(&plural(entity));
    match namespace {
        Some(ns) => format!("{}_{base}", snake(ns)),
        None => base,
    }
}

/// Replace the last `len` bytes of `word` with `replacement`, keeping the
/// case of the first replaced character.
fn splice(word: &str, len: usize, replacement: &str) -> String {
    let head = &word[..word.len() - len];
    let tail = &word[word.len() - len..];
    let upper = tail.chars().next().is_some_and(char::is_uppercase);

    let mut out = String::with_capacity(head.len() + replacement.len());
    out.push_str(head);
    if upper {
        let mut rest = replacement.chars();
        if let Some(first) = rest.next() {
            out.extend(first.to_uppercase());
            out.push_str(rest.as_str());
        }
    } else {
        out.push_str(replacement);
    }
    out
}
