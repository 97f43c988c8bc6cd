use super::to_storage_key;

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
    ("life", "lives"),
    ("wife", "wives"),
    ("knife", "knives"),
    ("leaf", "leaves"),
    ("half", "halves"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Pluralizes a single lowercase English word.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return plural.to_string();
    }
    if IRREGULAR.iter().any(|(_, plural)| *plural == word) {
        return word.to_string();
    }

    if ["ss", "us", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{}es", word);
    }
    if word.ends_with('s') {
        // already plural
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('y')
        && stem.chars().last().is_some_and(|ch| !is_vowel(ch))
    {
        return format!("{}ies", stem);
    }
    format!("{}s", word)
}

/// Reduces a Rust type path to its bare identifier.
///
/// `&my_app::models::UserProfile<T>` becomes `UserProfile`.
pub fn simple_type_name(type_name: &str) -> &str {
    let without_ref = type_name.trim_start_matches('&').trim_start_matches("mut ");
    let without_generics = without_ref.split('<').next().unwrap_or(without_ref);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}

/// Derives a relation name from a type name: underscored, last word pluralized.
///
/// `UserProfile` becomes `user_profiles`, `Person` becomes `people`.
pub fn tableize(type_name: &str) -> String {
    let underscored = to_storage_key(simple_type_name(type_name));
    match underscored.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, pluralize(last)),
        None => pluralize(&underscored),
    }
}

/// Table name for a type, resolved from its declared Rust name.
pub fn table_name_of<T: ?Sized>() -> String {
    tableize(std::any::type_name::<T>())
}

/// Table name for the runtime type of `value`.
pub fn table_name_for<T: ?Sized>(_value: &T) -> String {
    table_name_of::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Model;
    struct UserProfile;

    #[test]
    fn test_pluralize_rules() {
        assert_eq!(pluralize("model"), "models");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("branch"), "branches");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("people"), "people");
        assert_eq!(pluralize("sheep"), "sheep");
        assert_eq!(pluralize("models"), "models");
    }

    #[test]
    fn test_tableize() {
        assert_eq!(tableize("Model"), "models");
        assert_eq!(tableize("UserProfile"), "user_profiles");
        assert_eq!(tableize("crate::domain::Person"), "people");
        assert_eq!(tableize("Wrapper<crate::Inner>"), "wrappers");
    }

    #[test]
    fn test_table_from_static_context() {
        assert_eq!(table_name_of::<Model>(), "models");
        assert_eq!(table_name_of::<UserProfile>(), "user_profiles");
    }

    #[test]
    fn test_table_from_instance_context() {
        let model = Model;
        assert_eq!(table_name_for(&model), "models");
    }
}
