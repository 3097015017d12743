//! Naming helpers for schema members

/// Derive a GraphQL field name from a Rust member name.
///
/// `create_user` becomes `createUser`. Leading underscores are kept.
pub fn member_to_field_name(member: &str) -> String {
    let trimmed = member.trim_start_matches('_');
    let mut name = "_".repeat(member.len() - trimmed.len());

    for (index, segment) in trimmed.split('_').filter(|s| !s.is_empty()).enumerate() {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                name.extend(first.to_lowercase());
            } else {
                name.extend(first.to_uppercase());
            }
            name.push_str(chars.as_str());
        }
    }

    name
}

/// Whether `name` is a GraphQL name that is not reserved for introspection
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic());

    starts_well
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !name.starts_with("__")
}
