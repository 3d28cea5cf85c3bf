use heck::{ToPascalCase, ToShoutySnakeCase};

/// Convert a schema name to a TypeScript declaration name
///
/// - `users_user_full` → `UsersUserFull`
/// - `users.get params` → `UsersGetParams`
/// - `messages.getHistory_response` → `MessagesGetHistoryResponse`
pub fn interface_name(name: &str) -> String {
    name.to_pascal_case()
}

/// Key of an enum lookup constant entry, derived from a display name
pub fn enum_key_name(display_name: &str) -> String {
    let key = display_name.to_shouty_snake_case();

    if key.is_empty() {
        "UNKNOWN".to_string()
    } else if key.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{key}")
    } else {
        key
    }
}

/// Section of an object definition: `users_user_full` → `users`
pub fn object_section(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

/// Section of a method: `users.get` → `users`
pub fn method_section(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Whether a property name must be quoted to be a valid TypeScript key
pub fn needs_quotes(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return true,
    }
    !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_name() {
        assert_eq!(interface_name("users_user_full"), "UsersUserFull");
        assert_eq!(interface_name("users.get params"), "UsersGetParams");
        assert_eq!(interface_name("base_bool_int"), "BaseBoolInt");
        assert_eq!(
            interface_name("messages.getHistory_response"),
            "MessagesGetHistoryResponse"
        );
    }

    #[test]
    fn test_enum_key_name() {
        assert_eq!(enum_key_name("male"), "MALE");
        assert_eq!(enum_key_name("not specified"), "NOT_SPECIFIED");
        assert_eq!(enum_key_name("part-time"), "PART_TIME");
        assert_eq!(enum_key_name("4k"), "_4K");
        assert_eq!(enum_key_name(""), "UNKNOWN");
    }

    #[test]
    fn test_sections() {
        assert_eq!(object_section("users_user_full"), "users");
        assert_eq!(object_section("base"), "base");
        assert_eq!(method_section("messages.getHistory"), "messages");
    }

    #[test]
    fn test_needs_quotes() {
        assert!(!needs_quotes("user_id"));
        assert!(!needs_quotes("uuid4"));
        assert!(!needs_quotes("_foo"));

        assert!(needs_quotes("4uuid"));
        assert!(needs_quotes("user-id"));
        assert!(needs_quotes("user&id"));
        assert!(needs_quotes("идентификатор"));
        assert!(needs_quotes(""));
    }
}
