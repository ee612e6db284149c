//! JavaBeans-style naming for generated records, mappers and properties.

use heck::{ToLowerCamelCase, ToUpperCamelCase};

use crate::java_type::JavaType;

/// Default property name for a column (`first_name` -> `firstName`).
pub fn property_name(column_name: &str) -> String {
    column_name.to_lower_camel_case()
}

/// Default domain object name for a table (`user_skills` -> `UserSkills`).
pub fn domain_object_name(table_name: &str) -> String {
    table_name.to_upper_camel_case()
}

/// Lowercase the first character unless the second one is uppercase too,
/// so `URL` stays `URL` while `User` becomes `user`.
pub fn valid_property_name(input: &str) -> String {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (None, _) => String::new(),
        (Some(first), None) => first.to_lowercase().collect(),
        (Some(first), Some(second)) => {
            if first.is_uppercase() && !second.is_uppercase() {
                let mut out: String = first.to_lowercase().collect();
                out.push_str(&input[first.len_utf8()..]);
                out
            } else {
                input.to_string()
            }
        }
    }
}

pub fn getter_name(property: &str, java_type: &JavaType) -> String {
    let prefix = if java_type.is_boolean_primitive() {
        "is"
    } else {
        "get"
    };
    format!("{prefix}{}", capitalize_property(property))
}

pub fn setter_name(property: &str) -> String {
    format!("set{}", capitalize_property(property))
}

// `xCoordinate` keeps its case (`getxCoordinate`), matching the JavaBeans spec.
fn capitalize_property(property: &str) -> String {
    let mut chars = property.chars();
    match (chars.next(), chars.next()) {
        (Some(first), second) if first.is_lowercase() && !second.is_some_and(char::is_uppercase) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&property[first.len_utf8()..]);
            out
        }
        _ => property.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_names_from_snake_case() {
        assert_eq!(property_name("seq_num"), "seqNum");
        assert_eq!(property_name("ID"), "id");
        assert_eq!(domain_object_name("user_skills"), "UserSkills");
        assert_eq!(domain_object_name("PKONLY"), "Pkonly");
    }

    #[test]
    fn valid_property_name_respects_acronyms() {
        assert_eq!(valid_property_name("User"), "user");
        assert_eq!(valid_property_name("URL"), "URL");
        assert_eq!(valid_property_name("A"), "a");
    }

    #[test]
    fn accessor_names_follow_java_beans() {
        assert_eq!(getter_name("firstName", &JavaType::string()), "getFirstName");
        assert_eq!(getter_name("active", &JavaType::new("boolean")), "isActive");
        assert_eq!(setter_name("xCoordinate"), "setxCoordinate");
        assert_eq!(setter_name("id"), "setId");
    }
}
