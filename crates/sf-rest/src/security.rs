//! Input validation for everything that ends up in a subrequest URL.
//!
//! Object names, field names and record ids come from record descriptors
//! and application code. They are checked here before being placed in a
//! URL path, and query text is always percent-encoded.
//!
//! ```rust
//! use busbar_sf_rest::security::{soql, url};
//!
//! let name = soql::escape_string("O'Brien");
//! assert_eq!(name, "O\\'Brien");
//!
//! assert!(url::is_valid_salesforce_id("001000000000001AAA"));
//! assert_eq!(url::encode_param("001/../x"), "001%2F..%2Fx");
//! ```

/// SOQL escaping and name validation.
pub mod soql {
    /// Escape a string value for use inside a SOQL string literal.
    ///
    /// ```rust
    /// use busbar_sf_rest::security::soql;
    ///
    /// let safe = soql::escape_string("O'Brien & Co.");
    /// assert_eq!(safe, "O\\'Brien & Co.");
    /// ```
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Escape a value for a LIKE pattern; `%` and `_` match literally.
    #[must_use]
    pub fn escape_like(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 8);
        for ch in escape_string(value).chars() {
            match ch {
                '%' => escaped.push_str("\\%"),
                '_' => escaped.push_str("\\_"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// A field name: an ASCII letter followed by letters, digits or `_`.
    ///
    /// ```rust
    /// use busbar_sf_rest::security::soql;
    ///
    /// assert!(soql::is_safe_field_name("Custom_Field__c"));
    /// assert!(!soql::is_safe_field_name("Bad'; DROP TABLE--"));
    /// ```
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        }
    }

    /// SObject names follow the field name rules.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }

    /// Join field names into a `fields=` list, or `None` if any is unsafe.
    #[must_use]
    pub fn field_list(fields: &[String]) -> Option<String> {
        if fields.iter().all(|f| is_safe_field_name(f)) {
            Some(fields.join(","))
        } else {
            None
        }
    }
}

/// URL encoding and id validation.
pub mod url {
    /// URL-encode a parameter value.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// Salesforce ids are 15 or 18 ASCII alphanumerics.
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        let len = id.len();
        (len == 15 || len == 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod soql_tests {
        use super::soql::*;

        #[test]
        fn test_escape_string_injection_attempts() {
            assert_eq!(escape_string("' OR '1'='1"), "\\' OR \\'1\\'=\\'1");
            assert_eq!(escape_string("line1\nline2"), "line1\\nline2");
            assert_eq!(escape_string("test\\path"), "test\\\\path");
        }

        #[test]
        fn test_escape_like() {
            assert_eq!(escape_like("100%"), "100\\%");
            assert_eq!(escape_like("O'Brien_%"), "O\\'Brien\\_\\%");
        }

        #[test]
        fn test_is_safe_field_name() {
            assert!(is_safe_field_name("Id"));
            assert!(is_safe_field_name("Custom_Field__c"));
            assert!(is_safe_field_name("X123"));

            assert!(!is_safe_field_name(""));
            assert!(!is_safe_field_name("123abc"));
            assert!(!is_safe_field_name("field.name"));
            assert!(!is_safe_field_name("field'name"));
        }

        #[test]
        fn test_field_list() {
            let fields = vec!["Id".to_string(), "Name".to_string()];
            assert_eq!(field_list(&fields), Some("Id,Name".to_string()));

            let fields = vec!["Id".to_string(), "Account.Name".to_string()];
            assert_eq!(field_list(&fields), None);
        }
    }

    mod url_tests {
        use super::url::*;

        #[test]
        fn test_encode_param() {
            assert_eq!(encode_param("SELECT Id FROM Account"), "SELECT%20Id%20FROM%20Account");
            assert_eq!(encode_param("a&b=c"), "a%26b%3Dc");
        }

        #[test]
        fn test_is_valid_salesforce_id() {
            assert!(is_valid_salesforce_id("001000000000001"));
            assert!(is_valid_salesforce_id("001000000000001AAA"));
            assert!(!is_valid_salesforce_id("001A"));
            assert!(!is_valid_salesforce_id("001/../../etc/pa"));
        }
    }
}
