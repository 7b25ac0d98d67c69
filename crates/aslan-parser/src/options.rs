use aslan_common::ConfigError;

/// Immutable parser settings selected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    pub default_field_name: String,
    pub append_separator: String,
    pub strict_start: bool,
    pub strict_end: bool,
    pub multi_aslan_output: bool,
    pub collapse_object_start_whitespace: bool,
    pub max_object_depth: Option<u32>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            default_field_name: "_default".to_string(),
            append_separator: String::new(),
            strict_start: false,
            strict_end: false,
            multi_aslan_output: false,
            collapse_object_start_whitespace: false,
            max_object_depth: None,
        }
    }
}

impl ParserOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_field_name.is_empty() {
            return Err(ConfigError::EmptyDefaultFieldName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference() {
        let opts = ParserOptions::default();
        assert_eq!(opts.default_field_name, "_default");
        assert_eq!(opts.append_separator, "");
        assert!(!opts.strict_start);
        assert!(!opts.strict_end);
        assert!(!opts.multi_aslan_output);
        assert!(!opts.collapse_object_start_whitespace);
        assert_eq!(opts.max_object_depth, None);
    }

    #[test]
    fn rejects_empty_default_field_name() {
        let opts = ParserOptions {
            default_field_name: String::new(),
            ..ParserOptions::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::EmptyDefaultFieldName));
    }
}
