/// Duplicate-key merge policy, locked in at the key's first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Concatenate every occurrence's content, in order (the default).
    Append,
    /// Keep only the content written during the first occurrence.
    First,
    /// Keep only the content written during the most recent occurrence.
    Last,
}

impl Policy {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("f") => Policy::First,
            Some("l") => Policy::Last,
            Some("a") | None => Policy::Append,
            Some(_) => Policy::Append,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_policy_letters() {
        assert_eq!(Policy::from_arg(Some("f")), Policy::First);
        assert_eq!(Policy::from_arg(Some("l")), Policy::Last);
        assert_eq!(Policy::from_arg(Some("a")), Policy::Append);
    }

    #[test]
    fn unset_or_unknown_arg_defaults_to_append() {
        assert_eq!(Policy::from_arg(None), Policy::Append);
        assert_eq!(Policy::from_arg(Some("x")), Policy::Append);
    }
}
