/// Builds a [`Record`](crate::Record) from `label => value` pairs, in order.
///
/// # Examples
///
/// ```rust
/// use ltsv_helper::record;
///
/// let r = record! {
///     "host" => "127.0.0.1",
///     "status" => 200,
/// };
/// assert_eq!(r.get("status"), Some("200"));
/// assert_eq!(r.labels().collect::<Vec<_>>(), vec!["host", "status"]);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };

    ($($label:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.insert(::std::string::ToString::to_string(&$label), ::std::string::ToString::to_string(&$value));
        )+
        record
    }};
}

#[cfg(test)]
mod tests {
    use crate::Record;

    #[test]
    fn test_record_macro_empty() {
        assert_eq!(record!(), Record::new());
    }

    #[test]
    fn test_record_macro_last_write_wins() {
        let r = record! { "a" => 1, "b" => 2.5, "a" => "x" };
        assert_eq!(r.len(), 2);
        assert_eq!(r.get("a"), Some("x"));
        assert_eq!(r.get("b"), Some("2.5"));
    }
}
