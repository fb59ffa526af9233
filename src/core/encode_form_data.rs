use std::collections::BTreeMap;
use url::form_urlencoded;

/// Encode a form mapping as `application/x-www-form-urlencoded` text.
/// Pairs come out in key order.
pub(crate) fn encode_form_data(form_data: &BTreeMap<String, String>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form_data.iter())
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn joins_pairs_with_ampersand() {
        assert_eq!(encode_form_data(&form(&[("b", "2"), ("a", "1")])), "a=1&b=2");
    }

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(
            encode_form_data(&form(&[("q", "a b&c=d")])),
            "q=a+b%26c%3Dd"
        );
    }

    #[test]
    fn empty_mapping_encodes_to_empty_string() {
        assert_eq!(encode_form_data(&BTreeMap::new()), "");
    }
}
