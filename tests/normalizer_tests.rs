use db2model::parser::names::{is_keyword, to_attname, to_model, uncamel};
use proptest::prelude::*;

#[test]
fn uncamel_matches_known_conversions() {
    let cases = [
        ("CamelCase", "camel_case"),
        ("CamelCamelCase", "camel_camel_case"),
        ("Camel2Camel2Case", "camel2_camel2_case"),
        ("getHTTPResponseCode", "get_http_response_code"),
        ("get2HTTPResponseCode", "get2_http_response_code"),
        ("HTTPResponseCode", "http_response_code"),
        ("HTTPResponseCodeXYZ", "http_response_code_xyz"),
    ];
    for (input, expected) in cases {
        assert_eq!(uncamel(input), expected, "uncamel({input:?})");
    }
}

#[test]
fn attnames_never_shadow_keywords() {
    for word in ["class", "def", "return", "lambda", "Import", "WHILE"] {
        let attname = to_attname(word);
        assert!(!is_keyword(&attname), "{word} -> {attname}");
        assert!(attname.ends_with("_field"));
    }
}

#[test]
fn model_names_for_common_tables() {
    assert_eq!(to_model("auth_user"), "AuthUser");
    assert_eq!(to_model("django_content_type"), "DjangoContentType");
    assert_eq!(to_model("OrderItems"), "OrderItems");
    assert_eq!(to_model("true"), "TrueModel");
}

proptest! {
    #[test]
    fn attname_is_a_valid_lowercase_identifier(input in "\\PC{0,40}") {
        let attname = to_attname(&input);
        prop_assert!(!attname.is_empty());
        prop_assert!(attname
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        prop_assert!(!attname.starts_with(|c: char| c.is_ascii_digit()));
        prop_assert!(!attname.starts_with('_') && !attname.ends_with('_'));
        prop_assert!(!attname.contains("__"));
        prop_assert!(!is_keyword(&attname));
    }

    #[test]
    fn attname_is_idempotent(input in "[A-Za-z0-9_ $-]{0,32}") {
        let once = to_attname(&input);
        prop_assert_eq!(to_attname(&once), once);
    }

    #[test]
    fn model_name_is_a_valid_class_identifier(input in "\\PC{0,40}") {
        let model = to_model(&input);
        prop_assert!(model.chars().all(|c| c.is_ascii_alphanumeric()));
        prop_assert!(model.starts_with(|c: char| c.is_ascii_uppercase()));
        prop_assert!(!is_keyword(&model));
    }

    #[test]
    fn model_name_is_idempotent(input in "[A-Za-z0-9_ -]{0,32}") {
        let once = to_model(&input);
        prop_assert_eq!(to_model(&once), once);
    }
}
