//! Conversion and rule behavior of the scalar kinds.

use chrono::{TimeZone, Utc};
use models::{binary, boolean, date, number, string, ValidationOptions, Value};
use regex::Regex;

fn first_code(result: models::Validated) -> String {
    let mut error = result.error.expect("validation must fail");
    error.details.remove(0).code
}

mod strings {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_non_strings_even_with_conversion() {
        assert_eq!(first_code(string().validate(Value::from(123))), "string.base");
        assert_eq!(first_code(string().validate(Value::from(true))), "string.base");
    }

    #[test]
    fn rejects_the_empty_string() {
        assert_eq!(first_code(string().validate(Value::from(""))), "any.empty");
        // unless explicitly allowed
        assert!(string().allow([""]).validate(Value::from("")).error.is_none());
    }

    #[test]
    fn length_rules_count_characters() {
        let schema = string()
            .min(2)
            .expect("valid limit")
            .max(3)
            .expect("valid limit");
        assert!(schema.validate(Value::from("ab")).error.is_none());
        assert_eq!(first_code(schema.validate(Value::from("a"))), "string.min");
        assert_eq!(first_code(schema.validate(Value::from("abcd"))), "string.max");

        let exact = string().length(2).expect("valid limit");
        assert_eq!(first_code(exact.validate(Value::from("abc"))), "string.length");
    }

    #[test]
    fn pattern_reports_the_pattern_or_its_name() {
        let re = Regex::new("^[0-9]+$").expect("valid pattern");
        assert_eq!(
            first_code(string().pattern(re.clone()).validate(Value::from("abc"))),
            "string.regex.base"
        );
        assert_eq!(
            first_code(
                string()
                    .pattern_named(re, "digits")
                    .validate(Value::from("abc"))
            ),
            "string.regex.name"
        );
    }

    #[test]
    fn trim_converts_or_validates() {
        let schema = string().trim();
        let trimmed = schema.validate(Value::from("  ab  "));
        assert!(trimmed.error.is_none());
        assert_eq!(trimmed.value, Some(Value::from("ab")));

        assert_eq!(
            first_code(schema.strict().validate(Value::from("  ab  "))),
            "string.trim"
        );
    }

    #[test]
    fn case_rules_convert_or_validate() {
        let lower = string().lowercase();
        let converted = lower.validate(Value::from("AB"));
        assert_eq!(converted.value, Some(Value::from("ab")));
        assert_eq!(
            first_code(lower.strict().validate(Value::from("AB"))),
            "string.lowercase"
        );

        let upper = string().uppercase().strict();
        assert_eq!(first_code(upper.validate(Value::from("ab"))), "string.uppercase");
    }

    #[test]
    fn alphanum_and_token() {
        assert!(string().alphanum().validate(Value::from("a1b2")).error.is_none());
        assert_eq!(
            first_code(string().alphanum().validate(Value::from("a b"))),
            "string.alphanum"
        );
        assert!(string().token().validate(Value::from("a_1")).error.is_none());
        assert_eq!(
            first_code(string().token().validate(Value::from("a-1"))),
            "string.token"
        );
    }

    #[test]
    fn insensitive_extends_the_allow_list() {
        let schema = string().valid(["Apple"]).insensitive();
        assert!(schema.validate(Value::from("apple")).error.is_none());
        assert!(schema.validate(Value::from("APPLE")).error.is_none());
        assert!(string()
            .valid(["Apple"])
            .validate(Value::from("apple"))
            .error
            .is_some());
    }
}

mod numbers {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_numeric_strings() {
        let result = number().validate(Value::from("5.5"));
        assert!(result.error.is_none());
        assert_eq!(result.value, Some(Value::from(5.5)));

        assert_eq!(first_code(number().validate(Value::from("five"))), "number.base");
        assert_eq!(first_code(number().validate(Value::from(""))), "number.base");
    }

    #[test]
    fn strict_mode_rejects_strings() {
        let options = ValidationOptions {
            convert: Some(false),
            ..ValidationOptions::default()
        };
        assert_eq!(
            first_code(number().validate_with(Value::from("5"), &options)),
            "number.base"
        );
    }

    #[test]
    fn comparison_rules() {
        let schema = number()
            .min(2)
            .expect("valid limit")
            .max(10)
            .expect("valid limit");
        assert!(schema.validate(Value::from(2)).error.is_none());
        assert_eq!(first_code(schema.validate(Value::from(1))), "number.min");
        assert_eq!(first_code(schema.validate(Value::from(11))), "number.max");

        assert_eq!(
            first_code(
                number()
                    .greater(5)
                    .expect("valid limit")
                    .validate(Value::from(5))
            ),
            "number.greater"
        );
        assert_eq!(
            first_code(
                number()
                    .less(5)
                    .expect("valid limit")
                    .validate(Value::from(5))
            ),
            "number.less"
        );
    }

    #[test]
    fn integer_requires_a_safe_integer() {
        assert!(number().integer().validate(Value::from(3)).error.is_none());
        assert_eq!(
            first_code(number().integer().validate(Value::from(3.5))),
            "number.integer"
        );
        assert_eq!(
            first_code(number().integer().validate(Value::from(2f64.powi(53)))),
            "number.integer"
        );
    }

    #[test]
    fn sign_rules() {
        assert_eq!(
            first_code(number().positive().validate(Value::from(0))),
            "number.positive"
        );
        assert_eq!(
            first_code(number().negative().validate(Value::from(1))),
            "number.negative"
        );
    }

    #[test]
    fn multiple_of() {
        let schema = number().multiple(3).expect("valid base");
        assert!(schema.validate(Value::from(9)).error.is_none());
        assert_eq!(
            first_code(schema.validate(Value::from(10))),
            "number.multiple"
        );
    }

    #[test]
    fn precision_rounds_when_converting() {
        let result = number().precision(2).validate(Value::from(1.239));
        assert!(result.error.is_none());
        assert_eq!(result.value, Some(Value::from(1.24)));

        assert_eq!(
            first_code(number().precision(2).strict().validate(Value::from(1.239))),
            "number.precision"
        );
    }
}

mod booleans {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_true_false_strings() {
        assert_eq!(
            boolean().validate(Value::from("true")).value,
            Some(Value::from(true))
        );
        assert_eq!(
            boolean().validate(Value::from("false")).value,
            Some(Value::from(false))
        );
        assert_eq!(first_code(boolean().validate(Value::from("yes"))), "boolean.base");
    }

    #[test]
    fn custom_truthy_tables_respect_insensitive() {
        let schema = boolean().truthy(["Y"]).falsy(["N"]);
        assert_eq!(
            schema.validate(Value::from("Y")).value,
            Some(Value::from(true))
        );
        // case differs and the node is case sensitive
        assert!(schema.validate(Value::from("y")).error.is_some());

        let insensitive = schema.insensitive();
        assert_eq!(
            insensitive.validate(Value::from("y")).value,
            Some(Value::from(true))
        );
        assert_eq!(
            insensitive.validate(Value::from("n")).value,
            Some(Value::from(false))
        );
    }

    #[test]
    fn numeric_truthy_markers() {
        let schema = boolean().truthy([1]).falsy([0]);
        assert_eq!(
            schema.validate(Value::from(1)).value,
            Some(Value::from(true))
        );
        assert_eq!(
            schema.validate(Value::from(0)).value,
            Some(Value::from(false))
        );
    }

    #[test]
    fn strict_mode_rejects_strings() {
        assert_eq!(
            first_code(boolean().strict().validate(Value::from("true"))),
            "boolean.base"
        );
    }
}

mod dates {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_strings_and_milliseconds() {
        let expected = Utc
            .with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
            .single()
            .expect("valid date");

        let from_string = date().validate(Value::from("2000-01-01"));
        assert_eq!(from_string.value, Some(Value::Date(expected)));

        let from_millis = date().validate(Value::from(expected.timestamp_millis() as f64));
        assert_eq!(from_millis.value, Some(Value::Date(expected)));

        assert_eq!(first_code(date().validate(Value::from("not a date"))), "date.base");
    }

    #[test]
    fn min_and_max_bounds() {
        let schema = date().min("1-1-2000 UTC").expect("parsable date");
        assert!(schema.validate(Value::from("2001-06-01")).error.is_none());
        assert_eq!(first_code(schema.validate(Value::from("1999-06-01"))), "date.min");

        let capped = date().max("1-1-2000 UTC").expect("parsable date");
        assert_eq!(first_code(capped.validate(Value::from("2001-06-01"))), "date.max");
    }

    #[test]
    fn now_is_a_moving_bound() {
        // any historical date is below "now"
        assert_eq!(
            first_code(
                date()
                    .min("now")
                    .expect("valid bound")
                    .validate(Value::from("2000-01-01"))
            ),
            "date.min"
        );
        assert!(date()
            .max("now")
            .expect("valid bound")
            .validate(Value::from("2000-01-01"))
            .error
            .is_none());
    }
}

mod binaries {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_strings_to_bytes() {
        let result = binary().validate(Value::from("abc"));
        assert_eq!(result.value, Some(Value::bytes(*b"abc")));

        assert_eq!(first_code(binary().validate(Value::from(5))), "binary.base");
    }

    #[test]
    fn size_rules_count_bytes() {
        let schema = binary()
            .min(2)
            .expect("valid limit")
            .max(3)
            .expect("valid limit");
        assert!(schema.validate(Value::bytes(*b"ab")).error.is_none());
        assert_eq!(first_code(schema.validate(Value::bytes(*b"a"))), "binary.min");
        assert_eq!(
            first_code(schema.validate(Value::bytes(*b"abcd"))),
            "binary.max"
        );
        assert_eq!(
            first_code(
                binary()
                    .length(2)
                    .expect("valid limit")
                    .validate(Value::bytes(*b"abc"))
            ),
            "binary.length"
        );
    }
}
