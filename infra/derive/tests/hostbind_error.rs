use hostbind_derive::hostbind_error;
use std::borrow::Cow;

#[hostbind_error]
pub enum LookupError {
    #[error("Parse failure{}: {source}", format_context(.context))]
    Parse { source: std::num::ParseIntError, context: Option<Cow<'static, str>> },

    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn parse(raw: &str) -> Result<u32, LookupError> {
    Ok(raw.parse::<u32>()?)
}

#[test]
fn hostbind_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/hostbind_error_pass.rs");
    t.pass("tests/ui/hostbind_error_cfg_pass.rs");
}

#[test]
fn source_errors_convert_with_question_mark() {
    let err = parse("not-a-number").unwrap_err();
    assert!(matches!(err, LookupError::Parse { context: None, .. }));
    assert_eq!(err.kind(), "Parse");
}

#[test]
fn context_is_attached_to_source_results() {
    let err = "x".parse::<u32>().context("reading port").unwrap_err();
    assert!(err.to_string().starts_with("Parse failure (reading port)"));
}

#[test]
fn context_is_attached_to_own_results() {
    let res: Result<(), LookupError> =
        Err(LookupError::NotFound { message: "acme.example".into(), context: None });
    let err = res.context("loading domain").unwrap_err();
    assert_eq!(err.to_string(), "Not found (loading domain): acme.example");
}

#[test]
fn strings_convert_into_internal_variant() {
    let err = LookupError::from(String::from("unexpected state"));
    assert_eq!(err.kind(), "Internal");
    assert_eq!(err.to_string(), "Internal error: unexpected state");
}
