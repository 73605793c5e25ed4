use hostbind_derive::hostbind_error;
use std::borrow::Cow;

#[hostbind_error]
pub enum GatedError {
    #[cfg(any())]
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[cfg(all())]
    #[error("Parse failure{}: {source}", format_context(.context))]
    Parse { source: std::num::ParseIntError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn parse(raw: &str) -> Result<u32, GatedError> {
    Ok(raw.parse::<u32>()?)
}

fn main() {
    let err = parse("nope").context("Reading port").unwrap_err();
    assert_eq!(err.kind(), "Parse");
    assert!(err.to_string().starts_with("Parse failure (Reading port): "));
    assert_eq!(GatedError::from("boom").kind(), "Internal");
}
