use error_derive::Error;

/// Errors caused by invalid arguments to the public API.
///
/// Malformed CSS text never produces an error, it resolves to the invalid color
/// of the requested [Format](crate::Format) instead.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[msg = "{0} is not a number."]
    NotANumber(String),

    #[msg = "{0} is not between {1} and {2}."]
    OutOfRange(String, f64, f64),

    #[msg = "Unexpected array length {0}."]
    UnexpectedArrayLength(usize),
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn messages() {
        assert_eq!(
            Error::NotANumber("foo".to_string()).to_string(),
            "foo is not a number."
        );
        assert_eq!(
            Error::OutOfRange("256".to_string(), 0., 255.).to_string(),
            "256 is not between 0 and 255."
        );
        assert_eq!(
            Error::UnexpectedArrayLength(2).to_string(),
            "Unexpected array length 2."
        );
    }
}
