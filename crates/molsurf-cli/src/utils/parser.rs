use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected {expected} comma-separated numbers in '{input}', found {found}.")]
    WrongCount {
        input: String,
        expected: usize,
        found: usize,
    },

    #[error("'{value}' in '{input}' is not a number.")]
    NotANumber { input: String, value: String },

    #[error("Molecule name cannot be empty in '{0}'.")]
    EmptyName(String),
}

/// Parses exactly `N` comma-separated floats, e.g. "1.0, -2, 3.5".
pub fn parse_floats<const N: usize>(input: &str) -> Result<[f64; N], ParseError> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(ParseError::WrongCount {
            input: input.to_string(),
            expected: N,
            found: parts.len(),
        });
    }
    let mut values = [0.0; N];
    for (slot, part) in values.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|_| ParseError::NotANumber {
            input: input.to_string(),
            value: part.to_string(),
        })?;
    }
    Ok(values)
}

/// Splits "NAME" or "NAME:CUTOFF".
pub fn parse_named_cutoff(input: &str) -> Result<(String, Option<f64>), ParseError> {
    let (name, cutoff) = match input.rsplit_once(':') {
        Some((name, cutoff)) => {
            let value = cutoff.trim().parse().map_err(|_| ParseError::NotANumber {
                input: input.to_string(),
                value: cutoff.to_string(),
            })?;
            (name.trim(), Some(value))
        }
        None => (input.trim(), None),
    };
    if name.is_empty() {
        return Err(ParseError::EmptyName(input.to_string()));
    }
    Ok((name.to_string(), cutoff))
}
