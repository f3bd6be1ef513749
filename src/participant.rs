use flanker_core::{FlankerError, Result};
use std::io::{BufRead, Write};

/// Takes the participant ID from the first argument, or asks on stdin.
pub fn participant_id<I, B>(mut args: I, input: B) -> Result<String>
where
    I: Iterator<Item = String>,
    B: BufRead,
{
    let raw = match args.next() {
        Some(arg) => arg,
        None => prompt(input)?,
    };
    validate(raw.trim())
}

fn prompt<B: BufRead>(mut input: B) -> Result<String> {
    print!("Participant ID: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}

// The ID ends up in file names.
fn validate(id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(FlankerError::Configuration(
            "participant ID must not be empty".into(),
        ));
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(FlankerError::Configuration(format!(
            "participant ID {id:?} is not usable as a file name"
        )));
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_wins_over_prompt() {
        let id = participant_id(vec!["p01".to_string()].into_iter(), "ignored\n".as_bytes());
        assert_eq!(id.unwrap(), "p01");
    }

    #[test]
    fn prompted_id_is_trimmed() {
        let id = participant_id(std::iter::empty(), "  p02 \n".as_bytes());
        assert_eq!(id.unwrap(), "p02");
    }

    #[test]
    fn empty_or_path_like_ids_are_rejected() {
        for bad in ["\n", "../x\n", "a/b\n"] {
            let err = participant_id(std::iter::empty(), bad.as_bytes()).unwrap_err();
            assert!(matches!(err, FlankerError::Configuration(_)), "{bad:?}");
        }
    }
}
