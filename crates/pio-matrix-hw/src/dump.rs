//! Human-readable command-stream dumps for offline debugging.
//!
//! The format is a bracketed, comma-separated list of decimal words, one per
//! line, matching what the PIO bring-up tooling consumes.

use crate::error::{Error, Result};
use std::io::{BufRead, Write};

/// Writes a command stream as a bracketed decimal list.
pub fn write_words<W: Write>(out: &mut W, words: &[u32]) -> Result<()> {
    writeln!(out, "[")?;
    for (i, word) in words.iter().enumerate() {
        if i + 1 < words.len() {
            writeln!(out, "{word},")?;
        } else {
            writeln!(out, "{word}")?;
        }
    }
    writeln!(out, "]")?;
    Ok(())
}

/// Parses a dump written by [`write_words`] back into words.
pub fn read_words<R: BufRead>(input: R) -> Result<Vec<u32>> {
    let mut words = Vec::new();
    let mut seen_open = false;
    let mut seen_close = false;

    for line in input.lines() {
        let line = line?;
        let token = line.trim().trim_end_matches(',');
        match token {
            "" => {}
            "[" => {
                if seen_open {
                    return Err(Error::MalformedDump("repeated opening bracket".to_string()));
                }
                seen_open = true;
            }
            "]" => {
                if !seen_open || seen_close {
                    return Err(Error::MalformedDump("unexpected closing bracket".to_string()));
                }
                seen_close = true;
            }
            _ => {
                if !seen_open || seen_close {
                    return Err(Error::MalformedDump(format!(
                        "word outside brackets: {token:?}"
                    )));
                }
                let word = token
                    .parse::<u32>()
                    .map_err(|_| Error::MalformedDump(format!("not a word: {token:?}")))?;
                words.push(word);
            }
        }
    }

    if !seen_close {
        return Err(Error::MalformedDump("missing closing bracket".to_string()));
    }
    Ok(words)
}
