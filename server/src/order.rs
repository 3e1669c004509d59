use std::{cmp::Ordering, iter::Peekable, str::Chars};

use crate::decode::ImageFile;

/// Sorts files so that `frame2` comes before `frame10`. Names that compare equal keep their order.
pub fn sort_files(files: &mut [ImageFile]) {
    files.sort_by(|a, b| natural_cmp(&a.name, &b.name));
}

/// Case-insensitive comparison that reads runs of ASCII digits as numbers.
///
/// Punctuation and whitespace sort before digits and digits before letters, so `f_1` and `f 1`
/// come before `f1`. Accents are not folded: `é` sorts after `z`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let ordering = cmp_numbers(&take_digits(&mut a), &take_digits(&mut b));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = class(x)
                    .cmp(&class(y))
                    .then_with(|| x.to_lowercase().cmp(y.to_lowercase()));
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a.next();
                b.next();
            }
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Separator,
    Digit,
    Other,
}

fn class(c: char) -> CharClass {
    if c.is_ascii_digit() {
        CharClass::Digit
    } else if c.is_whitespace() || c.is_ascii_punctuation() {
        CharClass::Separator
    } else {
        CharClass::Other
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

// Compares by value without parsing, so arbitrarily long runs cannot overflow.
fn cmp_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
