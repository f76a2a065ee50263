use std::iter::repeat_n;

use itertools::Itertools;

use crate::automaton::{Input, Transducer};

/// Enumerates all words over `alphabet` of length 1 to `max_word_length`.
fn words<'a>(alphabet: &[&'a Input], max_word_length: usize) -> impl Iterator<Item = Vec<&'a str>> {
    (1..=max_word_length).flat_map(move |length| {
        repeat_n(alphabet.iter().map(|letter| letter.as_str()), length)
            .multi_cartesian_product()
    })
}

/// Checks whether two machines produce the same output sequence for every
/// word up to `max_word_length`. Machines with different alphabets never
/// produce the same outputs.
pub fn same_output(
    a: &impl Transducer,
    a_start: &str,
    b: &impl Transducer,
    b_start: &str,
    max_word_length: usize,
) -> bool {
    let alphabet = a.alphabet();
    if alphabet != b.alphabet() {
        return false;
    }

    words(&alphabet, max_word_length).all(|word| {
        match (
            a.run(a_start, word.iter().copied()),
            b.run(b_start, word.iter().copied()),
        ) {
            (Ok(x), Ok(y)) => x == y,
            _ => false,
        }
    })
}

/// Like [`same_output`], but panics with the first word the machines
/// disagree on.
pub fn assert_same_output(
    a: &impl Transducer,
    a_start: &str,
    b: &impl Transducer,
    b_start: &str,
    max_word_length: usize,
) {
    let alphabet = a.alphabet();
    if alphabet != b.alphabet() {
        panic!(
            "Alphabets are not the same: {:?} vs {:?}",
            alphabet,
            b.alphabet()
        );
    }

    for word in words(&alphabet, max_word_length) {
        let x = a.run(a_start, word.iter().copied());
        let y = b.run(b_start, word.iter().copied());
        if x != y {
            panic!(
                "{:?} produces {:?} on machine `a` but {:?} on machine `b`",
                word, x, y
            );
        }
    }
}
