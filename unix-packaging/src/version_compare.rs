// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Native version ordering.

These implement the comparison rules of `dpkg --compare-versions` and of
`rpmvercmp()` so the ordering guarantees of translated versions can be
checked without the native tools installed.
*/

use std::cmp::Ordering;

/// Weight of a character in the non-digit parts of a Debian version.
///
/// `~` sorts before everything, including the end of the string. Letters
/// sort before all other non-digits.
fn debian_char_order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => c as i32,
        Some(c) => c as i32 + 256,
    }
}

/// Compare one Debian version component (upstream version or revision).
fn compare_debian_component(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    let digit_at = |s: &[u8], pos: usize| s.get(pos).map_or(false, |c| c.is_ascii_digit());
    let non_digit_at = |s: &[u8], pos: usize| s.get(pos).map_or(false, |c| !c.is_ascii_digit());

    while i < a.len() || j < b.len() {
        while non_digit_at(a, i) || non_digit_at(b, j) {
            let ac = debian_char_order(a.get(i).copied());
            let bc = debian_char_order(b.get(j).copied());

            if ac != bc {
                return ac.cmp(&bc);
            }

            i += 1;
            j += 1;
        }

        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while digit_at(a, i) && digit_at(b, j) {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }

        // The longer run of digits is the larger number.
        if digit_at(a, i) {
            return Ordering::Greater;
        }
        if digit_at(b, j) {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }

    Ordering::Equal
}

/// Split a Debian version into epoch, upstream version and revision.
fn split_debian_version(s: &str) -> (u64, &str, &str) {
    let (epoch, rest) = match s.split_once(':') {
        Some((epoch, rest)) => (epoch.parse::<u64>().unwrap_or(0), rest),
        None => (0, s),
    };

    match rest.rsplit_once('-') {
        Some((upstream, revision)) => (epoch, upstream, revision),
        None => (epoch, rest, ""),
    }
}

/// Compare two Debian version strings the way `dpkg` does.
///
/// Malformed input is compared on a best-effort basis: a non-numeric epoch
/// counts as `0`.
pub fn compare_debian_versions(a: &str, b: &str) -> Ordering {
    let (a_epoch, a_upstream, a_revision) = split_debian_version(a);
    let (b_epoch, b_upstream, b_revision) = split_debian_version(b);

    a_epoch
        .cmp(&b_epoch)
        .then_with(|| compare_debian_component(a_upstream, b_upstream))
        .then_with(|| compare_debian_component(a_revision, b_revision))
}

/// Compare two RPM version or release strings the way `rpmvercmp()` does.
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    let is_separator = |c: &u8| !c.is_ascii_alphanumeric() && *c != b'~' && *c != b'^';

    loop {
        while a.get(i).map_or(false, is_separator) {
            i += 1;
        }
        while b.get(j).map_or(false, is_separator) {
            j += 1;
        }

        // `~` sorts before everything.
        if a.get(i) == Some(&b'~') || b.get(j) == Some(&b'~') {
            if a.get(i) != Some(&b'~') {
                return Ordering::Greater;
            }
            if b.get(j) != Some(&b'~') {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        // `^` sorts after the end of a string but before anything else.
        if a.get(i) == Some(&b'^') || b.get(j) == Some(&b'^') {
            if i >= a.len() {
                return Ordering::Less;
            }
            if j >= b.len() {
                return Ordering::Greater;
            }
            if a[i] != b'^' {
                return Ordering::Greater;
            }
            if b[j] != b'^' {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        if i >= a.len() || j >= b.len() {
            break;
        }

        let numeric = a[i].is_ascii_digit();
        let same_class = |c: &u8| {
            if numeric {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphabetic()
            }
        };

        let a_start = i;
        while a.get(i).map_or(false, same_class) {
            i += 1;
        }
        let b_start = j;
        while b.get(j).map_or(false, same_class) {
            j += 1;
        }

        let a_segment = &a[a_start..i];
        let b_segment = &b[b_start..j];

        // Segments of different classes: numeric sorts higher.
        if b_segment.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let res = if numeric {
            let strip = |s: &'_ [u8]| -> usize { s.iter().take_while(|c| **c == b'0').count() };
            let a_digits = &a_segment[strip(a_segment)..];
            let b_digits = &b_segment[strip(b_segment)..];

            a_digits
                .len()
                .cmp(&b_digits.len())
                .then_with(|| a_digits.cmp(b_digits))
        } else {
            a_segment.cmp(b_segment)
        };

        if res != Ordering::Equal {
            return res;
        }
    }

    // Whichever string has characters left wins.
    match (i >= a.len(), j >= b.len()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, _) => Ordering::Greater,
    }
}

/// Compare two RPM `(version, release)` pairs.
pub fn compare_rpm_versions(a: (&str, &str), b: (&str, &str)) -> Ordering {
    rpmvercmp(a.0, b.0).then_with(|| rpmvercmp(a.1, b.1))
}
