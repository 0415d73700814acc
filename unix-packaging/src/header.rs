// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Folding of comma separated header values.

Control file headers like `Depends` hold a comma separated list of values.
Long lists are folded over multiple physical lines, with continuation lines
starting with a single space.
*/

/// Separator between values on a folded header line.
pub const SEPARATOR: &str = ", ";

/// Fold a list of values into the physical lines of a header.
///
/// Values are placed greedily. The first line is charged the length of `key`
/// and every value after the first on a line is charged its own length plus
/// that of the separator. A value that would push the charge beyond `width`
/// starts a new line instead; the line it leaves ends with a trailing
/// separator. A value that starts a line is always placed, so values longer
/// than `width` are never split.
///
/// An empty list yields no lines at all.
pub fn fold_header<S: AsRef<str>>(width: usize, key: &str, values: &[S]) -> Vec<String> {
    let mut lines = Vec::new();

    if values.is_empty() {
        return lines;
    }

    let mut line = format!("{}: ", key);
    let mut charged = key.chars().count();
    let mut line_empty = true;

    for value in values {
        let value = value.as_ref();
        let value_width = value.chars().count();

        if !line_empty && charged + SEPARATOR.len() + value_width > width {
            line.push_str(SEPARATOR);
            lines.push(std::mem::replace(&mut line, " ".to_string()));
            charged = 0;
            line_empty = true;
        }

        if !line_empty {
            line.push_str(SEPARATOR);
            charged += SEPARATOR.len();
        }

        line.push_str(value);
        charged += value_width;
        line_empty = false;
    }

    lines.push(line);

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn empty_and_single() {
        assert!(fold_header(10, "Foo", &NONE).is_empty());
        assert_eq!(fold_header(10, "Foo", &["yo"]), vec!["Foo: yo"]);
    }

    #[test]
    fn folding() {
        assert_eq!(
            fold_header(10, "Foo", &["yo", "1234567890"]),
            vec!["Foo: yo, ", " 1234567890"]
        );

        assert_eq!(
            fold_header(10, "Foo", &["1234567890", "yo"]),
            vec!["Foo: 1234567890, ", " yo"]
        );

        assert_eq!(
            fold_header(10, "Foo", &["1234567890"; 5]),
            vec![
                "Foo: 1234567890, ",
                " 1234567890, ",
                " 1234567890, ",
                " 1234567890, ",
                " 1234567890"
            ]
        );

        assert_eq!(
            fold_header(
                10,
                "Foo",
                &["aa", "bb", "cc", "dd", "ee", "ff", "gg", "hh", "ii", "jj"]
            ),
            vec!["Foo: aa, bb, ", " cc, dd, ee, ", " ff, gg, hh, ", " ii, jj"]
        );
    }

    #[test]
    fn wide_budget_keeps_one_line() {
        assert_eq!(
            fold_header(80, "Depends", &["tomcat6", "sun-java6-jdk"]),
            vec!["Depends: tomcat6, sun-java6-jdk"]
        );
    }

    fn sample_values() -> Vec<String> {
        (0..40)
            .map(|i| format!("{}{}", "x".repeat(i % 7 + 1), i))
            .collect()
    }

    /// Strip the folding from the value part of folded lines.
    fn unfold(key: &str, lines: &[String]) -> Vec<String> {
        let prefix = format!("{}: ", key);

        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let line = if i == 0 {
                    line.strip_prefix(&prefix).expect("first line has key")
                } else {
                    line.strip_prefix(' ').expect("continuation line is indented")
                };

                line.strip_suffix(SEPARATOR).unwrap_or(line)
            })
            .collect::<Vec<_>>()
            .join(SEPARATOR)
            .split(SEPARATOR)
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn unfolding_restores_values() {
        let values = sample_values();

        for width in 9..60 {
            let lines = fold_header(width, "Depends", &values);
            assert_eq!(unfold("Depends", &lines), values, "width {}", width);
        }
    }

    #[test]
    fn charged_width_bounded() {
        let values = sample_values();

        for width in 1..60 {
            let lines = fold_header(width, "Depends", &values);

            for (i, line) in lines.iter().enumerate() {
                let (content, key_charge) = if i == 0 {
                    (&line["Depends: ".len()..], "Depends".len())
                } else {
                    (&line[1..], 0)
                };
                let content = content.strip_suffix(SEPARATOR).unwrap_or(content);

                let single_value = !content.contains(SEPARATOR);
                let charged = key_charge + content.len();

                assert!(
                    charged <= width || single_value,
                    "line {:?} exceeds width {}",
                    line,
                    width
                );
            }

            // Every non-final line ends with a separator; the last one doesn't.
            let (last, rest) = lines.split_last().unwrap();
            assert!(rest.iter().all(|l| l.ends_with(SEPARATOR)));
            assert!(!last.ends_with(SEPARATOR));
        }
    }
}
