//! Compiles `:name` placeholders into PostgreSQL's positional `$n` form.

use crate::{Error, NamedArgs, Result, Value};

/// Rewrites `query` into positional form and collects the bound values in
/// placeholder order.
///
/// A name used more than once shares one position. `::` casts, quoted
/// literals (including `E'..'` escape strings and `$tag$..$tag$` bodies),
/// quoted identifiers and comments pass through unchanged.
pub(crate) fn bind_named(query: &str, args: &NamedArgs) -> Result<(String, Vec<Value>)> {
    let mut sql = String::with_capacity(query.len());
    let mut names: Vec<&str> = Vec::new();
    let mut values = Vec::new();

    let bytes = query.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'e' | b'E'
                if bytes.get(i + 1) == Some(&b'\'')
                    && (i == 0 || !is_name_char(bytes[i - 1])) =>
            {
                let end = escape_string_end(bytes, i + 2);
                sql.push_str(&query[i..end]);
                i = end;
            }
            quote @ (b'\'' | b'"') => {
                let end = closing(bytes, i + 1, quote);
                sql.push_str(&query[i..end]);
                i = end;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                let end = query[i..].find('\n').map_or(bytes.len(), |n| i + n);
                sql.push_str(&query[i..end]);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = block_comment_end(bytes, i + 2);
                sql.push_str(&query[i..end]);
                i = end;
            }
            b'$' => {
                let Some(tag) = dollar_tag(bytes, i) else {
                    sql.push('$');
                    i += 1;
                    continue;
                };
                let delimiter = &query[i..i + tag];
                let body = i + tag;
                let end = query[body..]
                    .find(delimiter)
                    .map_or(bytes.len(), |n| body + n + tag);
                sql.push_str(&query[i..end]);
                i = end;
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                sql.push_str("::");
                i += 2;
            }
            b':' if bytes.get(i + 1).is_some_and(|b| is_name_start(*b)) => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && is_name_char(bytes[end]) {
                    end += 1;
                }
                let name = &query[start..end];

                let position = match names.iter().position(|seen| *seen == name) {
                    Some(position) => position,
                    None => {
                        let value = args
                            .get(name)
                            .ok_or_else(|| Error::MissingParameter(name.to_owned()))?;
                        names.push(name);
                        values.push(value.clone());
                        names.len() - 1
                    }
                };

                sql.push('$');
                sql.push_str(&(position + 1).to_string());
                i = end;
            }
            _ => {
                let ch_len = query[i..].chars().next().map_or(1, char::len_utf8);
                sql.push_str(&query[i..i + ch_len]);
                i += ch_len;
            }
        }
    }

    Ok((sql, values))
}

/// Index just past the quote closing the run that starts at `from`.
/// A doubled quote is an escaped quote, which the scan handles naturally by
/// reopening the run.
fn closing(bytes: &[u8], from: usize, quote: u8) -> usize {
    bytes[from..]
        .iter()
        .position(|b| *b == quote)
        .map_or(bytes.len(), |n| from + n + 1)
}

/// Index just past the closing quote of an `E'..'` string whose body starts
/// at `from`. A backslash escapes the byte after it.
fn escape_string_end(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b'\'' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Index just past the end of a block comment whose body starts at `from`.
/// Block comments nest.
fn block_comment_end(bytes: &[u8], from: usize) -> usize {
    let mut depth = 1;
    let mut i = from;
    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1)) {
            (b'/', Some(b'*')) => {
                depth += 1;
                i += 2;
            }
            (b'*', Some(b'/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Length of the `$tag$` delimiter opening at `at`, if one does. Positional
/// parameters such as `$1` are not delimiters.
fn dollar_tag(bytes: &[u8], at: usize) -> Option<usize> {
    let mut end = at + 1;
    if bytes.get(end).is_some_and(|b| is_name_start(*b)) {
        while end < bytes.len() && is_name_char(bytes[end]) {
            end += 1;
        }
    }
    (bytes.get(end) == Some(&b'$')).then_some(end + 1 - at)
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
