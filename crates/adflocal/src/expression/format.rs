//! composite formatting
//!
//! Renders `{index[,alignment][:format]}` items against a list of [Value]s. Culture dependent parts (month
//! names, separators, AM/PM designators) always use invariant culture rules.
//!
//! | value type | format specifier |
//! |------------|------------------|
//! | date-time  | custom patterns (`yyyy-MM-dd`) or a standard letter (`d`, `s`, `O`, ...) |
//! | integer    | `D`, `X`, `N`, `F` (optionally followed by a precision) or a `0`/`#` pattern |
//! | string     | ignored |
use crate::error::ResolveError;
use crate::value::{Timestamp, Value};
use chrono::{Datelike, Timelike};

/// Alignments at or beyond this width are rejected
const MAX_ALIGNMENT: u64 = 1_000_000;

/// Largest precision of a standard integer specifier (`D99`)
const MAX_PRECISION: usize = 99;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Apply composite formatting of `format` against `args`
pub fn composite(format: &str, args: &[Value]) -> Result<String, ResolveError> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(ResolveError::invalid_format(format, "unmatched `}`")),
            '{' => {
                let mut item = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => {
                            return Err(ResolveError::invalid_format(format, "nested `{`"))
                        }
                        Some(ch) => item.push(ch),
                        None => return Err(ResolveError::invalid_format(format, "unclosed `{`")),
                    }
                }
                out.push_str(&format_item(format, &item, args)?);
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

/// Render a single `index[,alignment][:format]` item
fn format_item(format: &str, item: &str, args: &[Value]) -> Result<String, ResolveError> {
    let (head, spec) = match item.split_once(':') {
        Some((head, spec)) => (head, Some(spec)),
        None => (item, None),
    };
    let (index, alignment) = match head.split_once(',') {
        Some((index, alignment)) => (index, Some(alignment)),
        None => (head, None),
    };

    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| ResolveError::invalid_format(format, format!("`{index}` is not an index")))?;
    let Some(arg) = args.get(index) else {
        return Err(ResolveError::invalid_format(
            format,
            format!("index {index} is out of range ({} arguments)", args.len()),
        ));
    };

    let rendered = format_value(arg, spec.unwrap_or_default())?;

    let Some(alignment) = alignment else {
        return Ok(rendered);
    };
    let width: i64 = alignment.trim().parse().map_err(|_| {
        ResolveError::invalid_format(format, format!("`{alignment}` is not an alignment"))
    })?;
    if width.unsigned_abs() >= MAX_ALIGNMENT {
        return Err(ResolveError::invalid_format(
            format,
            format!("alignment must be below {MAX_ALIGNMENT}"),
        ));
    }
    let pad = (width.unsigned_abs() as usize).saturating_sub(rendered.chars().count());
    Ok(if width < 0 {
        format!("{rendered}{}", " ".repeat(pad))
    } else {
        format!("{}{rendered}", " ".repeat(pad))
    })
}

/// Render one value with a (possibly empty) format specifier
pub fn format_value(value: &Value, spec: &str) -> Result<String, ResolveError> {
    match value {
        Value::DateTime(timestamp) => format_date(timestamp, spec),
        Value::Integer(integer) => format_integer(*integer, spec),
        Value::String(string) => Ok(string.clone()),
    }
}

fn standard_date_pattern(letter: char) -> Option<&'static str> {
    Some(match letter {
        'd' => "MM/dd/yyyy",
        'D' => "dddd, dd MMMM yyyy",
        'f' => "dddd, dd MMMM yyyy HH:mm",
        'F' => "dddd, dd MMMM yyyy HH:mm:ss",
        'g' => "MM/dd/yyyy HH:mm",
        'G' => "MM/dd/yyyy HH:mm:ss",
        'M' | 'm' => "MMMM dd",
        'O' | 'o' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss'.'fffffffzzz",
        'R' | 'r' => "ddd, dd MMM yyyy HH':'mm':'ss 'GMT'",
        's' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss",
        't' => "HH:mm",
        'T' => "HH:mm:ss",
        'u' => "yyyy'-'MM'-'dd HH':'mm':'ss'Z'",
        'Y' | 'y' => "yyyy MMMM",
        _ => return None,
    })
}

/// Render a date-time using a standard letter or a custom pattern
pub fn format_date(timestamp: &Timestamp, spec: &str) -> Result<String, ResolveError> {
    if spec.is_empty() {
        return render_date_pattern(timestamp, "MM/dd/yyyy HH:mm:ss");
    }

    let mut letters = spec.chars();
    if let (Some(letter), None) = (letters.next(), letters.next()) {
        let Some(pattern) = standard_date_pattern(letter) else {
            return Err(ResolveError::invalid_format(
                spec,
                format!("`{letter}` is not a standard date format"),
            ));
        };

        // `R` and `u` render universal time
        let timestamp = match letter {
            'R' | 'r' | 'u' => timestamp.with_timezone(&chrono::Utc).fixed_offset(),
            _ => *timestamp,
        };
        return render_date_pattern(&timestamp, pattern);
    }

    render_date_pattern(timestamp, spec)
}

fn render_date_pattern(timestamp: &Timestamp, pattern: &str) -> Result<String, ResolveError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let run = chars[i..].iter().take_while(|&&c| c == ch).count();

        match ch {
            'y' => {
                let year = timestamp.year();
                match run {
                    1 => out.push_str(&(year % 100).to_string()),
                    2 => out.push_str(&format!("{:02}", year % 100)),
                    _ => out.push_str(&zero_pad(year.to_string(), run)),
                }
            }
            'M' => {
                let month = timestamp.month();
                match run {
                    1 => out.push_str(&month.to_string()),
                    2 => out.push_str(&format!("{month:02}")),
                    3 => out.push_str(&MONTH_NAMES[month as usize - 1][..3]),
                    _ => out.push_str(MONTH_NAMES[month as usize - 1]),
                }
            }
            'd' => match run {
                1 => out.push_str(&timestamp.day().to_string()),
                2 => out.push_str(&format!("{:02}", timestamp.day())),
                3 => out.push_str(&day_name(timestamp)[..3]),
                _ => out.push_str(day_name(timestamp)),
            },
            'H' => push_padded(&mut out, timestamp.hour(), run),
            'h' => {
                let hour = match timestamp.hour() % 12 {
                    0 => 12,
                    hour => hour,
                };
                push_padded(&mut out, hour, run)
            }
            'm' => push_padded(&mut out, timestamp.minute(), run),
            's' => push_padded(&mut out, timestamp.second(), run),
            'f' | 'F' => {
                if run > 7 {
                    return Err(ResolveError::invalid_format(pattern, "too many fraction digits"));
                }
                let ticks = format!("{:07}", timestamp.nanosecond().min(999_999_999) / 100);
                let digits = &ticks[..run];
                if ch == 'F' {
                    out.push_str(digits.trim_end_matches('0'));
                } else {
                    out.push_str(digits);
                }
            }
            't' => {
                let designator = if timestamp.hour() < 12 { "AM" } else { "PM" };
                out.push_str(if run == 1 { &designator[..1] } else { designator });
            }
            'g' => out.push_str("A.D."),
            'z' => {
                let offset = timestamp.offset().local_minus_utc();
                let sign = if offset < 0 { '-' } else { '+' };
                let (hours, minutes) = (offset.abs() / 3600, offset.abs() % 3600 / 60);
                match run {
                    1 => out.push_str(&format!("{sign}{hours}")),
                    2 => out.push_str(&format!("{sign}{hours:02}")),
                    _ => out.push_str(&format!("{sign}{hours:02}:{minutes:02}")),
                }
            }
            'K' => {
                let offset = timestamp.offset().local_minus_utc();
                if offset == 0 {
                    out.push('Z');
                } else {
                    let sign = if offset < 0 { '-' } else { '+' };
                    out.push_str(&format!(
                        "{sign}{:02}:{:02}",
                        offset.abs() / 3600,
                        offset.abs() % 3600 / 60
                    ));
                }
                i += 1;
                continue;
            }
            '\'' | '"' => {
                let Some(end) = chars[i + 1..].iter().position(|&c| c == ch) else {
                    return Err(ResolveError::invalid_format(pattern, "unterminated quote"));
                };
                out.extend(&chars[i + 1..i + 1 + end]);
                i += end + 2;
                continue;
            }
            '\\' => {
                let Some(escaped) = chars.get(i + 1) else {
                    return Err(ResolveError::invalid_format(pattern, "dangling escape"));
                };
                out.push(*escaped);
                i += 2;
                continue;
            }
            '%' => {
                // single custom specifier, e.g. `%d`
                i += 1;
                continue;
            }
            _ => {
                out.push(ch);
                i += 1;
                continue;
            }
        }

        i += run;
    }

    Ok(out)
}

fn day_name(timestamp: &Timestamp) -> &'static str {
    DAY_NAMES[timestamp.weekday().num_days_from_monday() as usize]
}

fn push_padded(out: &mut String, value: u32, run: usize) {
    if run == 1 {
        out.push_str(&value.to_string());
    } else {
        out.push_str(&format!("{value:02}"));
    }
}

/// Render an integer using a standard letter (with optional precision) or a `0`/`#` pattern
pub fn format_integer(value: i64, spec: &str) -> Result<String, ResolveError> {
    if spec.is_empty() {
        return Ok(value.to_string());
    }

    let mut chars = spec.chars();
    let letter = chars.next().unwrap_or_default();
    let precision = chars.as_str();
    let precision: Option<usize> = if precision.is_empty() {
        None
    } else if let Ok(precision) = precision.parse() {
        Some(precision)
    } else {
        return format_integer_pattern(value, spec);
    };

    if precision.is_some_and(|precision| precision > MAX_PRECISION) {
        return Err(ResolveError::invalid_format(
            spec,
            format!("precision must not exceed {MAX_PRECISION}"),
        ));
    }

    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    let width = precision.unwrap_or(0);
    match letter {
        'D' | 'd' => Ok(format!("{sign}{}", zero_pad(magnitude.to_string(), width))),
        'X' => Ok(zero_pad(hex(value).to_uppercase(), width)),
        'x' => Ok(zero_pad(hex(value), width)),
        'F' | 'f' => Ok(with_decimals(format!("{sign}{magnitude}"), precision)),
        'N' | 'n' => Ok(with_decimals(
            format!("{sign}{}", group_thousands(magnitude)),
            precision,
        )),
        _ => format_integer_pattern(value, spec),
    }
}

/// Lowercase hex, two's complement of 32 bits when the value fits an `i32`
fn hex(value: i64) -> String {
    match i32::try_from(value) {
        Ok(value) => format!("{value:x}"),
        Err(_) => format!("{value:x}"),
    }
}

fn zero_pad(digits: String, width: usize) -> String {
    match width.checked_sub(digits.len()) {
        Some(missing) if missing > 0 => format!("{}{digits}", "0".repeat(missing)),
        _ => digits,
    }
}

fn with_decimals(mut rendered: String, precision: Option<usize>) -> String {
    let precision = precision.unwrap_or(2);
    if precision > 0 {
        rendered.push('.');
        rendered.push_str(&"0".repeat(precision));
    }
    rendered
}

fn group_thousands(magnitude: u64) -> String {
    let digits = magnitude.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

fn format_integer_pattern(value: i64, spec: &str) -> Result<String, ResolveError> {
    if !spec.chars().all(|c| c == '0' || c == '#') {
        return Err(ResolveError::invalid_format(
            spec,
            "unsupported integer format",
        ));
    }

    let zeros = spec.chars().filter(|&c| c == '0').count();
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    if zeros == 0 && magnitude == 0 {
        return Ok(String::new());
    }
    Ok(format!("{sign}{}", zero_pad(magnitude.to_string(), zeros)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::parse_timestamp;
    use pretty_assertions::assert_eq;

    fn date(input: &str) -> Value {
        parse_timestamp(input).unwrap().into()
    }

    #[test]
    fn custom_date_patterns() {
        let value = date("2017-03-05T14:07:09.1234567Z");
        let cases = [
            ("yyyy", "2017"),
            ("yyyyMMdd", "20170305"),
            ("yy/M/d", "17/3/5"),
            ("HH:mm:ss.fff", "14:07:09.123"),
            ("hh tt", "02 PM"),
            ("MMM dddd", "Mar Sunday"),
            ("yyyy-MM-dd'T'HH", "2017-03-05T14"),
            ("%d", "5"),
            ("\\y\\e\\a\\r yyyy", "year 2017"),
            ("zzz", "+00:00"),
            ("FFFF", "1234"),
        ];

        for (pattern, expected) in cases {
            assert_eq!(format_value(&value, pattern).unwrap(), expected, "{pattern}");
        }
    }

    #[test]
    fn standard_date_letters() {
        let value = date("2017-01-02T03:04:05Z");
        assert_eq!(format_value(&value, "s").unwrap(), "2017-01-02T03:04:05");
        assert_eq!(format_value(&value, "d").unwrap(), "01/02/2017");
        assert_eq!(format_value(&value, "u").unwrap(), "2017-01-02 03:04:05Z");
        assert_eq!(
            format_value(&value, "o").unwrap(),
            "2017-01-02T03:04:05.0000000+00:00"
        );
        assert_eq!(format_value(&value, "").unwrap(), "01/02/2017 03:04:05");
        assert!(matches!(
            format_value(&value, "Q"),
            Err(ResolveError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn integer_specifiers() {
        assert_eq!(format_integer(7, "D3").unwrap(), "007");
        assert_eq!(format_integer(-7, "D3").unwrap(), "-007");
        assert_eq!(format_integer(255, "X").unwrap(), "FF");
        assert_eq!(format_integer(255, "x4").unwrap(), "00ff");
        assert_eq!(format_integer(1234567, "N0").unwrap(), "1,234,567");
        assert_eq!(format_integer(12, "F").unwrap(), "12.00");
        assert_eq!(format_integer(5, "00").unwrap(), "05");
        assert!(format_integer(5, "abc").is_err());
    }

    #[test]
    fn hex_of_negative_int_is_32_bit() {
        assert_eq!(format_integer(-1, "X").unwrap(), "FFFFFFFF");
        assert_eq!(format_integer(-255, "x").unwrap(), "ffffff01");
        assert_eq!(format_integer(-(1 << 40), "X").unwrap(), "FFFFFF0000000000");
    }

    #[test]
    fn oversized_widths_are_rejected() {
        let args = [Value::Integer(1)];
        assert!(matches!(
            composite("{0,9223372036854775807}", &args),
            Err(ResolveError::InvalidFormat { .. })
        ));
        assert!(matches!(
            composite("{0,-1000000}", &args),
            Err(ResolveError::InvalidFormat { .. })
        ));
        assert!(matches!(
            composite("{0:D70000}", &args),
            Err(ResolveError::InvalidFormat { .. })
        ));
        assert!(matches!(
            format_integer(1, "N100"),
            Err(ResolveError::InvalidFormat { .. })
        ));
        assert_eq!(composite("{0,6}", &args).unwrap(), "     1");
        assert_eq!(format_integer(1, "D99").unwrap().len(), 99);
    }

    #[test]
    fn long_year_run_is_padded() {
        let pattern = "y".repeat(70_000);
        let rendered = format_value(&date("2017-01-01T00:00:00Z"), &pattern).unwrap();
        assert_eq!(rendered.len(), 70_000);
        assert!(rendered.ends_with("2017"));
    }

    #[test]
    fn composite_items() {
        let args = [date("2017-01-01T00:00:00Z"), Value::Integer(3), Value::from("x")];
        assert_eq!(
            composite("{0:yyyy}/{1:D2}/{2}", &args).unwrap(),
            "2017/03/x"
        );
        assert_eq!(composite("{{{1}}}", &args).unwrap(), "{3}");
        assert_eq!(composite("[{2,3}|{2,-3}]", &args).unwrap(), "[  x|x  ]");
    }

    #[test]
    fn composite_errors() {
        let args = [Value::Integer(1)];
        assert!(matches!(
            composite("{1}", &args),
            Err(ResolveError::InvalidFormat { .. })
        ));
        assert!(composite("{0", &args).is_err());
        assert!(composite("0}", &args).is_err());
        assert!(composite("{a}", &args).is_err());
    }
}
