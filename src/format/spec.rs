//! Format spec parsing and rendering

use super::FormatError;

/// Parsed `[[fill]align][sign][#][0][width][,|_][.precision][type]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<char>,
    pub sign: Option<char>,
    pub alternate: bool,
    pub zero: bool,
    pub width: usize,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub code: Option<char>,
}

const ALIGNS: [char; 4] = ['<', '>', '^', '='];

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let bad = |message: &str| FormatError::BadSpec {
            spec: spec.to_string(),
            message: message.to_string(),
        };
        let chars: Vec<char> = spec.chars().collect();
        let mut out = FormatSpec::default();
        let mut i = 0;

        if chars.len() >= 2 && ALIGNS.contains(&chars[1]) {
            out.fill = Some(chars[0]);
            out.align = Some(chars[1]);
            i = 2;
        } else if chars.first().is_some_and(|c| ALIGNS.contains(c)) {
            out.align = Some(chars[0]);
            i = 1;
        }
        if let Some(&c) = chars.get(i) {
            if matches!(c, '+' | '-' | ' ') {
                out.sign = Some(c);
                i += 1;
            }
        }
        if chars.get(i) == Some(&'#') {
            out.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            out.zero = true;
            i += 1;
        }
        let start = i;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            i += 1;
        }
        if i > start {
            let digits: String = chars[start..i].iter().collect();
            out.width = digits.parse().map_err(|_| bad("width too large"))?;
        }
        if let Some(&c) = chars.get(i) {
            if c == ',' || c == '_' {
                out.grouping = Some(c);
                i += 1;
            }
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(char::is_ascii_digit) {
                i += 1;
            }
            if i == start {
                return Err(bad("format specifier missing precision"));
            }
            let digits: String = chars[start..i].iter().collect();
            out.precision = Some(digits.parse().map_err(|_| bad("precision too large"))?);
        }
        if let Some(&c) = chars.get(i) {
            out.code = Some(c);
            i += 1;
        }
        if i != chars.len() {
            return Err(bad("invalid format specifier"));
        }
        Ok(out)
    }

    /// Whether the presentation type asks for a number.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.code,
            Some('d' | 'n' | 'x' | 'X' | 'o' | 'b' | 'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%')
        )
    }

    pub fn format_str(&self, text: &str) -> Result<String, FormatError> {
        match self.code {
            None | Some('s') => {}
            Some(code) => return Err(FormatError::Unsupported { code, kind: "str" }),
        }
        if self.sign.is_some() {
            return Err(FormatError::NotAllowed { option: "sign", kind: "str" });
        }
        if self.alternate {
            return Err(FormatError::NotAllowed { option: "alternate form", kind: "str" });
        }
        if self.grouping.is_some() {
            return Err(FormatError::NotAllowed { option: "grouping", kind: "str" });
        }
        if self.align == Some('=') {
            return Err(FormatError::NotAllowed { option: "'=' alignment", kind: "str" });
        }
        let body: String = match self.precision {
            Some(p) => text.chars().take(p).collect(),
            None => text.to_string(),
        };
        Ok(self.pad("", &body, '<'))
    }

    pub fn format_int(&self, value: i64) -> Result<String, FormatError> {
        let code = self.code.unwrap_or('d');
        if matches!(code, 'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') {
            return self.format_float(value as f64);
        }
        if self.precision.is_some() {
            return Err(FormatError::NotAllowed { option: "precision", kind: "int" });
        }
        let magnitude = value.unsigned_abs();
        let (digits, prefix, group_size) = match code {
            'd' | 'n' => (magnitude.to_string(), "", 3),
            'x' => (format!("{magnitude:x}"), "0x", 4),
            'X' => (format!("{magnitude:X}"), "0X", 4),
            'o' => (format!("{magnitude:o}"), "0o", 4),
            'b' => (format!("{magnitude:b}"), "0b", 4),
            other => return Err(FormatError::Unsupported { code: other, kind: "int" }),
        };
        let digits = match self.grouping {
            Some(sep) => group(&digits, sep, group_size),
            None => digits,
        };
        let mut lead = self.sign_text(value < 0).to_string();
        if self.alternate {
            lead.push_str(prefix);
        }
        Ok(self.pad(&lead, &digits, '>'))
    }

    pub fn format_float(&self, value: f64) -> Result<String, FormatError> {
        let negative = value.is_sign_negative() && value != 0.0;
        let magnitude = value.abs();
        let body = if !magnitude.is_finite() {
            let text = if magnitude.is_nan() { "nan" } else { "inf" };
            match self.code {
                Some('E' | 'F' | 'G') => text.to_uppercase(),
                _ => text.to_string(),
            }
        } else {
            match self.code {
                Some('f' | 'F') => format!("{:.*}", self.precision.unwrap_or(6), magnitude),
                Some('e') => scientific(magnitude, self.precision.unwrap_or(6), false),
                Some('E') => scientific(magnitude, self.precision.unwrap_or(6), true),
                Some('g') => general(magnitude, self.precision.unwrap_or(6), self.alternate, false),
                Some('G') => general(magnitude, self.precision.unwrap_or(6), self.alternate, true),
                Some('%') => format!("{:.*}%", self.precision.unwrap_or(6), magnitude * 100.0),
                None => match self.precision {
                    Some(p) => general(magnitude, p, self.alternate, false),
                    None => {
                        if magnitude.fract() == 0.0 && magnitude < 1e16 {
                            format!("{magnitude:.1}")
                        } else {
                            format!("{magnitude}")
                        }
                    }
                },
                Some(other) => return Err(FormatError::Unsupported { code: other, kind: "float" }),
            }
        };
        let body = match self.grouping {
            Some(sep) => {
                let split = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
                format!("{}{}", group(&body[..split], sep, 3), &body[split..])
            }
            None => body,
        };
        Ok(self.pad(self.sign_text(negative), &body, '>'))
    }

    fn sign_text(&self, negative: bool) -> &'static str {
        match (negative, self.sign) {
            (true, _) => "-",
            (false, Some('+')) => "+",
            (false, Some(' ')) => " ",
            _ => "",
        }
    }

    /// Apply width, fill and alignment. `lead` is the sign and prefix part
    /// that `=` alignment keeps in front of the padding.
    fn pad(&self, lead: &str, body: &str, default_align: char) -> String {
        let (fill, align) = match (self.align, self.zero) {
            (Some(align), _) => (self.fill.unwrap_or(if self.zero { '0' } else { ' ' }), align),
            (None, true) => (self.fill.unwrap_or('0'), '='),
            (None, false) => (self.fill.unwrap_or(' '), default_align),
        };
        let len = lead.chars().count() + body.chars().count();
        if len >= self.width {
            return format!("{lead}{body}");
        }
        let missing = self.width - len;
        let filler = |n: usize| std::iter::repeat_n(fill, n).collect::<String>();
        match align {
            '<' => format!("{lead}{body}{}", filler(missing)),
            '^' => format!("{}{lead}{body}{}", filler(missing / 2), filler(missing - missing / 2)),
            '=' => format!("{lead}{}{body}", filler(missing)),
            _ => format!("{}{lead}{body}", filler(missing)),
        }
    }
}

fn group(digits: &str, sep: char, size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / size);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % size == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

/// `d.ddde+XX` with at least two exponent digits.
fn scientific(value: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{:.*e}", precision, value);
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{sign}{:02}", exponent.abs())
}

fn general(value: f64, precision: usize, keep_zeros: bool, upper: bool) -> String {
    let precision = precision.max(1);
    if value == 0.0 {
        return "0".to_string();
    }
    let raw = format!("{:.*e}", precision - 1, value);
    let exponent: i32 = raw
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    let text = if exponent >= -4 && exponent < precision as i32 {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, value)
    } else {
        scientific(value, precision - 1, upper)
    };
    if keep_zeros {
        return text;
    }
    match text.find(['e', 'E']) {
        Some(pos) => {
            let (mantissa, exp) = text.split_at(pos);
            format!("{}{}", strip_zeros(mantissa), exp)
        }
        None => strip_zeros(&text).to_string(),
    }
}

fn strip_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
