// src/core/sanitize.rs

/// Collapse runs of whitespace (including NBSP) to one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Lenient numeric parse for scores and penalties: trims, accepts a decimal
/// comma, rejects NaN/inf.
pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() { return None; }
    let v = match t.parse::<f64>() {
        Ok(v) => v,
        Err(_) if t.matches(',').count() == 1 && !t.contains('.') => {
            t.replace(',', ".").parse::<f64>().ok()?
        }
        Err(_) => return None,
    };
    v.is_finite().then_some(v)
}

/// Solve-time strings to seconds.
/// - `H:MM:SS` and `M:SS` → seconds
/// - bare number → minutes (ICPC convention)
pub fn parse_time_seconds(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() { return None; }

    if t.contains(':') {
        let mut total = 0f64;
        for part in t.split(':') {
            let v: u32 = part.trim().parse().ok()?;
            total = total * 60.0 + v as f64;
        }
        return Some(total);
    }
    parse_number(t).filter(|v| *v >= 0.0).map(|m| m * 60.0)
}

/// Render a number without a trailing `.0` when it is integral.
pub fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
