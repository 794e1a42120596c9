//! Canonical text forms for amounts, rates, ratios, counts and dates.
//!
//! Every formatter here is pure; the same input always yields the same
//! bytes, which is what lets the verifier demand verbatim containment.

use chrono::NaiveDate;

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [(u64, &str); 4] = [
    (1_000_000_000_000, "trillion"),
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

/// A formatted fact plus the looser spellings the numeric presence check
/// will accept.
#[derive(Debug, Clone, PartialEq)]
pub struct Formatted {
    pub value: String,
    pub alternates: Vec<String>,
}

impl Formatted {
    fn plain(value: String) -> Self {
        Self {
            value,
            alternates: Vec::new(),
        }
    }
}

pub fn spell_number(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }
    let mut parts = Vec::new();
    let mut rest = n;
    for (scale, name) in SCALES {
        if rest >= scale {
            parts.push(format!("{} {}", spell_number(rest / scale), name));
            rest %= scale;
        }
    }
    if rest > 0 {
        parts.push(spell_below_thousand(rest));
    }
    parts.join(" ")
}

fn spell_below_thousand(n: u64) -> String {
    let mut words = Vec::new();
    let hundreds = (n / 100) as usize;
    let rem = (n % 100) as usize;
    if hundreds > 0 {
        words.push(format!("{} hundred", ONES[hundreds]));
    }
    if rem > 0 {
        if rem < 20 {
            words.push(ONES[rem].to_string());
        } else if rem % 10 == 0 {
            words.push(TENS[rem / 10].to_string());
        } else {
            words.push(format!("{}-{}", TENS[rem / 10], ONES[rem % 10]));
        }
    }
    words.join(" ")
}

/// Groups an integer with thousands separators: `1234567` -> `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Converts a dollar figure to whole cents. Non-finite or negative input has
/// no cents representation.
pub fn to_cents(dollars: f64) -> Option<u64> {
    if !dollars.is_finite() || dollars < 0.0 {
        return None;
    }
    Some((dollars * 100.0).round() as u64)
}

/// `$500,000 (five hundred thousand dollars)`
pub fn currency(cents: u64) -> Formatted {
    let dollars = cents / 100;
    let remainder = cents % 100;

    let numeric = if remainder == 0 {
        format!("${}", group_thousands(dollars))
    } else {
        format!("${}.{:02}", group_thousands(dollars), remainder)
    };

    let dollar_words = format!(
        "{} {}",
        spell_number(dollars),
        if dollars == 1 { "dollar" } else { "dollars" }
    );
    let words = if remainder == 0 {
        dollar_words.clone()
    } else {
        format!(
            "{} and {} {}",
            dollar_words,
            spell_number(remainder),
            if remainder == 1 { "cent" } else { "cents" }
        )
    };

    Formatted {
        value: format!("{} ({})", numeric, words),
        alternates: vec![
            numeric.clone(),
            numeric.trim_start_matches('$').to_string(),
            dollar_words,
        ],
    }
}

/// `6.250% per annum`
pub fn annual_rate(percent: f64) -> Formatted {
    let fixed = format!("{:.3}", percent);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.').to_string();
    let mut alternates = vec![format!("{}%", fixed), format!("{} percent", fixed)];
    if trimmed != fixed {
        alternates.push(format!("{}%", trimmed));
        alternates.push(format!("{} percent", trimmed));
    }
    Formatted {
        value: format!("{}% per annum", fixed),
        alternates,
    }
}

/// Loan-to-value, `75.00%`
pub fn ratio_percent(percent: f64) -> Formatted {
    Formatted::plain(format!("{:.2}%", percent))
}

/// Debt service coverage, `1.25x`
pub fn coverage(multiple: f64) -> Formatted {
    Formatted::plain(format!("{:.2}x", multiple))
}

/// `120 (one hundred twenty)`
pub fn count(n: u64, unit: &str) -> Formatted {
    let numeric = n.to_string();
    Formatted {
        value: format!("{} ({}) {}", numeric, spell_number(n), unit),
        alternates: vec![format!("{} {}", numeric, unit), spell_number(n)],
    }
}

/// `January 15, 2026`
pub fn long_date(date: NaiveDate) -> Formatted {
    Formatted::plain(date.format("%B %-d, %Y").to_string())
}
