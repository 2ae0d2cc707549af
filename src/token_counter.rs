//! C1 — Token Counter.
//!
//! A deterministic, text-only token estimate (spec §4.10). No model
//! tokenizer dependency: the contract is consistency across calls and
//! monotonicity in length, not fidelity to any particular vendor's
//! tokenizer license.

/// Fraction of a text's characters that must be punctuation/structural
/// (non-alphanumeric, non-whitespace) before the code adjustment kicks in.
const STRUCTURAL_DENSITY_THRESHOLD: f64 = 0.15;

/// Estimate the token cost of `text`.
///
/// Baseline is `ceil(len / 4)`; texts whose punctuation/structural-character
/// share exceeds [`STRUCTURAL_DENSITY_THRESHOLD`] (typical of source code)
/// get a further `+0.1 * len` adjustment, per spec §4.10.
pub fn estimate(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let len = text.chars().count();
    let structural = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count();
    let density = structural as f64 / len as f64;

    let mut tokens = (len as f64 / 4.0).ceil();
    if density > STRUCTURAL_DENSITY_THRESHOLD {
        tokens += 0.1 * len as f64;
    }
    tokens.ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(estimate(""), 0);
    }

    #[test]
    fn monotonic_in_length() {
        let short = estimate("hello world");
        let long = estimate("hello world, this is a much longer piece of prose text");
        assert!(long > short);
    }

    #[test]
    fn deterministic_across_calls() {
        let text = "fn main() { let x = foo(bar, baz); }";
        assert_eq!(estimate(text), estimate(text));
    }

    #[test]
    fn code_like_text_costs_more_than_prose_of_equal_length() {
        let prose = "the quick brown fox jumps over the lazy dogs now!";
        let code = "fn f(a:i32,b:i32)->i32{a+b*2-1/(a%b)<<2>>1&3|4^5}";
        assert_eq!(prose.chars().count(), code.chars().count());
        assert!(estimate(code) > estimate(prose));
    }
}
