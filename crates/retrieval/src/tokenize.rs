use regex::Regex;

const STOPWORDS: &[&str] = &["the", "and", "for", "our", "your", "what", "when", "how"];

pub fn tokenize(input: &str) -> Vec<String> {
    let cleaner = Regex::new(r"[^\p{Latin}\p{Nd}\s]+").expect("valid tokenizer regex");
    let normalized = cleaner.replace_all(input, " ").to_lowercase();

    normalized
        .split_whitespace()
        .map(str::trim)
        .filter(|token| token.chars().count() > 1)
        .filter(|token| !STOPWORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}
