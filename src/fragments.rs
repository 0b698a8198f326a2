//! Synthetic editor buffers for completion requests.

use std::time::Duration;

use rand::Rng;
use wb_channel::CodeFragment;

/// `(prefix, suffix)` pairs around a cursor in a small JavaScript file.
pub const CODE_TEMPLATES: [(&str, &str); 8] = [
    ("const name = '", "';\nconsole.log(name);"),
    ("function hello() {\n  return '", "';\n}"),
    ("let count = ", ";\ncount++;"),
    ("if (true) {\n  console.log('", "');\n}"),
    ("const arr = [1, 2, ", "];\narr.push(4);"),
    (
        "class MyClass {\n  constructor() {\n    this.value = '",
        "';\n  }\n}",
    ),
    (
        "async function getData() {\n  const response = '",
        "';\n  return response;\n}",
    ),
    ("const obj = {\n  key: '", "',\n  method() {}\n};"),
];

/// Words appended to the template prefix as the "typed" text.
pub const FILLER_WORDS: [&str; 16] = [
    "hello", "world", "test", "code", "data", "value", "result", "item", "name", "id", "user",
    "admin", "config", "setting", "option", "param",
];

pub fn random_fragment<R: Rng + ?Sized>(rng: &mut R) -> CodeFragment {
    let (prefix, suffix) = CODE_TEMPLATES[rng.random_range(0..CODE_TEMPLATES.len())];
    let word = FILLER_WORDS[rng.random_range(0..FILLER_WORDS.len())];
    CodeFragment {
        prefix: format!("{prefix}{word}"),
        suffix: suffix.to_owned(),
    }
}

/// Displayed-lines metric reported with each activity notification, in `[0, 2)`.
pub fn activity_lines<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random_range(0.0..2.0)
}

/// Uniform delay in `[min, max]` at millisecond resolution.
pub fn request_delay<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    let min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rng.random_range(min_ms..=max_ms))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn fragments_come_from_the_template_set() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..64 {
            let fragment = random_fragment(&mut rng);
            let template = CODE_TEMPLATES
                .iter()
                .find(|(prefix, suffix)| {
                    fragment.prefix.starts_with(prefix) && fragment.suffix == *suffix
                })
                .expect("fragment must match a template");
            let word = &fragment.prefix[template.0.len()..];
            assert!(FILLER_WORDS.contains(&word), "unexpected filler {word:?}");
        }
    }

    #[test]
    fn request_delay_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let min = Duration::from_millis(500);
        let max = Duration::from_millis(2500);
        for _ in 0..256 {
            let delay = request_delay(&mut rng, min, max);
            assert!(delay >= min && delay <= max, "{delay:?} out of range");
        }
    }

    #[test]
    fn request_delay_collapses_empty_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let delay = request_delay(&mut rng, Duration::from_millis(40), Duration::from_millis(40));
        assert_eq!(delay, Duration::from_millis(40));
    }

    #[test]
    fn activity_lines_are_below_two() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..256 {
            let lines = activity_lines(&mut rng);
            assert!((0.0..2.0).contains(&lines));
        }
    }
}
