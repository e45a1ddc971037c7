use liquid_fingerprint::parse;
use strsim::normalized_levenshtein;

/// Resolve `target` to the most similar fingerprint already present in
/// `known`, so that a backend with no history for this exact call can still
/// be judged against its closest prior measurement.
///
/// Similarity is scored first by the product of a fingerprint's shape
/// dimensions and numeric arguments (closer product, closer cost), since
/// that is the dominant driver of an operation's run time. Fingerprints with
/// no numeric content at all (neither shapes nor numbers) fall back to plain
/// textual closeness, since a score of `1.0` for every such fingerprint
/// would make the score-based comparison meaningless.
///
/// Returns `None` only when `known` is empty.
pub fn resolve<'a, I>(target: &str, known: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let known: Vec<&str> = known.into_iter().collect();
    if known.is_empty() {
        return None;
    }

    let (target_shapes, target_numbers) = parse(target);
    if target_shapes.is_empty() && target_numbers.is_empty() {
        return Some(closest_by_text(target, &known));
    }

    let target_score = score(target);
    let mut best: Option<(&str, f64)> = None;
    for candidate in &known {
        let delta = (score(candidate) - target_score).abs();
        match best {
            Some((_, best_delta)) if delta >= best_delta => {}
            _ => best = Some((candidate, delta)),
        }
    }
    best.map(|(fp, _)| fp)
}

fn closest_by_text<'a>(target: &str, known: &[&'a str]) -> &'a str {
    known
        .iter()
        .copied()
        .max_by(|a, b| {
            normalized_levenshtein(target, a)
                .partial_cmp(&normalized_levenshtein(target, b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("known is non-empty")
}

/// The product of a fingerprint's shape dimensions, times the product of its
/// numeric arguments. Either factor defaults to `1.0` when absent, matching
/// the convention that an argument category that wasn't present shouldn't
/// zero out the whole score.
fn score(fingerprint: &str) -> f64 {
    let (shapes, numbers) = parse(fingerprint);
    let shape_product = if shapes.is_empty() {
        1.0
    } else {
        shapes.iter().product()
    };
    let number_product = if numbers.is_empty() {
        1.0
    } else {
        numbers.iter().product()
    };
    shape_product * number_product
}
