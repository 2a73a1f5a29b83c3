/// Picks the candidate closest to `target` by edit distance, if any is close
/// enough to be a plausible typo. Used for misspelt native symbol names in
/// alias tables and close-function settings.
pub fn find_best_match<I, S>(target: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let threshold = if target.chars().count() < 4 { 1 } else { 3 };
    let mut best: Option<(usize, String)> = None;

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let distance = edit_distance(&target.to_lowercase(), &candidate.to_lowercase());
        if distance > threshold {
            continue;
        }
        if best.as_ref().is_none_or(|(current, _)| distance < *current) {
            best = Some((distance, candidate.to_string()));
        }
    }

    best.map(|(_, name)| name)
}

fn edit_distance(left: &str, right: &str) -> usize {
    let right_chars: Vec<char> = right.chars().collect();
    let mut previous: Vec<usize> = (0..=right_chars.len()).collect();
    let mut current = vec![0; right_chars.len() + 1];

    for (i, left_char) in left.chars().enumerate() {
        current[0] = i + 1;
        for (j, right_char) in right_chars.iter().enumerate() {
            let cost = usize::from(left_char != *right_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[right_chars.len()]
}
