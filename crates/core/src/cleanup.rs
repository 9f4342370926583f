//! Boilerplate removal across a list of posts.
//!
//! Forum software often wraps every post in the same leading or trailing
//! words ("Quote", "Reply", "Report post"). Runs of words shared by all posts
//! at the start or end are removed.

/// Collapses every whitespace run to a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn common_prefix_len(posts: &[Vec<&str>]) -> usize {
    let Some((first, rest)) = posts.split_first() else {
        return 0;
    };
    first
        .iter()
        .enumerate()
        .take_while(|(i, word)| rest.iter().all(|post| post.get(*i) == Some(*word)))
        .count()
}

fn common_suffix_len(posts: &[Vec<&str>]) -> usize {
    let Some((first, rest)) = posts.split_first() else {
        return 0;
    };
    first
        .iter()
        .rev()
        .enumerate()
        .take_while(|(i, word)| {
            rest.iter()
                .all(|post| post.len() > *i && post.get(post.len() - 1 - *i) == Some(*word))
        })
        .count()
}

/// Removes the longest word run shared by the start of all posts and the
/// longest run shared by their end.
///
/// A leading run needs at least `min_prefix_words` words and a trailing run
/// at least `min_suffix_words`; a run that would empty any post is kept.
/// Fewer than two posts are returned unchanged, apart from whitespace
/// normalization.
///
/// ```rust
/// use harvest_core::cleanup::trim_boilerplate;
///
/// let posts = vec![
///     "Good day [Reply]".to_string(),
///     "Good Saturday [Reply]".to_string(),
///     "Good Wednesday [Reply]".to_string(),
/// ];
/// assert_eq!(trim_boilerplate(&posts, 2, 1), vec!["Good day", "Good Saturday", "Good Wednesday"]);
/// ```
pub fn trim_boilerplate(posts: &[String], min_prefix_words: usize, min_suffix_words: usize) -> Vec<String> {
    if posts.len() < 2 {
        return posts.iter().map(|p| collapse_whitespace(p)).collect();
    }

    let words: Vec<Vec<&str>> = posts.iter().map(|p| p.split_whitespace().collect()).collect();
    let shortest = words.iter().map(Vec::len).min().unwrap_or(0);

    let mut suffix = common_suffix_len(&words);
    if suffix < min_suffix_words.max(1) || suffix >= shortest {
        suffix = 0;
    }

    let mut prefix = common_prefix_len(&words);
    if prefix < min_prefix_words.max(1) || prefix + suffix >= shortest {
        prefix = 0;
    }

    if prefix > 0 || suffix > 0 {
        tracing::debug!(prefix, suffix, "Removing shared boilerplate words from posts");
    }

    words
        .iter()
        .map(|post| post[prefix..post.len() - suffix].join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(posts: &[&str]) -> Vec<String> {
        posts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_trailing_run_removed() {
        let posts = owned(&["Good day [Reply - to]", "Good Saturday [Reply - to]", "Good Wednesday [Reply - to]"]);
        assert_eq!(trim_boilerplate(&posts, 2, 1), owned(&["Good day", "Good Saturday", "Good Wednesday"]));
    }

    #[test]
    fn test_no_common_run_is_unchanged() {
        let posts = owned(&["Good day", "Good Saturday", "Good Wednesday"]);
        assert_eq!(trim_boilerplate(&posts, 2, 1), posts);
    }

    #[test]
    fn test_leading_run_needs_minimum_length() {
        let posts = owned(&["Quote Report first text", "Quote Report second text here"]);
        assert_eq!(trim_boilerplate(&posts, 2, 1), owned(&["first text", "second text here"]));
        assert_eq!(trim_boilerplate(&posts, 3, 1), posts);
    }

    #[test]
    fn test_runs_never_empty_a_post() {
        let posts = owned(&["same words", "same words"]);
        assert_eq!(trim_boilerplate(&posts, 1, 1), posts);

        let posts = owned(&["Reply", "Great post Reply"]);
        assert_eq!(trim_boilerplate(&posts, 2, 1), posts);
    }

    #[test]
    fn test_single_post_is_unchanged() {
        let posts = owned(&["only  one\n post"]);
        assert_eq!(trim_boilerplate(&posts, 2, 1), owned(&["only one post"]));
        assert!(trim_boilerplate(&[], 2, 1).is_empty());
    }
}
