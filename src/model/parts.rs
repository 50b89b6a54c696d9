//! Contiguous part grouping.
//!
//! A new group starts exactly when a chapter's part label differs from the
//! label of the chapter immediately before it. A label that comes back after
//! a different one starts a fresh group; groups are never merged by name.

use super::Chapter;

/// A chapter together with its 1-based position in the book.
#[derive(Debug, Clone, Copy)]
pub struct NumberedChapter<'a> {
    pub number: usize,
    pub chapter: &'a Chapter,
}

/// A run of adjacent chapters sharing the same part label.
#[derive(Debug, Clone)]
pub struct PartGroup<'a> {
    /// `None` for chapters outside any part (prologue, epilogue).
    pub label: Option<&'a str>,
    pub chapters: Vec<NumberedChapter<'a>>,
}

/// Split chapters into contiguous part groups.
pub fn group_parts(chapters: &[Chapter]) -> Vec<PartGroup<'_>> {
    let mut groups: Vec<PartGroup<'_>> = Vec::new();

    for (i, chapter) in chapters.iter().enumerate() {
        let label = chapter.part.as_deref();
        let entry = NumberedChapter {
            number: i + 1,
            chapter,
        };
        match groups.last_mut() {
            Some(group) if group.label == label => group.chapters.push(entry),
            _ => groups.push(PartGroup {
                label,
                chapters: vec![entry],
            }),
        }
    }

    groups
}

/// True when `chapters[index]` opens a new labelled part.
///
/// Renderers that walk chapters one by one use this to decide where part
/// banners go; it agrees with [`group_parts`].
pub fn starts_part(chapters: &[Chapter], index: usize) -> bool {
    let Some(current) = chapters.get(index) else {
        return false;
    };
    let Some(label) = current.part.as_deref() else {
        return false;
    };
    match index.checked_sub(1).and_then(|prev| chapters.get(prev)) {
        Some(previous) => previous.part.as_deref() != Some(label),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn chapters(parts: &[Option<&str>]) -> Vec<Chapter> {
        parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                let chapter = Chapter::new(format!("c{i}"), format!("Chapter {i}"), "");
                match part {
                    Some(p) => chapter.with_part(*p),
                    None => chapter,
                }
            })
            .collect()
    }

    #[test]
    fn test_reappearing_label_starts_new_group() {
        let chapters = chapters(&[Some("A"), Some("A"), Some("B"), Some("A")]);
        let groups = group_parts(&chapters);

        let shape: Vec<(Option<&str>, usize)> =
            groups.iter().map(|g| (g.label, g.chapters.len())).collect();
        assert_eq!(shape, vec![(Some("A"), 2), (Some("B"), 1), (Some("A"), 1)]);
    }

    #[test]
    fn test_unlabelled_chapters_form_their_own_groups() {
        let chapters = chapters(&[None, Some("A"), Some("A"), None]);
        let groups = group_parts(&chapters);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].label, None);
        assert_eq!(groups[2].label, None);
        assert_eq!(groups[2].chapters[0].number, 4);
    }

    #[test]
    fn test_starts_part() {
        let chapters = chapters(&[None, Some("A"), Some("A"), Some("B"), Some("A")]);
        let starts: Vec<bool> = (0..chapters.len())
            .map(|i| starts_part(&chapters, i))
            .collect();
        assert_eq!(starts, vec![false, true, false, true, true]);
        assert!(!starts_part(&chapters, 99));
    }

    proptest! {
        #[test]
        fn prop_groups_are_contiguous_and_complete(
            parts in proptest::collection::vec(proptest::option::of(0u8..3), 0..24)
        ) {
            let labels: Vec<Option<String>> =
                parts.iter().map(|p| p.map(|n| format!("P{n}"))).collect();
            let refs: Vec<Option<&str>> = labels.iter().map(|l| l.as_deref()).collect();
            let chapters = chapters(&refs);
            let groups = group_parts(&chapters);

            // Every chapter appears exactly once, in order.
            let numbers: Vec<usize> = groups
                .iter()
                .flat_map(|g| g.chapters.iter().map(|c| c.number))
                .collect();
            prop_assert_eq!(numbers, (1..=chapters.len()).collect::<Vec<_>>());

            // Adjacent groups never share a label.
            for pair in groups.windows(2) {
                prop_assert_ne!(pair[0].label, pair[1].label);
            }

            // Group openings agree with starts_part for labelled groups.
            for group in &groups {
                let first = group.chapters[0].number - 1;
                prop_assert_eq!(starts_part(&chapters, first), group.label.is_some());
            }
        }
    }
}
