use bundle_patcher::pipeline::replace_literal;
use bundle_patcher::{JavaScript, Patch, PatchDescriptor, PatchError, PatchSession};
use proptest::prelude::*;

proptest! {
    #[test]
    fn literal_replace_removes_every_occurrence(
        text in "[abc]{0,40}",
        from in "[ab]{1,3}",
        to in "[cd]{1,3}",
    ) {
        let (out, count) = replace_literal(&text, &from, &to);
        prop_assert_eq!(count, text.matches(from.as_str()).count());
        prop_assert!(!out.contains(from.as_str()));
        prop_assert_eq!(out, text.replace(from.as_str(), &to));
    }

    #[test]
    fn regex_count_is_enforced_exactly(words in prop::collection::vec(prop::sample::select(vec!["cost", "hp", "gold"]), 0..12)) {
        let text = words.join(" ");
        let n = words.iter().filter(|w| **w == "cost").count();

        let mut session = PatchSession::new(text.clone());
        let exact = Patch::new("exact", PatchDescriptor::regex(r"\bcost\b", "price", Some(n)));
        prop_assert!(session.apply(&JavaScript, 0, &exact).is_ok());
        prop_assert!(!session.source().contains("cost"));

        for wrong in [n + 1, n.wrapping_sub(1)] {
            let mut session = PatchSession::new(text.clone());
            let patch = Patch::new("wrong", PatchDescriptor::regex(r"\bcost\b", "price", Some(wrong)));
            let err = session.apply(&JavaScript, 0, &patch).unwrap_err();
            let is_mismatch = matches!(err.patch_error(), PatchError::MatchCountMismatch { .. });
            prop_assert!(is_mismatch);
            prop_assert_eq!(session.source(), text.as_str());
        }
    }
}
