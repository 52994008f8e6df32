//! Property-Based Tests for the word repository
//!
//! Tests the following invariants:
//! - Presence: every added word is found by `exists` and `get_by_id`
//! - First letter: stored as the uppercased first character of `english`
//! - Letter listing: only that letter, ascending by `english`
//! - Familiarity partition: familiar and unfamiliar lists split the letter list
//! - Stats consistency: counts match the list lengths
//! - Missing ids: updates affect zero rows and change nothing
//! - Clear: empties every listing and resets stats

use std::collections::BTreeSet;

use proptest::prelude::*;

use vocab_cards::storage::{LetterStats, NewWord, Storage, WordRepository};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_english() -> impl Strategy<Value = String> {
    "[a-dA-D][a-z]{0,8}"
}

fn arb_new_word() -> impl Strategy<Value = NewWord> {
    (
        arb_english(),
        "[a-z']{0,6}",   // phonetic
        "[一-龥]{0,4}",  // chinese
        any::<bool>(),   // familiar
        any::<bool>(),   // favorite
    )
        .prop_map(|(english, phonetic, chinese, familiar, favorite)| {
            NewWord::new(english, phonetic, chinese, "")
                .familiar(familiar)
                .favorite(favorite)
        })
}

fn arb_letter() -> impl Strategy<Value = String> {
    prop_oneof![Just("a"), Just("B"), Just("c"), Just("D"), Just("z")].prop_map(String::from)
}

fn seeded(words: &[NewWord]) -> (Storage, Vec<i64>) {
    let storage = Storage::in_memory().unwrap();
    let repo = storage.words();
    let ids = words.iter().map(|w| repo.add(w).unwrap()).collect();
    (storage, ids)
}

fn ids_of(repo: &WordRepository, letter: &str, familiar: Option<bool>) -> BTreeSet<i64> {
    let words = match familiar {
        None => repo.list_by_letter(letter).unwrap(),
        Some(value) => repo.list_by_letter_and_familiarity(letter, value).unwrap(),
    };
    words.into_iter().map(|w| w.id).collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_added_word_is_present(words in prop::collection::vec(arb_new_word(), 1..20)) {
        let (storage, ids) = seeded(&words);
        let repo = storage.words();

        for (word, id) in words.iter().zip(&ids) {
            prop_assert!(repo.exists(&word.english).unwrap());

            let record = repo.get_by_id(*id).unwrap().unwrap();
            prop_assert_eq!(&record.english, &word.english);
            prop_assert_eq!(record.is_familiar, word.is_familiar);
            prop_assert_eq!(record.is_favorite, word.is_favorite);

            let expected: String = word.english.chars().next().unwrap().to_uppercase().collect();
            prop_assert_eq!(&record.first_letter, &expected);
        }

        let unique: BTreeSet<i64> = ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn prop_letter_listing_is_filtered_and_sorted(
        words in prop::collection::vec(arb_new_word(), 0..30),
        letter in arb_letter(),
    ) {
        let (storage, _) = seeded(&words);
        let listed = storage.words().list_by_letter(&letter).unwrap();
        let upper = letter.to_uppercase();

        for record in &listed {
            prop_assert_eq!(&record.first_letter, &upper);
        }
        for pair in listed.windows(2) {
            prop_assert!(pair[0].english <= pair[1].english);
        }

        let expected = words
            .iter()
            .filter(|w| w.english.to_uppercase().starts_with(&upper))
            .count();
        prop_assert_eq!(listed.len(), expected);
    }

    #[test]
    fn prop_familiarity_partitions_letter(
        words in prop::collection::vec(arb_new_word(), 0..30),
        letter in arb_letter(),
    ) {
        let (storage, _) = seeded(&words);
        let repo = storage.words();

        let all = ids_of(&repo, &letter, None);
        let familiar = ids_of(&repo, &letter, Some(true));
        let unfamiliar = ids_of(&repo, &letter, Some(false));

        prop_assert!(familiar.is_disjoint(&unfamiliar));
        let union: BTreeSet<i64> = familiar.union(&unfamiliar).copied().collect();
        prop_assert_eq!(union, all);
    }

    #[test]
    fn prop_stats_match_listings(
        words in prop::collection::vec(arb_new_word(), 0..30),
        letter in arb_letter(),
    ) {
        let (storage, _) = seeded(&words);
        let repo = storage.words();

        let stats = repo.stats_for_letter(&letter).unwrap();
        prop_assert_eq!(stats.total_count as usize, ids_of(&repo, &letter, None).len());
        prop_assert_eq!(stats.familiar_count as usize, ids_of(&repo, &letter, Some(true)).len());
        prop_assert!(stats.familiar_count <= stats.total_count);
    }

    #[test]
    fn prop_update_missing_id_changes_nothing(
        words in prop::collection::vec(arb_new_word(), 0..10),
        offset in 1i64..1000,
        value in any::<bool>(),
    ) {
        let (storage, ids) = seeded(&words);
        let repo = storage.words();
        let missing = ids.iter().copied().max().unwrap_or(0) + offset;
        let before = repo.list_all().unwrap();

        prop_assert_eq!(repo.set_familiar(missing, value).unwrap(), 0);
        prop_assert_eq!(repo.set_favorite(missing, value).unwrap(), 0);
        prop_assert_eq!(repo.list_all().unwrap(), before);
    }

    #[test]
    fn prop_set_familiar_moves_between_partitions(
        words in prop::collection::vec(arb_new_word(), 1..20),
        pick in any::<prop::sample::Index>(),
        value in any::<bool>(),
    ) {
        let (storage, ids) = seeded(&words);
        let repo = storage.words();
        let id = ids[pick.index(ids.len())];
        let letter = repo.get_by_id(id).unwrap().unwrap().first_letter;

        prop_assert_eq!(repo.set_familiar(id, value).unwrap(), 1);
        prop_assert!(ids_of(&repo, &letter, Some(value)).contains(&id));
        prop_assert!(!ids_of(&repo, &letter, Some(!value)).contains(&id));
    }

    #[test]
    fn prop_clear_empties_everything(words in prop::collection::vec(arb_new_word(), 0..30)) {
        let (storage, _) = seeded(&words);
        let repo = storage.words();

        prop_assert_eq!(repo.clear_all().unwrap(), words.len());
        prop_assert!(repo.list_all().unwrap().is_empty());
        for letter in ["a", "b", "c", "d"] {
            prop_assert!(repo.list_by_letter(letter).unwrap().is_empty());
            prop_assert_eq!(repo.stats_for_letter(letter).unwrap(), LetterStats::default());
        }
        for word in &words {
            prop_assert!(!repo.exists(&word.english).unwrap());
        }
    }
}
