use harvest_core::HarvestState;
use pretty_assertions::assert_eq;

fn urls(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn absorb_keeps_first_seen_order() {
    let mut state = HarvestState::new();
    assert_eq!(state.absorb(urls(&["c", "a", "c"])), 2);
    assert_eq!(state.absorb(urls(&["b", "a"])), 1);
    assert_eq!(state.urls(), urls(&["c", "a", "b"]).as_slice());
}

#[test]
fn truncation_is_first_n_discovered() {
    let mut state = HarvestState::new();
    state.absorb(urls(&["z", "y", "x", "w"]));
    assert_eq!(state.into_urls(2), urls(&["z", "y"]));
}

#[test]
fn stagnation_counter_resets_on_growth() {
    let mut state = HarvestState::new();

    state.begin_round();
    state.absorb(urls(&["a"]));
    assert_eq!(state.finish_round(), 0);

    state.begin_round();
    state.absorb(urls(&["a"]));
    assert_eq!(state.finish_round(), 1);

    state.begin_round();
    assert_eq!(state.finish_round(), 2);

    state.begin_round();
    state.absorb(urls(&["b"]));
    assert_eq!(state.finish_round(), 0);
    assert_eq!(state.rounds(), 4);
}

#[test]
fn empty_first_round_counts_as_stagnant() {
    let mut state = HarvestState::new();
    assert_eq!(state.begin_round(), 1);
    assert_eq!(state.finish_round(), 1);
    assert!(state.is_empty());
}
